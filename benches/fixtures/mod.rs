// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use galatea::layout::LayoutTree;
use galatea::model::ParseOutcome;

pub fn checksum_outcome(outcome: &ParseOutcome) -> u64 {
    let mut acc = 0u64;
    for token in outcome.tokens() {
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(u64::from(token.ty().index()));
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(token.span().len() as u64);
    }
    acc = acc
        .wrapping_mul(131)
        .wrapping_add(outcome.root().node_count() as u64);
    acc = acc
        .wrapping_mul(131)
        .wrapping_add(outcome.errors().len() as u64);
    acc
}

pub fn checksum_layout(layout: &LayoutTree) -> u64 {
    let mut acc = 0u64;
    for node in layout.nodes() {
        let rect = node.rect();
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(u64::from(rect.x().to_bits()));
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(u64::from(rect.y().to_bits()));
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(u64::from(rect.width().to_bits()));
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(node.path().depth() as u64);
    }
    acc
}

pub mod expr {
    use galatea::compile::compile_grammar;
    use galatea::model::GrammarPair;

    pub const GRAMMAR_SRC: &str = "\
grammar Expr;

expr
    : expr '*' expr   #Mul
    | expr '+' expr   #Add
    | INT             #Lit
    ;

INT : [0-9]+ ;
WS  : [ \\t\\r\\n]+ -> skip ;
";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Params {
        pub terms: usize,
        pub digits: usize,
    }

    impl Params {
        pub const fn new(terms: usize, digits: usize) -> Self {
            Self { terms, digits }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        Small,
        Medium,
        LargeLongNumbers,
    }

    impl Case {
        pub const fn id(self) -> &'static str {
            match self {
                Self::Small => "small",
                Self::Medium => "medium",
                Self::LargeLongNumbers => "large_long_numbers",
            }
        }

        pub const fn params(self) -> Params {
            match self {
                Self::Small => Params::new(16, 1),
                Self::Medium => Params::new(200, 3),
                Self::LargeLongNumbers => Params::new(1200, 9),
            }
        }
    }

    pub fn pair() -> GrammarPair {
        compile_grammar(GRAMMAR_SRC, "Expr.g4")
            .expect("compile bench grammar")
            .into_pair()
    }

    /// Deterministic arithmetic expression: `terms` integer literals joined
    /// by alternating `*` and `+`, with whitespace around every fourth
    /// operator so the skip channel sees work too.
    pub fn input(params: Params) -> String {
        assert!(params.terms >= 1, "terms must be >= 1");
        assert!(params.digits >= 1, "digits must be >= 1");

        let mut out = String::with_capacity(params.terms * (params.digits + 3));
        for idx in 0..params.terms {
            if idx > 0 {
                let spaced = idx % 4 == 0;
                if spaced {
                    out.push(' ');
                }
                out.push(if idx % 2 == 0 { '+' } else { '*' });
                if spaced {
                    out.push(' ');
                }
            }
            for offset in 0..params.digits {
                let digit = ((idx + offset) % 10) as u8;
                out.push(char::from(b'0' + digit));
            }
        }
        out
    }

    pub fn fixture(case: Case) -> String {
        input(case.params())
    }
}
