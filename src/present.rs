// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node labels for layout and panes.
//!
//! Two registers: compact labels fit tree cells, verbose labels suit status
//! lines and node inspection. Both are pure functions of the node and the
//! grammar pair.

use crate::model::{GrammarPair, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    Compact,
    Verbose,
}

/// Human-readable label for a tree node.
///
/// Rule nodes show their alternative label when the grammar names one;
/// verbose mode prefixes the rule name and, for a rule with several
/// unlabeled alternatives, appends `*N` with the 1-based alternative
/// number. Terminals show their symbolic token name when the lexer has
/// one, the raw text otherwise, and `<EOF>` for the sentinel.
pub fn label_for(node: &TreeNode, pair: &GrammarPair, mode: LabelMode) -> String {
    match node {
        TreeNode::Rule(rule) => {
            let name = rule.rule_name();
            match (rule.alt_label(), mode) {
                (Some(label), LabelMode::Compact) => format!("#{label}"),
                (Some(label), LabelMode::Verbose) => format!("{name}#{label}"),
                (None, LabelMode::Compact) => name.to_owned(),
                (None, LabelMode::Verbose) => {
                    let alternatives = pair
                        .grammar()
                        .rule(rule.rule_index())
                        .map_or(1, |r| r.alternatives().len());
                    if alternatives > 1 {
                        format!("{name}*{}", rule.alt_number())
                    } else {
                        name.to_owned()
                    }
                }
            }
        }
        TreeNode::Terminal(terminal) => {
            let token = terminal.token();
            if token.is_eof() {
                return "<EOF>".to_owned();
            }
            match pair.lexer().symbolic_name(token.ty()) {
                Some(name) => match mode {
                    LabelMode::Compact => format!("{name}({})", token.text()),
                    LabelMode::Verbose => format!("{name}: {}", token.text()),
                },
                None => token.text().to_owned(),
            }
        }
        TreeNode::Error(error) => match mode {
            LabelMode::Compact => "<error>".to_owned(),
            LabelMode::Verbose => {
                let detail = error
                    .token()
                    .map(|t| t.text())
                    .unwrap_or_else(|| error.message());
                format!("<error: {detail}>")
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{label_for, LabelMode};
    use crate::compile::compile_grammar;
    use crate::interp::{interpret, CancelToken, InterpretOptions};
    use crate::model::fixtures::{eof_terminal, expr_pair, terminal, tiny_pair};
    use crate::model::{ErrorNode, Span, Token, TreeNode};

    #[test]
    fn labeled_rule_nodes_use_the_alternative_label() {
        let pair = expr_pair();
        let outcome = interpret(
            &pair,
            "expr",
            "1+2",
            &CancelToken::new(),
            &InterpretOptions::default(),
        )
        .unwrap();
        let root = outcome.root();

        assert_eq!(label_for(root, &pair, LabelMode::Compact), "#Add");
        assert_eq!(label_for(root, &pair, LabelMode::Verbose), "expr#Add");
    }

    #[test]
    fn unlabeled_rules_fall_back_to_the_rule_name() {
        let pair = tiny_pair();
        let outcome = interpret(
            &pair,
            "r",
            "ab",
            &CancelToken::new(),
            &InterpretOptions::default(),
        )
        .unwrap();
        let root = outcome.root();

        assert_eq!(label_for(root, &pair, LabelMode::Compact), "r");
        assert_eq!(label_for(root, &pair, LabelMode::Verbose), "r");
    }

    #[test]
    fn multi_alternative_rules_number_the_unlabeled_match() {
        let pair = compile_grammar("grammar M; r: 'a' | 'b';", "M.g4")
            .unwrap()
            .into_pair();
        let outcome = interpret(
            &pair,
            "r",
            "b",
            &CancelToken::new(),
            &InterpretOptions::default(),
        )
        .unwrap();
        let root = outcome.root();

        assert_eq!(label_for(root, &pair, LabelMode::Compact), "r");
        assert_eq!(label_for(root, &pair, LabelMode::Verbose), "r*2");
    }

    #[test]
    fn terminals_prefer_the_symbolic_token_name() {
        let pair = expr_pair();
        let int = terminal(2, "42", 0);
        assert_eq!(label_for(&int, &pair, LabelMode::Compact), "INT(42)");
        assert_eq!(label_for(&int, &pair, LabelMode::Verbose), "INT: 42");

        let star = terminal(0, "*", 0);
        assert_eq!(label_for(&star, &pair, LabelMode::Compact), "*");
    }

    #[test]
    fn the_eof_sentinel_has_a_fixed_label() {
        let pair = tiny_pair();
        assert_eq!(
            label_for(&eof_terminal(2), &pair, LabelMode::Compact),
            "<EOF>"
        );
    }

    #[test]
    fn error_nodes_surface_the_covered_text_verbosely() {
        let pair = tiny_pair();
        let with_token = TreeNode::Error(ErrorNode::new(
            Some(Token::new(
                crate::model::TokenType::new(9),
                crate::model::Channel::Default,
                "x",
                Span::new(1, 2),
            )),
            "extraneous input 'x'",
            Span::new(1, 2),
        ));
        assert_eq!(label_for(&with_token, &pair, LabelMode::Compact), "<error>");
        assert_eq!(
            label_for(&with_token, &pair, LabelMode::Verbose),
            "<error: x>"
        );

        let inserted = TreeNode::Error(ErrorNode::new(None, "missing 'b'", Span::empty(2)));
        assert_eq!(
            label_for(&inserted, &pair, LabelMode::Verbose),
            "<error: missing 'b'>"
        );
    }
}
