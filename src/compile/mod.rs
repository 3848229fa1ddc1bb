// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Grammar compiler: ANTLR-style source text to a validated grammar pair.
//!
//! Compilation is best-effort and collects every issue it can find in one
//! run. A compile fails when any issue is error severity or above; warnings
//! and notes accompany a successful compile.

mod build;
mod parse;
mod scan;
mod targets;


pub use targets::{target, targets, Target};

use crate::model::{GrammarIssue, GrammarPair};

/// Successful compile: the pair plus any non-blocking issues.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pair: GrammarPair,
    notes: Vec<GrammarIssue>,
}

impl CompiledGrammar {
    pub fn pair(&self) -> &GrammarPair {
        &self.pair
    }

    pub fn into_pair(self) -> GrammarPair {
        self.pair
    }

    /// Warnings and infos collected alongside a successful compile.
    pub fn notes(&self) -> &[GrammarIssue] {
        &self.notes
    }

    pub fn into_parts(self) -> (GrammarPair, Vec<GrammarIssue>) {
        (self.pair, self.notes)
    }
}

/// Compiles grammar text. `file_name` is used for the name-matches-file
/// check and appears in messages only.
pub fn compile_grammar(
    source: &str,
    file_name: &str,
) -> Result<CompiledGrammar, Vec<GrammarIssue>> {
    let mut issues = Vec::new();
    let tokens = scan::scan(source, &mut issues);
    let parsed = parse::parse(&tokens, &mut issues);
    let pair = build::build(parsed, file_name, &mut issues);

    if issues.iter().any(GrammarIssue::is_blocking) {
        return Err(issues);
    }
    match pair {
        Some(pair) => Ok(CompiledGrammar {
            pair,
            notes: issues,
        }),
        None => Err(issues),
    }
}
