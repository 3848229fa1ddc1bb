// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use smol_str::SmolStr;

use super::diagnostics::GrammarIssue;
use super::grammar::GrammarPair;
use super::ids::GrammarKey;
use super::outcome::ParseOutcome;

/// Where the sample input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Manual(String),
    File { path: String, text: String },
}

impl InputSource {
    pub fn text(&self) -> &str {
        match self {
            Self::Manual(text) => text,
            Self::File { text, .. } => text,
        }
    }

    pub fn file_path(&self) -> Option<&str> {
        match self {
            Self::Manual(_) => None,
            Self::File { path, .. } => Some(path),
        }
    }
}

impl Default for InputSource {
    fn default() -> Self {
        Self::Manual(String::new())
    }
}

/// Immutable view of one grammar session.
///
/// Every mutation constructs a new snapshot with a bumped generation;
/// consumers hold an `Arc` and can never observe a half-applied update. An
/// outcome is only committed when it was produced for the generation that is
/// still current, so a stale result is dropped rather than displayed.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    key: GrammarKey,
    grammar_source: String,
    pair: Option<Arc<GrammarPair>>,
    issues: Vec<GrammarIssue>,
    start_rule: Option<SmolStr>,
    input: InputSource,
    outcome: Option<Arc<ParseOutcome>>,
    generation: u64,
}

impl SessionSnapshot {
    pub fn new(key: GrammarKey) -> Self {
        Self {
            key,
            grammar_source: String::new(),
            pair: None,
            issues: Vec::new(),
            start_rule: None,
            input: InputSource::default(),
            outcome: None,
            generation: 0,
        }
    }

    pub fn key(&self) -> &GrammarKey {
        &self.key
    }

    pub fn grammar_source(&self) -> &str {
        &self.grammar_source
    }

    pub fn pair(&self) -> Option<&Arc<GrammarPair>> {
        self.pair.as_ref()
    }

    pub fn issues(&self) -> &[GrammarIssue] {
        &self.issues
    }

    pub fn start_rule(&self) -> Option<&str> {
        self.start_rule.as_deref()
    }

    pub fn input(&self) -> &InputSource {
        &self.input
    }

    pub fn outcome(&self) -> Option<&Arc<ParseOutcome>> {
        self.outcome.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Next snapshot after a grammar (re)compile. Clears the outcome; a
    /// failed compile leaves `pair` as `None` with the collected issues.
    pub fn with_grammar(
        &self,
        source: impl Into<String>,
        pair: Option<Arc<GrammarPair>>,
        issues: Vec<GrammarIssue>,
    ) -> Self {
        let mut next = self.clone();
        next.grammar_source = source.into();
        next.pair = pair;
        next.issues = issues;
        next.outcome = None;
        next.generation += 1;
        next
    }

    /// Next snapshot with a changed start rule. Drops the now-stale outcome.
    pub fn with_start_rule(&self, start_rule: Option<SmolStr>) -> Self {
        let mut next = self.clone();
        next.start_rule = start_rule;
        next.outcome = None;
        next.generation += 1;
        next
    }

    /// Next snapshot with changed sample input. Drops the now-stale outcome.
    pub fn with_input(&self, input: InputSource) -> Self {
        let mut next = self.clone();
        next.input = input;
        next.outcome = None;
        next.generation += 1;
        next
    }

    /// Same-generation snapshot carrying the outcome produced for it.
    pub fn with_outcome(&self, outcome: Arc<ParseOutcome>) -> Self {
        let mut next = self.clone();
        next.outcome = Some(outcome);
        next
    }
}
