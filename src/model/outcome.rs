// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use super::diagnostics::{AmbiguityEvent, RecognitionError};
use super::token::Token;
use super::tree::TreeNode;

/// Immutable result of one interpretation run.
///
/// Outcomes are produced only by the interpretation engine and superseded
/// wholesale; nothing ever mutates a published outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    root: TreeNode,
    tokens: Vec<Token>,
    errors: Vec<RecognitionError>,
    ambiguities: Vec<AmbiguityEvent>,
    duration: Duration,
}

impl ParseOutcome {
    pub fn new(
        root: TreeNode,
        tokens: Vec<Token>,
        errors: Vec<RecognitionError>,
        ambiguities: Vec<AmbiguityEvent>,
        duration: Duration,
    ) -> Self {
        Self {
            root,
            tokens,
            errors,
            ambiguities,
            duration,
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Full token sequence in input order, hidden and skipped tokens
    /// included, terminated by the EOF sentinel.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Recognition errors ordered by input position.
    pub fn errors(&self) -> &[RecognitionError] {
        &self.errors
    }

    pub fn ambiguities(&self) -> &[AmbiguityEvent] {
        &self.ambiguities
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
