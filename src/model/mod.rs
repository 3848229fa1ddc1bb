// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Grammar sessions pair a compiled grammar with sample input and the parse
//! outcome interpreted from it; everything downstream (layout, selection,
//! labels) derives from these types.

pub mod diagnostics;
pub(crate) mod fixtures;
pub mod grammar;
pub mod ids;
pub mod line_index;
pub mod outcome;
pub mod snapshot;
pub mod span;
pub mod token;
pub mod tree;

pub use diagnostics::{AmbiguityEvent, GrammarIssue, RecognitionError, Severity};
pub use grammar::{
    Alternative, Atom, CharClass, CharRange, Element, ElementKind, GrammarModel, GrammarPair,
    LexerGrammar, PatternElement, Rule, Suffix, TokenDef, TokenPattern,
};
pub use ids::{GrammarKey, Id, IdError};
pub use line_index::{LineCol, LineIndex};
pub use outcome::ParseOutcome;
pub use snapshot::{InputSource, SessionSnapshot};
pub use span::Span;
pub use token::{Channel, Token, TokenType};
pub use tree::{ErrorNode, NodePath, RuleNode, TerminalNode, TreeNode};
