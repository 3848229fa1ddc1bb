// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use smol_str::SmolStr;

use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// A problem found while compiling grammar text.
///
/// Compilation is best-effort: a failed compile reports every issue it could
/// collect, and a successful one may still carry warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarIssue {
    message: String,
    severity: Severity,
    span: Option<Span>,
}

impl GrammarIssue {
    pub fn new(message: impl Into<String>, severity: Severity, span: Option<Span>) -> Self {
        Self {
            message: message.into(),
            severity,
            span,
        }
    }

    pub fn error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(message, Severity::Error, span)
    }

    pub fn warning(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(message, Severity::Warning, span)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn is_blocking(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl fmt::Display for GrammarIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}: {} at {}", self.severity, self.message, span),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// A syntax problem found while interpreting input against the grammar.
///
/// Recognition errors never abort the pipeline; they accumulate in the
/// outcome alongside the best-effort tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionError {
    span: Span,
    message: String,
    severity: Severity,
}

impl RecognitionError {
    pub fn new(span: Span, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            span,
            message: message.into(),
            severity,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.span)
    }
}

/// Records a tie between alternatives that matched the same longest extent.
/// The lowest alternative number wins the parse; the event keeps the tie
/// visible in the errors pane at info severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguityEvent {
    rule_name: SmolStr,
    span: Span,
    alternatives: Vec<usize>,
}

impl AmbiguityEvent {
    pub fn new(rule_name: impl Into<SmolStr>, span: Span, alternatives: Vec<usize>) -> Self {
        Self {
            rule_name: rule_name.into(),
            span,
            alternatives,
        }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// 1-based numbers of the tied alternatives, ascending.
    pub fn alternatives(&self) -> &[usize] {
        &self.alternatives
    }
}

impl fmt::Display for AmbiguityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ambiguity in rule '{}' at {}: alternatives ",
            self.rule_name, self.span
        )?;
        let mut buf = itoa::Buffer::new();
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(buf.format(*alt))?;
        }
        Ok(())
    }
}
