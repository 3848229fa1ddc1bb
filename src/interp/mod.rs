// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Interpretation engine: runs sample input through a compiled grammar.
//!
//! Three phases per run: lex (longest match over the lexer grammar), parse
//! (memoizing recursive descent with seed-grown left recursion and error
//! recovery), materialize (span-checked tree construction). Recognition
//! errors are collected, never thrown; a best-effort tree is always
//! produced. Only a missing start rule or cancellation aborts a run.

mod lexer;
mod parser;


use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use smol_str::SmolStr;

use crate::model::{
    ErrorNode, GrammarPair, ParseOutcome, RecognitionError, Severity, Span, TreeNode,
};

/// Shared cancellation flag, checked between phases and periodically inside
/// the lex and parse loops.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Budgets guarding degenerate grammars. Exhausting either produces a
/// synthetic single-error-node outcome instead of hanging or crashing.
#[derive(Debug, Clone, Copy)]
pub struct InterpretOptions {
    fuel: u64,
    max_depth: usize,
}

impl InterpretOptions {
    pub fn new(fuel: u64, max_depth: usize) -> Self {
        Self { fuel, max_depth }
    }

    pub fn fuel(&self) -> u64 {
        self.fuel
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            fuel: 200_000,
            max_depth: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretError {
    NoStartRule { rule: SmolStr, grammar: SmolStr },
    Cancelled,
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStartRule { rule, grammar } => {
                write!(f, "start rule '{rule}' does not exist in grammar '{grammar}'")
            }
            Self::Cancelled => f.write_str("interpretation was cancelled"),
        }
    }
}

impl std::error::Error for InterpretError {}

/// Internal abort reasons; budget exhaustion never escapes to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Abort {
    Cancelled,
    Budget,
}

/// Interprets `input` against the pair's start rule.
///
/// Holds no session state; the caller owns snapshots and commits. A caller
/// receiving `Cancelled` must not update any session state with partial
/// results.
pub fn interpret(
    pair: &GrammarPair,
    start_rule: &str,
    input: &str,
    cancel: &CancelToken,
    options: &InterpretOptions,
) -> Result<ParseOutcome, InterpretError> {
    let started = Instant::now();

    let Some(rule) = pair.grammar().rule_by_name(start_rule) else {
        return Err(InterpretError::NoStartRule {
            rule: SmolStr::from(start_rule),
            grammar: SmolStr::from(pair.grammar().name()),
        });
    };
    let rule_index = rule.index();

    if cancel.is_cancelled() {
        return Err(InterpretError::Cancelled);
    }

    let run = catch_unwind(AssertUnwindSafe(|| {
        run_phases(pair, rule_index, input, cancel, options)
    }));

    match run {
        Ok(Ok(parts)) => Ok(ParseOutcome::new(
            parts.root,
            parts.tokens,
            parts.errors,
            parts.ambiguities,
            started.elapsed(),
        )),
        Ok(Err(Abort::Cancelled)) => Err(InterpretError::Cancelled),
        Ok(Err(Abort::Budget)) => unreachable!("budget aborts are resolved in run_phases"),
        Err(_) => Ok(synthetic_outcome(
            input,
            "internal interpreter failure",
            started,
        )),
    }
}

struct RunParts {
    root: TreeNode,
    tokens: Vec<crate::model::Token>,
    errors: Vec<RecognitionError>,
    ambiguities: Vec<crate::model::AmbiguityEvent>,
}

fn run_phases(
    pair: &GrammarPair,
    rule_index: usize,
    input: &str,
    cancel: &CancelToken,
    options: &InterpretOptions,
) -> Result<RunParts, Abort> {
    let mut errors = Vec::new();

    let tokens = lexer::lex(pair.lexer(), input, cancel, &mut errors)?;
    if cancel.is_cancelled() {
        return Err(Abort::Cancelled);
    }

    match parser::parse(pair, &tokens, rule_index, cancel, options) {
        Ok(parsed) => {
            errors.extend(parsed.errors);
            errors.sort_by_key(|e| (e.span().start(), e.span().end()));
            Ok(RunParts {
                root: parsed.root,
                tokens,
                errors,
                ambiguities: parsed.ambiguities,
            })
        }
        Err(Abort::Cancelled) => Err(Abort::Cancelled),
        Err(Abort::Budget) => {
            let span = Span::new(0, input.len());
            errors.push(RecognitionError::new(
                span,
                "interpretation budget exhausted; the grammar may be degenerate",
                Severity::Fatal,
            ));
            Ok(RunParts {
                root: TreeNode::Error(ErrorNode::new(
                    None,
                    "budget exhausted",
                    span,
                )),
                tokens,
                errors,
                ambiguities: Vec::new(),
            })
        }
    }
}

fn synthetic_outcome(input: &str, message: &str, started: Instant) -> ParseOutcome {
    let span = Span::new(0, input.len());
    ParseOutcome::new(
        TreeNode::Error(ErrorNode::new(None, message, span)),
        Vec::new(),
        vec![RecognitionError::new(span, message, Severity::Fatal)],
        Vec::new(),
        started.elapsed(),
    )
}
