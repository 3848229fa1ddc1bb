// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Longest-match tokenizer driven by the compiled lexer grammar.
//!
//! At every position all non-fragment definitions are tried; the longest
//! match wins, ties go to the lowest definition index. Implicit literals
//! sit ahead of named definitions in the table, which is what gives
//! keywords priority over identifier-shaped rules of equal length.

use crate::model::{
    Atom, Channel, LexerGrammar, PatternElement, RecognitionError, Severity, Span, Suffix, Token,
    TokenDef,
};

use super::{Abort, CancelToken};

/// Nested rule references deeper than this fail the match. Keeps cyclic
/// fragment references from overflowing the stack.
const MAX_REF_DEPTH: usize = 128;

const CANCEL_CHECK_INTERVAL: usize = 256;

/// Tokenizes `input`, appending one EOF sentinel. Unmatchable characters
/// are reported and skipped one at a time; lexing itself never fails.
pub(super) fn lex(
    lexer: &LexerGrammar,
    input: &str,
    cancel: &CancelToken,
    errors: &mut Vec<RecognitionError>,
) -> Result<Vec<Token>, Abort> {
    let matcher = Matcher { lexer, input };
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut steps = 0usize;

    while pos < input.len() {
        steps += 1;
        if steps % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(Abort::Cancelled);
        }

        match matcher.best_match(pos) {
            Some((def, end)) => {
                let channel = if def.is_skip() {
                    Channel::Hidden
                } else {
                    def.channel()
                };
                let span = Span::new(pos, end);
                tokens.push(Token::new(def.ty(), channel, &input[pos..end], span));
                pos = end;
            }
            None => {
                let c = match input[pos..].chars().next() {
                    Some(c) => c,
                    None => break,
                };
                let end = pos + c.len_utf8();
                errors.push(RecognitionError::new(
                    Span::new(pos, end),
                    format!("unrecognized character '{}'", c.escape_default()),
                    Severity::Error,
                ));
                pos = end;
            }
        }
    }

    tokens.push(Token::eof(input.len()));
    Ok(tokens)
}

struct Matcher<'a> {
    lexer: &'a LexerGrammar,
    input: &'a str,
}

impl<'a> Matcher<'a> {
    /// Longest match over all non-fragment definitions starting at `pos`.
    /// Zero-length matches never win; a definition must consume input.
    fn best_match(&self, pos: usize) -> Option<(&'a TokenDef, usize)> {
        let mut best: Option<(&TokenDef, usize)> = None;
        for def in self.lexer.defs() {
            if def.is_fragment() {
                continue;
            }
            if let Some(end) = self.match_alts(def.pattern().alts(), pos, 0) {
                if end > pos && best.map_or(true, |(_, b)| end > b) {
                    best = Some((def, end));
                }
            }
        }
        best
    }

    /// Longest end position over the alternatives, or None when none match.
    fn match_alts(&self, alts: &[Vec<PatternElement>], pos: usize, depth: usize) -> Option<usize> {
        let mut best = None;
        for seq in alts {
            if let Some(end) = self.match_seq(seq, pos, depth) {
                if best.map_or(true, |b| end > b) {
                    best = Some(end);
                }
            }
        }
        best
    }

    /// Matches a sequence of suffixed atoms. Repetition is greedy with
    /// backtracking over the repeat count: the atom is matched as many
    /// times as possible, then counts are retried from highest to lowest
    /// until the rest of the sequence fits.
    fn match_seq(&self, seq: &[PatternElement], pos: usize, depth: usize) -> Option<usize> {
        let Some((element, rest)) = seq.split_first() else {
            return Some(pos);
        };

        match element.suffix() {
            Suffix::One => {
                let end = self.match_atom(element.atom(), pos, depth)?;
                self.match_seq(rest, end, depth)
            }
            Suffix::Optional => {
                if let Some(end) = self.match_atom(element.atom(), pos, depth) {
                    if let Some(total) = self.match_seq(rest, end, depth) {
                        return Some(total);
                    }
                }
                self.match_seq(rest, pos, depth)
            }
            Suffix::Star | Suffix::Plus => {
                let mut ends = vec![pos];
                let mut at = pos;
                while let Some(end) = self.match_atom(element.atom(), at, depth) {
                    if end == at {
                        break;
                    }
                    ends.push(end);
                    at = end;
                }
                let min = element.suffix().min_matches();
                while ends.len() > min {
                    if let Some(end) = ends.pop() {
                        if let Some(total) = self.match_seq(rest, end, depth) {
                            return Some(total);
                        }
                    }
                }
                None
            }
        }
    }

    fn match_atom(&self, atom: &Atom, pos: usize, depth: usize) -> Option<usize> {
        if depth > MAX_REF_DEPTH {
            return None;
        }
        match atom {
            Atom::Literal(text) => {
                if self.input[pos..].starts_with(text.as_str()) {
                    Some(pos + text.len())
                } else {
                    None
                }
            }
            Atom::Class(class) => {
                let c = self.input[pos..].chars().next()?;
                if class.matches(c) {
                    Some(pos + c.len_utf8())
                } else {
                    None
                }
            }
            Atom::Any => {
                let c = self.input[pos..].chars().next()?;
                Some(pos + c.len_utf8())
            }
            Atom::Ref(name) => {
                let def = self.lexer.def_by_name(name)?;
                self.match_alts(def.pattern().alts(), pos, depth + 1)
            }
            Atom::Group(pattern) => self.match_alts(pattern.alts(), pos, depth + 1),
        }
    }
}
