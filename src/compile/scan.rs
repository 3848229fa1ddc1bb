// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use crate::model::{CharRange, GrammarIssue, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RawToken {
    pub(super) kind: RawKind,
    pub(super) span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RawKind {
    Ident(SmolStr),
    /// Quoted literal, escapes already resolved.
    Literal(SmolStr),
    /// Char class `[...]`, ranges already resolved, negation handled by the
    /// parser via a preceding `~`.
    Class(Vec<CharRange>),
    /// Embedded `{ ... }` action block, skipped by the interpreter.
    Action,
    Colon,
    Semi,
    Pipe,
    LParen,
    RParen,
    Question,
    Star,
    Plus,
    Tilde,
    Dot,
    Hash,
    Comma,
    Arrow,
}

impl RawKind {
    pub(super) fn describe(&self) -> &'static str {
        match self {
            Self::Ident(_) => "identifier",
            Self::Literal(_) => "literal",
            Self::Class(_) => "char class",
            Self::Action => "action block",
            Self::Colon => "':'",
            Self::Semi => "';'",
            Self::Pipe => "'|'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Question => "'?'",
            Self::Star => "'*'",
            Self::Plus => "'+'",
            Self::Tilde => "'~'",
            Self::Dot => "'.'",
            Self::Hash => "'#'",
            Self::Comma => "','",
            Self::Arrow => "'->'",
        }
    }
}

/// Splits grammar source into raw tokens, collecting issues for malformed
/// pieces instead of stopping at the first one.
pub(super) fn scan(source: &str, issues: &mut Vec<GrammarIssue>) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '/' => match chars.peek() {
                Some((_, '/')) => {
                    for (_, c) in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some((_, '*')) => {
                    chars.next();
                    let mut closed = false;
                    let mut prev = '\0';
                    for (_, c) in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            closed = true;
                            break;
                        }
                        prev = c;
                    }
                    if !closed {
                        issues.push(GrammarIssue::error(
                            "unterminated block comment",
                            Some(Span::new(start, source.len())),
                        ));
                    }
                }
                _ => issues.push(GrammarIssue::error(
                    "unexpected '/'",
                    Some(Span::new(start, start + 1)),
                )),
            },
            '\'' => {
                let (text, end, closed) = scan_quoted(source, &mut chars, issues);
                let span = Span::new(start, end);
                if closed {
                    tokens.push(RawToken {
                        kind: RawKind::Literal(text),
                        span,
                    });
                } else {
                    issues.push(GrammarIssue::error("unterminated literal", Some(span)));
                }
            }
            '[' => {
                let (ranges, end, closed) = scan_class(source, &mut chars, issues);
                let span = Span::new(start, end);
                if closed {
                    tokens.push(RawToken {
                        kind: RawKind::Class(ranges),
                        span,
                    });
                } else {
                    issues.push(GrammarIssue::error("unterminated char class", Some(span)));
                }
            }
            '{' => {
                let (end, closed) = skip_action(source, &mut chars);
                let span = Span::new(start, end);
                if closed {
                    tokens.push(RawToken {
                        kind: RawKind::Action,
                        span,
                    });
                } else {
                    issues.push(GrammarIssue::error("unterminated action block", Some(span)));
                }
            }
            '-' => {
                if matches!(chars.peek(), Some((_, '>'))) {
                    chars.next();
                    tokens.push(RawToken {
                        kind: RawKind::Arrow,
                        span: Span::new(start, start + 2),
                    });
                } else {
                    issues.push(GrammarIssue::error(
                        "unexpected '-'",
                        Some(Span::new(start, start + 1)),
                    ));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        end = idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(RawToken {
                    kind: RawKind::Ident(SmolStr::from(&source[start..end])),
                    span: Span::new(start, end),
                });
            }
            _ => {
                let single = |kind| RawToken {
                    kind,
                    span: Span::new(start, start + ch.len_utf8()),
                };
                match ch {
                    ':' => tokens.push(single(RawKind::Colon)),
                    ';' => tokens.push(single(RawKind::Semi)),
                    '|' => tokens.push(single(RawKind::Pipe)),
                    '(' => tokens.push(single(RawKind::LParen)),
                    ')' => tokens.push(single(RawKind::RParen)),
                    '?' => tokens.push(single(RawKind::Question)),
                    '*' => tokens.push(single(RawKind::Star)),
                    '+' => tokens.push(single(RawKind::Plus)),
                    '~' => tokens.push(single(RawKind::Tilde)),
                    '.' => tokens.push(single(RawKind::Dot)),
                    '#' => tokens.push(single(RawKind::Hash)),
                    ',' => tokens.push(single(RawKind::Comma)),
                    _ => issues.push(GrammarIssue::error(
                        format!("unexpected character {ch:?}"),
                        Some(Span::new(start, start + ch.len_utf8())),
                    )),
                }
            }
        }
    }

    tokens
}

fn scan_quoted(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    issues: &mut Vec<GrammarIssue>,
) -> (SmolStr, usize, bool) {
    let mut text = String::new();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\'' => return (SmolStr::from(text), idx + 1, true),
            '\n' => return (SmolStr::from(text), idx, false),
            '\\' => match chars.next() {
                Some((esc_idx, esc)) => match resolve_escape(esc) {
                    Some(resolved) => text.push(resolved),
                    None => {
                        issues.push(GrammarIssue::error(
                            format!("unknown escape '\\{esc}'"),
                            Some(Span::new(idx, esc_idx + esc.len_utf8())),
                        ));
                        text.push(esc);
                    }
                },
                None => return (SmolStr::from(text), source.len(), false),
            },
            _ => text.push(ch),
        }
    }
    (SmolStr::from(text), source.len(), false)
}

fn scan_class(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    issues: &mut Vec<GrammarIssue>,
) -> (Vec<CharRange>, usize, bool) {
    let mut ranges = Vec::new();
    let mut pending: Option<char> = None;
    let mut in_range = false;

    fn flush(ranges: &mut Vec<CharRange>, pending: &mut Option<char>) {
        if let Some(lo) = pending.take() {
            ranges.push(CharRange::single(lo));
        }
    }

    while let Some((idx, ch)) = chars.next() {
        let resolved = match ch {
            ']' => {
                flush(&mut ranges, &mut pending);
                return (ranges, idx + 1, true);
            }
            '\n' => {
                flush(&mut ranges, &mut pending);
                return (ranges, idx, false);
            }
            '-' if pending.is_some() && !in_range => {
                in_range = true;
                continue;
            }
            '\\' => match chars.next() {
                Some((esc_idx, esc)) => match resolve_escape(esc) {
                    Some(resolved) => resolved,
                    None => {
                        issues.push(GrammarIssue::error(
                            format!("unknown escape '\\{esc}'"),
                            Some(Span::new(idx, esc_idx + esc.len_utf8())),
                        ));
                        esc
                    }
                },
                None => {
                    flush(&mut ranges, &mut pending);
                    return (ranges, source.len(), false);
                }
            },
            _ => ch,
        };

        if in_range {
            let lo = pending.take().unwrap_or(resolved);
            if lo <= resolved {
                ranges.push(CharRange::new(lo, resolved));
            } else {
                issues.push(GrammarIssue::error(
                    format!("char range out of order: '{lo}'-'{resolved}'"),
                    Some(Span::new(idx, idx + resolved.len_utf8())),
                ));
            }
            in_range = false;
        } else {
            flush(&mut ranges, &mut pending);
            pending = Some(resolved);
        }
    }

    flush(&mut ranges, &mut pending);
    (ranges, source.len(), false)
}

fn skip_action(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> (usize, bool) {
    let mut depth = 1usize;
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return (idx + 1, true);
                }
            }
            '\'' | '"' => {
                let quote = ch;
                while let Some((_, c)) = chars.next() {
                    if c == '\\' {
                        chars.next();
                    } else if c == quote {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    (source.len(), false)
}

fn resolve_escape(esc: char) -> Option<char> {
    match esc {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        ']' => Some(']'),
        '-' => Some('-'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_clean(source: &str) -> Vec<RawKind> {
        let mut issues = Vec::new();
        let tokens = scan(source, &mut issues);
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_rule_skeleton() {
        let kinds = scan_clean("r : 'a' B | c? ;");
        assert_eq!(
            kinds,
            vec![
                RawKind::Ident("r".into()),
                RawKind::Colon,
                RawKind::Literal("a".into()),
                RawKind::Ident("B".into()),
                RawKind::Pipe,
                RawKind::Ident("c".into()),
                RawKind::Question,
                RawKind::Semi,
            ]
        );
    }

    #[test]
    fn scans_class_with_ranges_and_escapes() {
        let kinds = scan_clean(r"[a-z0-9\t\]]");
        assert_eq!(
            kinds,
            vec![RawKind::Class(vec![
                CharRange::new('a', 'z'),
                CharRange::new('0', '9'),
                CharRange::single('\t'),
                CharRange::single(']'),
            ])]
        );
    }

    #[test]
    fn trailing_dash_in_class_is_plain_char() {
        let mut issues = Vec::new();
        let tokens = scan("[a-]", &mut issues);
        assert!(issues.is_empty());
        // `a` pending, `-` starts a range that never completes; `a` still lands.
        assert_eq!(tokens.len(), 1);
        match &tokens[0].kind {
            RawKind::Class(ranges) => assert_eq!(ranges, &vec![CharRange::single('a')]),
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn comments_are_skipped() {
        let kinds = scan_clean("r // trailing\n/* block */ : ;");
        assert_eq!(
            kinds,
            vec![RawKind::Ident("r".into()), RawKind::Colon, RawKind::Semi]
        );
    }

    #[test]
    fn arrow_and_command_idents() {
        let kinds = scan_clean("WS : [ ] -> skip ;");
        assert!(kinds.contains(&RawKind::Arrow));
        assert!(kinds.contains(&RawKind::Ident("skip".into())));
    }

    #[test]
    fn unterminated_literal_reports_issue() {
        let mut issues = Vec::new();
        let tokens = scan("r : 'oops\n;", &mut issues);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message().contains("unterminated literal"));
        assert!(tokens.iter().any(|t| t.kind == RawKind::Semi));
    }

    #[test]
    fn action_block_is_single_token() {
        let kinds = scan_clean("r : 'a' { println(\"}\"); } ;");
        assert_eq!(
            kinds,
            vec![
                RawKind::Ident("r".into()),
                RawKind::Colon,
                RawKind::Literal("a".into()),
                RawKind::Action,
                RawKind::Semi,
            ]
        );
    }
}
