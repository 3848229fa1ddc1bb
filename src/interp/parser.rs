// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Memoizing recursive-descent parser over the default-channel token stream.
//!
//! Alternatives at a position are all tried; the longest match wins and a
//! tie is recorded as an ambiguity event with the lowest alternative number
//! taking the parse. Direct left recursion is handled by seeding the rule
//! with its non-recursive alternatives and growing the seed, where the
//! recursive alternative's position in the rule fixes its precedence and a
//! trailing self-reference binds one level tighter (left associativity).
//!
//! A failed start rule is re-parsed in recovery mode: the alternative whose
//! repair needs the fewest edits is kept, with single-token deletion tried
//! before synthetic insertion for each mandatory element that fails.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::model::{
    Alternative, AmbiguityEvent, Channel, Element, ElementKind, ErrorNode, GrammarPair,
    RecognitionError, Rule, RuleNode, Severity, Span, Suffix, TerminalNode, Token, TokenType,
    TreeNode,
};

use super::{Abort, CancelToken, InterpretOptions};

pub(super) struct Parsed {
    pub(super) root: TreeNode,
    pub(super) errors: Vec<RecognitionError>,
    pub(super) ambiguities: Vec<AmbiguityEvent>,
}

pub(super) fn parse(
    pair: &GrammarPair,
    tokens: &[Token],
    rule_index: usize,
    cancel: &CancelToken,
    options: &InterpretOptions,
) -> Result<Parsed, Abort> {
    let stream = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, t)| (t.channel() == Channel::Default).then_some(i))
        .collect();
    let mut ctx = Ctx {
        pair,
        tokens,
        stream,
        cancel,
        fuel: options.fuel(),
        max_depth: options.max_depth(),
        errors: Vec::new(),
        ambiguities: Vec::new(),
        memo: BTreeMap::new(),
    };

    let matched = match ctx.parse_rule(rule_index, 0, 0, 0)? {
        Some(matched) => matched,
        None => ctx.recover_rule(rule_index, 0, 0)?,
    };
    ctx.report_extraneous(matched.end);

    Ok(Parsed {
        root: matched.node,
        errors: ctx.errors,
        ambiguities: ctx.ambiguities,
    })
}

type Step<T> = Result<T, Abort>;

#[derive(Clone)]
struct Matched {
    node: TreeNode,
    end: usize,
}

enum Memo {
    InProgress,
    Done(Option<Matched>),
}

struct Ctx<'a> {
    pair: &'a GrammarPair,
    tokens: &'a [Token],
    /// Indices of default-channel tokens, the EOF sentinel last. Positions
    /// below are indices into this stream, not into `tokens`.
    stream: Vec<usize>,
    cancel: &'a CancelToken,
    fuel: u64,
    max_depth: usize,
    errors: Vec<RecognitionError>,
    ambiguities: Vec<AmbiguityEvent>,
    memo: BTreeMap<(usize, usize, usize), Memo>,
}

impl<'a> Ctx<'a> {
    fn token_at(&self, pos: usize) -> &'a Token {
        &self.tokens[self.stream[pos]]
    }

    /// Source offset where the token at `pos` begins; input end past the
    /// stream.
    fn offset_at(&self, pos: usize) -> usize {
        let idx = pos.min(self.stream.len() - 1);
        self.token_at(idx).span().start()
    }

    fn span_between(&self, start: usize, end: usize) -> Span {
        if end > start {
            Span::new(
                self.token_at(start).span().start(),
                self.token_at(end - 1).span().end(),
            )
        } else {
            Span::empty(self.offset_at(start))
        }
    }

    fn spend(&mut self, depth: usize) -> Step<()> {
        if self.fuel % 256 == 0 && self.cancel.is_cancelled() {
            return Err(Abort::Cancelled);
        }
        if depth > self.max_depth {
            return Err(Abort::Budget);
        }
        match self.fuel.checked_sub(1) {
            Some(fuel) => {
                self.fuel = fuel;
                Ok(())
            }
            None => Err(Abort::Budget),
        }
    }

    fn parse_rule(
        &mut self,
        rule_index: usize,
        pos: usize,
        min_prec: usize,
        depth: usize,
    ) -> Step<Option<Matched>> {
        self.spend(depth)?;
        let key = (rule_index, pos, min_prec);
        match self.memo.get(&key) {
            Some(Memo::InProgress) => return Ok(None),
            Some(Memo::Done(result)) => return Ok(result.clone()),
            None => {}
        }
        self.memo.insert(key, Memo::InProgress);
        let result = self.parse_rule_uncached(rule_index, pos, min_prec, depth)?;
        self.memo.insert(key, Memo::Done(result.clone()));
        Ok(result)
    }

    fn parse_rule_uncached(
        &mut self,
        rule_index: usize,
        pos: usize,
        min_prec: usize,
        depth: usize,
    ) -> Step<Option<Matched>> {
        let pair = self.pair;
        let Some(rule) = pair.grammar().rule(rule_index) else {
            return Ok(None);
        };

        let mut best: Option<(usize, Vec<TreeNode>, usize)> = None;
        let mut tied: Vec<usize> = Vec::new();
        for (idx, alt) in rule.alternatives().iter().enumerate() {
            if is_left_recursive(rule, alt) {
                continue;
            }
            let mut children = Vec::new();
            if let Some(end) =
                self.parse_seq(rule, alt.elements(), pos, depth, None, &mut children)?
            {
                match &best {
                    None => {
                        best = Some((idx, children, end));
                        tied = vec![idx];
                    }
                    Some((_, _, bend)) => {
                        if end > *bend {
                            best = Some((idx, children, end));
                            tied = vec![idx];
                        } else if end == *bend {
                            tied.push(idx);
                        }
                    }
                }
            }
        }

        let Some((alt_idx, children, end)) = best else {
            return Ok(None);
        };
        if tied.len() > 1 {
            self.ambiguities.push(AmbiguityEvent::new(
                rule.name(),
                self.span_between(pos, end),
                tied.iter().map(|i| i + 1).collect(),
            ));
        }

        let seed = Matched {
            node: self.rule_node(rule, alt_idx, children, pos, end),
            end,
        };
        self.grow(rule, seed, pos, min_prec, depth).map(Some)
    }

    /// Grows a seed through the rule's left-recursive alternatives until no
    /// alternative extends it. Each pass must consume input, so the loop
    /// terminates.
    fn grow(
        &mut self,
        rule: &Rule,
        seed: Matched,
        pos: usize,
        min_prec: usize,
        depth: usize,
    ) -> Step<Matched> {
        let num = rule.alternatives().len();
        let mut node = seed.node;
        let mut node_end = seed.end;
        loop {
            let mut grown: Option<(usize, Vec<TreeNode>, usize)> = None;
            let mut tied: Vec<usize> = Vec::new();
            for (idx, alt) in rule.alternatives().iter().enumerate() {
                if !is_left_recursive(rule, alt) {
                    continue;
                }
                let prec = num - idx;
                if prec < min_prec {
                    continue;
                }
                let mut children = Vec::new();
                if let Some(end) = self.parse_seq(
                    rule,
                    &alt.elements()[1..],
                    node_end,
                    depth,
                    Some(prec + 1),
                    &mut children,
                )? {
                    if end > node_end {
                        match &grown {
                            None => {
                                grown = Some((idx, children, end));
                                tied = vec![idx];
                            }
                            Some((_, _, bend)) => {
                                if end > *bend {
                                    grown = Some((idx, children, end));
                                    tied = vec![idx];
                                } else if end == *bend {
                                    tied.push(idx);
                                }
                            }
                        }
                    }
                }
            }
            let Some((idx, tail, end)) = grown else {
                break;
            };
            if tied.len() > 1 {
                self.ambiguities.push(AmbiguityEvent::new(
                    rule.name(),
                    self.span_between(pos, end),
                    tied.iter().map(|i| i + 1).collect(),
                ));
            }
            let mut children = Vec::with_capacity(tail.len() + 1);
            children.push(node);
            children.extend(tail);
            node = self.rule_node(rule, idx, children, pos, end);
            node_end = end;
        }
        Ok(Matched {
            node,
            end: node_end,
        })
    }

    /// Matches a sequence of elements, pushing child nodes into `out`.
    /// Repetition is greedy with backtracking over the repeat count. On
    /// failure `out` is restored to its length at entry.
    fn parse_seq(
        &mut self,
        rule: &Rule,
        elements: &[Element],
        pos: usize,
        depth: usize,
        trailing_prec: Option<usize>,
        out: &mut Vec<TreeNode>,
    ) -> Step<Option<usize>> {
        let Some((element, rest)) = elements.split_first() else {
            return Ok(Some(pos));
        };
        let prec = if rest.is_empty() && is_self_ref(rule, element) {
            trailing_prec.unwrap_or(0)
        } else {
            0
        };
        let mark = out.len();

        match element.suffix() {
            Suffix::One => {
                if let Some(end) = self.parse_element(rule, element, pos, depth, prec, out)? {
                    if let Some(total) =
                        self.parse_seq(rule, rest, end, depth, trailing_prec, out)?
                    {
                        return Ok(Some(total));
                    }
                }
                out.truncate(mark);
                Ok(None)
            }
            Suffix::Optional => {
                if let Some(end) = self.parse_element(rule, element, pos, depth, prec, out)? {
                    if let Some(total) =
                        self.parse_seq(rule, rest, end, depth, trailing_prec, out)?
                    {
                        return Ok(Some(total));
                    }
                }
                out.truncate(mark);
                self.parse_seq(rule, rest, pos, depth, trailing_prec, out)
            }
            Suffix::Star | Suffix::Plus => {
                let mut checkpoints = vec![(pos, out.len())];
                let mut at = pos;
                loop {
                    let before = out.len();
                    match self.parse_element(rule, element, at, depth, prec, out)? {
                        Some(end) if end > at => {
                            checkpoints.push((end, out.len()));
                            at = end;
                        }
                        // empty iterations repeat forever, so stop here
                        Some(_) | None => {
                            out.truncate(before);
                            break;
                        }
                    }
                }
                let min = element.suffix().min_matches();
                while checkpoints.len() > min {
                    if let Some((end, len)) = checkpoints.pop() {
                        out.truncate(len);
                        if let Some(total) =
                            self.parse_seq(rule, rest, end, depth, trailing_prec, out)?
                        {
                            return Ok(Some(total));
                        }
                    }
                }
                out.truncate(mark);
                Ok(None)
            }
        }
    }

    /// Matches one atom at `pos`. Pushes nothing when the match fails.
    fn parse_element(
        &mut self,
        rule: &Rule,
        element: &Element,
        pos: usize,
        depth: usize,
        min_prec: usize,
        out: &mut Vec<TreeNode>,
    ) -> Step<Option<usize>> {
        self.spend(depth)?;
        match element.kind() {
            ElementKind::RuleRef(name) => {
                let pair = self.pair;
                let Some(target) = pair.grammar().rule_by_name(name) else {
                    return Ok(None);
                };
                match self.parse_rule(target.index(), pos, min_prec, depth + 1)? {
                    Some(matched) => {
                        out.push(matched.node);
                        Ok(Some(matched.end))
                    }
                    None => Ok(None),
                }
            }
            ElementKind::TokenRef(name) => match self.pair.lexer().token_type_by_name(name) {
                Some(ty) => self.match_terminal(pos, ty, out),
                None => Ok(None),
            },
            ElementKind::Literal(text) => match self.pair.lexer().token_type_of_literal(text) {
                Some(ty) => self.match_terminal(pos, ty, out),
                None => Ok(None),
            },
            ElementKind::Eof => self.match_terminal(pos, TokenType::EOF, out),
            ElementKind::Group(alternatives) => {
                let mut best: Option<(Vec<TreeNode>, usize)> = None;
                for alt in alternatives {
                    let mut children = Vec::new();
                    if let Some(end) =
                        self.parse_seq(rule, alt.elements(), pos, depth + 1, None, &mut children)?
                    {
                        if best.as_ref().map_or(true, |(_, bend)| end > *bend) {
                            best = Some((children, end));
                        }
                    }
                }
                match best {
                    Some((children, end)) => {
                        out.extend(children);
                        Ok(Some(end))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    fn match_terminal(
        &mut self,
        pos: usize,
        want: TokenType,
        out: &mut Vec<TreeNode>,
    ) -> Step<Option<usize>> {
        if pos >= self.stream.len() {
            return Ok(None);
        }
        let token = self.token_at(pos);
        if token.ty() == want {
            out.push(TreeNode::Terminal(TerminalNode::new(token.clone())));
            Ok(Some(pos + 1))
        } else {
            Ok(None)
        }
    }

    fn rule_node(
        &self,
        rule: &Rule,
        alt_idx: usize,
        children: Vec<TreeNode>,
        pos: usize,
        end: usize,
    ) -> TreeNode {
        let label = rule.alternatives()[alt_idx].label().map(SmolStr::from);
        TreeNode::Rule(RuleNode::new(
            rule.index(),
            rule.name(),
            alt_idx + 1,
            label,
            self.span_between(pos, end),
            children,
        ))
    }

    /// Repairs the rule at `pos` after a clean parse failed. Every primary
    /// alternative is repaired into a side buffer; the one needing the
    /// fewest edits wins, longest match breaking ties.
    fn recover_rule(&mut self, rule_index: usize, pos: usize, depth: usize) -> Step<Matched> {
        let pair = self.pair;
        let Some(rule) = pair.grammar().rule(rule_index) else {
            let span = Span::empty(self.offset_at(pos));
            return Ok(Matched {
                node: TreeNode::Error(ErrorNode::new(None, "unknown start rule", span)),
                end: pos,
            });
        };

        let mut best: Option<(usize, Vec<TreeNode>, usize, Vec<RecognitionError>)> = None;
        for (idx, alt) in rule.alternatives().iter().enumerate() {
            if is_left_recursive(rule, alt) {
                continue;
            }
            let err_mark = self.errors.len();
            let (children, end) = self.recover_seq(rule, alt.elements(), pos, depth)?;
            let errs = self.errors.split_off(err_mark);
            let better = match &best {
                None => true,
                Some((_, _, bend, berrs)) => {
                    errs.len() < berrs.len() || (errs.len() == berrs.len() && end > *bend)
                }
            };
            if better {
                best = Some((idx, children, end, errs));
            }
        }

        let Some((alt_idx, children, end, errs)) = best else {
            let token = self.token_at(pos.min(self.stream.len() - 1));
            let span = token.span();
            let carried = (!token.is_eof()).then(|| token.clone());
            let message = format!("cannot match rule '{}'", rule.name());
            self.errors
                .push(RecognitionError::new(span, message.clone(), Severity::Error));
            return Ok(Matched {
                node: TreeNode::Error(ErrorNode::new(carried, message, span)),
                end: pos,
            });
        };
        self.errors.extend(errs);

        let seed = Matched {
            node: self.rule_node(rule, alt_idx, children, pos, end),
            end,
        };
        self.grow(rule, seed, pos, 0, depth)
    }

    /// Matches a sequence with repair: optional parts are best-effort, and
    /// a mandatory element that fails is patched by deletion or insertion.
    fn recover_seq(
        &mut self,
        rule: &Rule,
        elements: &[Element],
        pos: usize,
        depth: usize,
    ) -> Step<(Vec<TreeNode>, usize)> {
        let mut out = Vec::new();
        let mut at = pos;
        for element in elements {
            match element.suffix() {
                Suffix::One => {
                    at = self.recover_element(rule, element, at, depth, &mut out)?;
                }
                Suffix::Optional => {
                    if let Some(end) = self.parse_element(rule, element, at, depth, 0, &mut out)? {
                        at = end;
                    }
                }
                Suffix::Star | Suffix::Plus => {
                    let mut matched = false;
                    at = self.repeat_greedy(rule, element, at, depth, &mut matched, &mut out)?;
                    if element.suffix() == Suffix::Plus && !matched {
                        at = self.recover_element(rule, element, at, depth, &mut out)?;
                        at = self.repeat_greedy(rule, element, at, depth, &mut matched, &mut out)?;
                    }
                }
            }
        }
        Ok((out, at))
    }

    fn repeat_greedy(
        &mut self,
        rule: &Rule,
        element: &Element,
        pos: usize,
        depth: usize,
        matched: &mut bool,
        out: &mut Vec<TreeNode>,
    ) -> Step<usize> {
        let mut at = pos;
        loop {
            let before = out.len();
            match self.parse_element(rule, element, at, depth, 0, out)? {
                Some(end) if end > at => {
                    *matched = true;
                    at = end;
                }
                Some(_) | None => {
                    out.truncate(before);
                    return Ok(at);
                }
            }
        }
    }

    /// A mandatory element that fails is repaired: first by deleting one
    /// token and retrying, then by inserting a synthetic placeholder.
    fn recover_element(
        &mut self,
        rule: &Rule,
        element: &Element,
        pos: usize,
        depth: usize,
        out: &mut Vec<TreeNode>,
    ) -> Step<usize> {
        if let Some(end) = self.parse_element(rule, element, pos, depth, 0, out)? {
            return Ok(end);
        }

        if pos + 1 < self.stream.len() {
            let mark = out.len();
            if let Some(end) = self.parse_element(rule, element, pos + 1, depth, 0, out)? {
                let token = self.token_at(pos).clone();
                let message = format!("extraneous input '{}'", token.text());
                self.errors
                    .push(RecognitionError::new(token.span(), message.clone(), Severity::Error));
                out.insert(
                    mark,
                    TreeNode::Error(ErrorNode::new(Some(token.clone()), message, token.span())),
                );
                return Ok(end);
            }
        }

        let span = Span::empty(self.offset_at(pos));
        let message = format!("missing {}", describe_element(element));
        self.errors
            .push(RecognitionError::new(span, message.clone(), Severity::Error));
        out.push(TreeNode::Error(ErrorNode::new(None, message, span)));
        Ok(pos)
    }

    fn report_extraneous(&mut self, end: usize) {
        let eof_pos = self.stream.len() - 1;
        if end >= eof_pos {
            return;
        }
        let first = self.token_at(end);
        let span = Span::new(
            first.span().start(),
            self.token_at(eof_pos - 1).span().end(),
        );
        self.errors.push(RecognitionError::new(
            span,
            format!("extraneous input '{}'", first.text()),
            Severity::Error,
        ));
    }
}

fn is_self_ref(rule: &Rule, element: &Element) -> bool {
    element.suffix() == Suffix::One
        && matches!(element.kind(), ElementKind::RuleRef(name) if name.as_str() == rule.name())
}

fn is_left_recursive(rule: &Rule, alt: &Alternative) -> bool {
    alt.elements()
        .first()
        .map_or(false, |element| is_self_ref(rule, element))
}

fn describe_element(element: &Element) -> String {
    match element.kind() {
        ElementKind::Literal(text) => format!("'{text}'"),
        ElementKind::TokenRef(name) => name.to_string(),
        ElementKind::RuleRef(name) => format!("rule '{name}'"),
        ElementKind::Eof => "EOF".to_string(),
        ElementKind::Group(_) => "group".to_string(),
    }
}
