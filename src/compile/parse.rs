// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use crate::model::{
    Alternative, Atom, CharClass, Channel, Element, ElementKind, GrammarIssue, PatternElement,
    Severity, Span, Suffix, TokenPattern,
};

use super::scan::{RawKind, RawToken};

#[derive(Debug, Default)]
pub(super) struct ParsedGrammar {
    pub(super) name: Option<SmolStr>,
    pub(super) parser_rules: Vec<ParsedParserRule>,
    pub(super) lexer_rules: Vec<ParsedLexerRule>,
}

#[derive(Debug)]
pub(super) struct ParsedParserRule {
    pub(super) name: SmolStr,
    pub(super) name_span: Span,
    pub(super) alternatives: Vec<Alternative>,
}

#[derive(Debug)]
pub(super) struct ParsedLexerRule {
    pub(super) name: SmolStr,
    pub(super) name_span: Span,
    pub(super) pattern: TokenPattern,
    pub(super) channel: Channel,
    pub(super) skip: bool,
    pub(super) fragment: bool,
}

/// Parses the raw token stream into rule declarations.
///
/// Recovery is per rule: a malformed declaration reports one issue and skips
/// to the next `;`, so several problems surface in a single compile.
pub(super) fn parse(tokens: &[RawToken], issues: &mut Vec<GrammarIssue>) -> ParsedGrammar {
    Parser {
        tokens,
        pos: 0,
        issues,
        actions_noted: false,
    }
    .parse_grammar()
}

struct Parser<'a> {
    tokens: &'a [RawToken],
    pos: usize,
    issues: &'a mut Vec<GrammarIssue>,
    actions_noted: bool,
}

impl Parser<'_> {
    fn parse_grammar(mut self) -> ParsedGrammar {
        let name = self.parse_header();
        let mut grammar = ParsedGrammar {
            name,
            ..ParsedGrammar::default()
        };

        while !self.at_end() {
            let fragment = self.eat_ident("fragment");
            let Some((name, name_span)) = self.take_ident() else {
                let span = self.current_span();
                self.error_here("expected a rule name", span);
                self.skip_past_semi();
                continue;
            };
            if !self.eat(&RawKind::Colon) {
                let span = self.current_span();
                self.error_here(
                    &format!("expected ':' after rule name '{name}'"),
                    span,
                );
                self.skip_past_semi();
                continue;
            }

            if starts_uppercase(&name) {
                self.parse_lexer_rule(&mut grammar, name, name_span, fragment);
            } else {
                if fragment {
                    self.error_here(
                        &format!("'fragment' is only valid on lexer rules, not '{name}'"),
                        Some(name_span),
                    );
                }
                self.parse_parser_rule(&mut grammar, name, name_span);
            }
        }

        grammar
    }

    fn parse_header(&mut self) -> Option<SmolStr> {
        if !self.eat_ident("grammar") {
            let span = self.current_span();
            self.error_here("expected 'grammar <Name>;' header", span);
            return None;
        }
        let Some((name, _)) = self.take_ident() else {
            let span = self.current_span();
            self.error_here("expected a grammar name after 'grammar'", span);
            return None;
        };
        if !self.eat(&RawKind::Semi) {
            let span = self.current_span();
            self.error_here("expected ';' after the grammar name", span);
        }
        Some(name)
    }

    fn parse_parser_rule(&mut self, grammar: &mut ParsedGrammar, name: SmolStr, name_span: Span) {
        let alternatives = self.parse_alternatives(&name);
        if !self.eat(&RawKind::Semi) {
            let span = self.current_span();
            self.error_here(&format!("expected ';' to end rule '{name}'"), span);
            self.skip_past_semi();
        }
        grammar.parser_rules.push(ParsedParserRule {
            name,
            name_span,
            alternatives,
        });
    }

    /// `alt (#Label)? ('|' alt (#Label)?)*`, stopping at `;` or `)`.
    fn parse_alternatives(&mut self, rule_name: &str) -> Vec<Alternative> {
        let mut alternatives = Vec::new();
        loop {
            let mut elements = Vec::new();
            let mut label = None;
            loop {
                match self.peek() {
                    None | Some(RawKind::Semi | RawKind::Pipe | RawKind::RParen) => break,
                    Some(RawKind::Hash) => {
                        self.advance();
                        match self.take_ident() {
                            Some((ident, _)) => label = Some(ident),
                            None => {
                                let span = self.current_span();
                                self.error_here("expected a label name after '#'", span);
                            }
                        }
                    }
                    Some(RawKind::Action) => {
                        self.note_action();
                        self.advance();
                    }
                    _ => match self.parse_element(rule_name) {
                        Some(element) => elements.push(element),
                        None => break,
                    },
                }
            }
            alternatives.push(Alternative::new(label, elements));
            if !self.eat(&RawKind::Pipe) {
                break;
            }
        }
        alternatives
    }

    fn parse_element(&mut self, rule_name: &str) -> Option<Element> {
        let token = self.tokens.get(self.pos)?.clone();
        let kind = match &token.kind {
            RawKind::Ident(ident) => {
                self.advance();
                if ident == "EOF" {
                    ElementKind::Eof
                } else if starts_uppercase(ident) {
                    ElementKind::TokenRef(ident.clone())
                } else {
                    ElementKind::RuleRef(ident.clone())
                }
            }
            RawKind::Literal(text) => {
                self.advance();
                if text.is_empty() {
                    self.error_here("empty literal", Some(token.span));
                    return None;
                }
                ElementKind::Literal(text.clone())
            }
            RawKind::LParen => {
                self.advance();
                let inner = self.parse_alternatives(rule_name);
                if !self.eat(&RawKind::RParen) {
                    let span = self.current_span();
                    self.error_here("expected ')' to close group", span);
                }
                ElementKind::Group(inner)
            }
            other => {
                let message =
                    format!("unexpected {} in rule '{rule_name}'", other.describe());
                self.error_here(&message, Some(token.span));
                self.advance();
                return None;
            }
        };
        Some(Element::new(kind, self.parse_suffix()))
    }

    fn parse_lexer_rule(
        &mut self,
        grammar: &mut ParsedGrammar,
        name: SmolStr,
        name_span: Span,
        fragment: bool,
    ) {
        let pattern = self.parse_pattern(&name);
        let (channel, skip) = self.parse_commands(&name);
        if !self.eat(&RawKind::Semi) {
            let span = self.current_span();
            self.error_here(&format!("expected ';' to end lexer rule '{name}'"), span);
            self.skip_past_semi();
        }
        grammar.lexer_rules.push(ParsedLexerRule {
            name,
            name_span,
            pattern,
            channel,
            skip,
            fragment,
        });
    }

    /// Alternation of atom sequences, stopping at `;`, `->` or `)`.
    fn parse_pattern(&mut self, rule_name: &str) -> TokenPattern {
        let mut alts = Vec::new();
        loop {
            let mut sequence = Vec::new();
            loop {
                match self.peek() {
                    None
                    | Some(
                        RawKind::Semi | RawKind::Pipe | RawKind::RParen | RawKind::Arrow,
                    ) => break,
                    Some(RawKind::Action) => {
                        self.note_action();
                        self.advance();
                    }
                    _ => match self.parse_pattern_element(rule_name) {
                        Some(element) => sequence.push(element),
                        None => break,
                    },
                }
            }
            alts.push(sequence);
            if !self.eat(&RawKind::Pipe) {
                break;
            }
        }
        TokenPattern::new(alts)
    }

    fn parse_pattern_element(&mut self, rule_name: &str) -> Option<PatternElement> {
        let token = self.tokens.get(self.pos)?.clone();
        let atom = match &token.kind {
            RawKind::Literal(text) => {
                self.advance();
                if text.is_empty() {
                    self.error_here("empty literal", Some(token.span));
                    return None;
                }
                Atom::Literal(text.clone())
            }
            RawKind::Class(ranges) => {
                self.advance();
                Atom::Class(CharClass::new(ranges.clone(), false))
            }
            RawKind::Dot => {
                self.advance();
                Atom::Any
            }
            RawKind::Tilde => {
                self.advance();
                self.parse_negated_atom(rule_name, token.span)?
            }
            RawKind::Ident(ident) => {
                self.advance();
                if starts_uppercase(ident) {
                    Atom::Ref(ident.clone())
                } else {
                    self.error_here(
                        &format!(
                            "lexer rule '{rule_name}' cannot reference parser rule '{ident}'"
                        ),
                        Some(token.span),
                    );
                    return None;
                }
            }
            RawKind::LParen => {
                self.advance();
                let inner = self.parse_pattern(rule_name);
                if !self.eat(&RawKind::RParen) {
                    let span = self.current_span();
                    self.error_here("expected ')' to close group", span);
                }
                Atom::Group(inner)
            }
            other => {
                let message =
                    format!("unexpected {} in lexer rule '{rule_name}'", other.describe());
                self.error_here(&message, Some(token.span));
                self.advance();
                return None;
            }
        };
        Some(PatternElement::new(atom, self.parse_suffix()))
    }

    fn parse_negated_atom(&mut self, rule_name: &str, tilde_span: Span) -> Option<Atom> {
        let token = self.tokens.get(self.pos)?.clone();
        match &token.kind {
            RawKind::Class(ranges) => {
                self.advance();
                Some(Atom::Class(CharClass::new(ranges.clone(), true)))
            }
            RawKind::Literal(text) if text.chars().count() == 1 => {
                self.advance();
                let c = text.chars().next()?;
                Some(Atom::Class(CharClass::new(
                    vec![crate::model::CharRange::single(c)],
                    true,
                )))
            }
            _ => {
                self.error_here(
                    &format!(
                        "'~' in lexer rule '{rule_name}' must be followed by a char class or single-char literal"
                    ),
                    Some(tilde_span),
                );
                None
            }
        }
    }

    fn parse_suffix(&mut self) -> Suffix {
        let suffix = match self.peek() {
            Some(RawKind::Question) => Suffix::Optional,
            Some(RawKind::Star) => Suffix::Star,
            Some(RawKind::Plus) => Suffix::Plus,
            _ => return Suffix::One,
        };
        self.advance();
        suffix
    }

    /// `-> skip` / `-> channel(HIDDEN)`, comma-separated when combined.
    fn parse_commands(&mut self, rule_name: &str) -> (Channel, bool) {
        let mut channel = Channel::Default;
        let mut skip = false;
        if !self.eat(&RawKind::Arrow) {
            return (channel, skip);
        }
        loop {
            match self.take_ident() {
                Some((command, _)) if command == "skip" => skip = true,
                Some((command, span)) if command == "channel" => {
                    if self.eat(&RawKind::LParen) {
                        match self.take_ident() {
                            Some((channel_name, name_span)) => {
                                if channel_name == "HIDDEN" {
                                    channel = Channel::Hidden;
                                } else {
                                    self.error_here(
                                        &format!("unknown channel '{channel_name}' (only HIDDEN is supported)"),
                                        Some(name_span),
                                    );
                                }
                            }
                            None => {
                                let at = self.current_span();
                                self.error_here("expected a channel name", at);
                            }
                        }
                        if !self.eat(&RawKind::RParen) {
                            let at = self.current_span();
                            self.error_here("expected ')' after channel name", at);
                        }
                    } else {
                        self.error_here("expected '(' after 'channel'", Some(span));
                    }
                }
                Some((command, span)) => {
                    self.error_here(
                        &format!(
                            "unsupported lexer command '{command}' in rule '{rule_name}'"
                        ),
                        Some(span),
                    );
                }
                None => {
                    let at = self.current_span();
                    self.error_here("expected a lexer command after '->'", at);
                    break;
                }
            }
            if !self.eat(&RawKind::Comma) {
                break;
            }
        }
        (channel, skip)
    }

    fn note_action(&mut self) {
        if !self.actions_noted {
            self.actions_noted = true;
            let span = self.current_span();
            self.issues.push(GrammarIssue::new(
                "embedded action blocks are ignored during interpretation",
                Severity::Info,
                span,
            ));
        }
    }

    fn peek(&self) -> Option<&RawKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn current_span(&self) -> Option<Span> {
        self.tokens.get(self.pos).map(|t| t.span)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, kind: &RawKind) -> bool {
        if self.peek() == Some(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, expected: &str) -> bool {
        match self.peek() {
            Some(RawKind::Ident(ident)) if ident == expected => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn take_ident(&mut self) -> Option<(SmolStr, Span)> {
        match self.tokens.get(self.pos) {
            Some(RawToken {
                kind: RawKind::Ident(ident),
                span,
            }) => {
                let out = (ident.clone(), *span);
                self.advance();
                Some(out)
            }
            _ => None,
        }
    }

    fn error_here(&mut self, message: &str, span: Option<Span>) {
        self.issues.push(GrammarIssue::error(message, span));
    }

    fn skip_past_semi(&mut self) {
        while let Some(kind) = self.peek() {
            let done = *kind == RawKind::Semi;
            self.advance();
            if done {
                break;
            }
        }
    }
}

fn starts_uppercase(ident: &str) -> bool {
    ident.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::scan::scan;

    fn parse_src(source: &str) -> (ParsedGrammar, Vec<GrammarIssue>) {
        let mut issues = Vec::new();
        let tokens = scan(source, &mut issues);
        let grammar = parse(&tokens, &mut issues);
        (grammar, issues)
    }

    #[test]
    fn parses_tiny_grammar() {
        let (grammar, issues) = parse_src("grammar G; r: 'a' 'b' EOF;");
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert_eq!(grammar.name.as_deref(), Some("G"));
        assert_eq!(grammar.parser_rules.len(), 1);
        let rule = &grammar.parser_rules[0];
        assert_eq!(rule.name, "r");
        assert_eq!(rule.alternatives.len(), 1);
        let elements = rule.alternatives[0].elements();
        assert_eq!(elements.len(), 3);
        assert_eq!(*elements[2].kind(), ElementKind::Eof);
    }

    #[test]
    fn parses_labeled_alternatives() {
        let (grammar, issues) =
            parse_src("grammar E; expr: expr '+' expr #Add | INT #Lit;");
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        let rule = &grammar.parser_rules[0];
        assert_eq!(rule.alternatives[0].label(), Some("Add"));
        assert_eq!(rule.alternatives[1].label(), Some("Lit"));
        assert_eq!(
            *rule.alternatives[1].elements()[0].kind(),
            ElementKind::TokenRef("INT".into())
        );
    }

    #[test]
    fn parses_lexer_rules_with_commands() {
        let (grammar, issues) = parse_src(
            "grammar L; r: ID; ID: [a-z]+; WS: [ \\t]+ -> skip; COMMENT: '//' ~[\\n]* -> channel(HIDDEN);",
        );
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert_eq!(grammar.lexer_rules.len(), 3);
        let ws = &grammar.lexer_rules[1];
        assert!(ws.skip);
        let comment = &grammar.lexer_rules[2];
        assert_eq!(comment.channel, Channel::Hidden);
        assert!(!comment.skip);
    }

    #[test]
    fn parses_fragment_rules() {
        let (grammar, issues) =
            parse_src("grammar F; r: NUM; fragment DIGIT: [0-9]; NUM: DIGIT+;");
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert!(grammar.lexer_rules[0].fragment);
        assert!(!grammar.lexer_rules[1].fragment);
    }

    #[test]
    fn groups_and_suffixes() {
        let (grammar, issues) = parse_src("grammar G; r: ('a' | 'b')* 'c'?;");
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        let elements = grammar.parser_rules[0].alternatives[0].elements();
        assert_eq!(elements[0].suffix(), Suffix::Star);
        assert!(matches!(elements[0].kind(), ElementKind::Group(alts) if alts.len() == 2));
        assert_eq!(elements[1].suffix(), Suffix::Optional);
    }

    #[test]
    fn missing_header_still_parses_rules() {
        let (grammar, issues) = parse_src("r: 'a';");
        assert!(grammar.name.is_none());
        assert_eq!(grammar.parser_rules.len(), 1);
        assert!(issues.iter().any(|i| i.message().contains("header")));
    }

    #[test]
    fn malformed_rule_recovers_at_semi() {
        let (grammar, issues) = parse_src("grammar G; r: 'a' ??; s: 'b';");
        assert!(issues.iter().any(|i| i.message().contains("unexpected")));
        // The second rule still parses after recovery.
        assert!(grammar.parser_rules.iter().any(|r| r.name == "s"));
    }

    #[test]
    fn actions_noted_once_as_info() {
        let (_, issues) = parse_src("grammar G; r: 'a' {side()} 'b' {more()};");
        let infos: Vec<_> = issues
            .iter()
            .filter(|i| i.severity() == Severity::Info)
            .collect();
        assert_eq!(infos.len(), 1);
    }
}
