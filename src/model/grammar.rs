// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use super::token::{Channel, TokenType};

/// Parser-rule side of a compiled grammar.
///
/// Rules keep their source order; `rule_index` is a name lookup built once at
/// construction. Reference validation (undefined rules, duplicates) happens
/// in the compiler, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarModel {
    name: SmolStr,
    rules: Vec<Rule>,
    rule_index: BTreeMap<SmolStr, usize>,
}

impl GrammarModel {
    pub fn new(name: impl Into<SmolStr>, rules: Vec<Rule>) -> Self {
        let mut rule_index = BTreeMap::new();
        for rule in &rules {
            rule_index.entry(rule.name.clone()).or_insert(rule.index);
        }
        Self {
            name: name.into(),
            rules,
            rule_index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rule_index.get(name).map(|&idx| &self.rules[idx])
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    index: usize,
    name: SmolStr,
    alternatives: Vec<Alternative>,
}

impl Rule {
    pub fn new(index: usize, name: impl Into<SmolStr>, alternatives: Vec<Alternative>) -> Self {
        Self {
            index,
            name: name.into(),
            alternatives,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    label: Option<SmolStr>,
    elements: Vec<Element>,
}

impl Alternative {
    pub fn new(label: Option<SmolStr>, elements: Vec<Element>) -> Self {
        Self { label, elements }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    suffix: Suffix,
}

impl Element {
    pub fn new(kind: ElementKind, suffix: Suffix) -> Self {
        Self { kind, suffix }
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn suffix(&self) -> Suffix {
        self.suffix
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    RuleRef(SmolStr),
    TokenRef(SmolStr),
    Literal(SmolStr),
    Eof,
    Group(Vec<Alternative>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    One,
    Optional,
    Star,
    Plus,
}

impl Suffix {
    pub fn min_matches(&self) -> usize {
        match self {
            Self::One | Self::Plus => 1,
            Self::Optional | Self::Star => 0,
        }
    }

    pub fn allows_repeat(&self) -> bool {
        matches!(self, Self::Star | Self::Plus)
    }
}

/// Lexer-rule side of a compiled grammar.
///
/// Definition order is match priority after the longest-match rule: implicit
/// literal tokens are materialized ahead of named definitions, so keyword
/// literals win ties against broader named rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerGrammar {
    defs: Vec<TokenDef>,
    by_name: BTreeMap<SmolStr, u32>,
    by_literal: BTreeMap<SmolStr, u32>,
}

impl LexerGrammar {
    pub fn new(defs: Vec<TokenDef>) -> Self {
        let mut by_name = BTreeMap::new();
        let mut by_literal = BTreeMap::new();
        for def in &defs {
            if let Some(name) = &def.name {
                by_name.entry(name.clone()).or_insert(def.ty.index());
            }
            if let Some(literal) = def.single_literal() {
                by_literal.entry(literal).or_insert(def.ty.index());
            }
        }
        Self {
            defs,
            by_name,
            by_literal,
        }
    }

    pub fn defs(&self) -> &[TokenDef] {
        &self.defs
    }

    pub fn def(&self, ty: TokenType) -> Option<&TokenDef> {
        if ty.is_eof() {
            return None;
        }
        self.defs.get(ty.index() as usize)
    }

    /// Looks up a definition by symbolic name, fragments included.
    pub fn def_by_name(&self, name: &str) -> Option<&TokenDef> {
        self.by_name
            .get(name)
            .map(|&idx| &self.defs[idx as usize])
    }

    pub fn token_type_by_name(&self, name: &str) -> Option<TokenType> {
        self.by_name.get(name).map(|&idx| TokenType::new(idx))
    }

    /// Token type matching this exact literal text: an implicit literal
    /// definition, or a named definition whose whole pattern is that one
    /// literal (a declared keyword token).
    pub fn token_type_of_literal(&self, literal: &str) -> Option<TokenType> {
        self.by_literal.get(literal).map(|&idx| TokenType::new(idx))
    }

    pub fn symbolic_name(&self, ty: TokenType) -> Option<&str> {
        self.def(ty).and_then(|def| def.name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDef {
    ty: TokenType,
    name: Option<SmolStr>,
    literal: Option<SmolStr>,
    pattern: TokenPattern,
    channel: Channel,
    skip: bool,
    fragment: bool,
}

impl TokenDef {
    pub fn named(
        ty: TokenType,
        name: impl Into<SmolStr>,
        pattern: TokenPattern,
        channel: Channel,
        skip: bool,
        fragment: bool,
    ) -> Self {
        Self {
            ty,
            name: Some(name.into()),
            literal: None,
            pattern,
            channel,
            skip,
            fragment,
        }
    }

    pub fn implicit_literal(ty: TokenType, literal: impl Into<SmolStr>) -> Self {
        let literal = literal.into();
        let pattern = TokenPattern::single(PatternElement::new(
            Atom::Literal(literal.clone()),
            Suffix::One,
        ));
        Self {
            ty,
            name: None,
            literal: Some(literal),
            pattern,
            channel: Channel::Default,
            skip: false,
            fragment: false,
        }
    }

    pub fn ty(&self) -> TokenType {
        self.ty
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Symbolic name, or the quoted literal for implicit tokens.
    pub fn display_name(&self) -> SmolStr {
        match (&self.name, &self.literal) {
            (Some(name), _) => name.clone(),
            (None, Some(literal)) => SmolStr::from(format!("'{literal}'")),
            (None, None) => SmolStr::default(),
        }
    }

    pub fn pattern(&self) -> &TokenPattern {
        &self.pattern
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    pub fn is_implicit(&self) -> bool {
        self.name.is_none()
    }

    /// The literal this definition matches, when its whole pattern is one
    /// plain literal (implicit tokens and declared keyword tokens).
    pub fn single_literal(&self) -> Option<SmolStr> {
        if let Some(literal) = &self.literal {
            return Some(literal.clone());
        }
        if self.fragment {
            return None;
        }
        let alts = self.pattern.alts();
        if alts.len() != 1 || alts[0].len() != 1 {
            return None;
        }
        let element = &alts[0][0];
        match (element.atom(), element.suffix()) {
            (Atom::Literal(text), Suffix::One) => Some(text.clone()),
            _ => None,
        }
    }
}

/// Alternation of sequences of suffixed atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPattern {
    alts: Vec<Vec<PatternElement>>,
}

impl TokenPattern {
    pub fn new(alts: Vec<Vec<PatternElement>>) -> Self {
        Self { alts }
    }

    pub fn single(element: PatternElement) -> Self {
        Self {
            alts: vec![vec![element]],
        }
    }

    pub fn alts(&self) -> &[Vec<PatternElement>] {
        &self.alts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternElement {
    atom: Atom,
    suffix: Suffix,
}

impl PatternElement {
    pub fn new(atom: Atom, suffix: Suffix) -> Self {
        Self { atom, suffix }
    }

    pub fn atom(&self) -> &Atom {
        &self.atom
    }

    pub fn suffix(&self) -> Suffix {
        self.suffix
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Literal(SmolStr),
    Class(CharClass),
    Any,
    Ref(SmolStr),
    Group(TokenPattern),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    ranges: Vec<CharRange>,
    negated: bool,
}

impl CharClass {
    pub fn new(ranges: Vec<CharRange>, negated: bool) -> Self {
        Self { ranges, negated }
    }

    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn matches(&self, c: char) -> bool {
        let inside = self.ranges.iter().any(|range| range.contains(c));
        inside != self.negated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    lo: char,
    hi: char,
}

impl CharRange {
    pub fn new(lo: char, hi: char) -> Self {
        debug_assert!(lo <= hi, "char range must be ordered");
        Self { lo, hi }
    }

    pub fn single(c: char) -> Self {
        Self { lo: c, hi: c }
    }

    pub fn contains(&self, c: char) -> bool {
        self.lo <= c && c <= self.hi
    }
}

/// A grammar and its lexer, always produced and replaced as one unit so a
/// consumer can never pair a grammar from one compile with a lexer from
/// another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarPair {
    grammar: GrammarModel,
    lexer: LexerGrammar,
}

impl GrammarPair {
    pub fn new(grammar: GrammarModel, lexer: LexerGrammar) -> Self {
        Self { grammar, lexer }
    }

    pub fn grammar(&self) -> &GrammarModel {
        &self.grammar
    }

    pub fn lexer(&self) -> &LexerGrammar {
        &self.lexer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_lookup_by_name_and_index() {
        let rules = vec![
            Rule::new(0, "expr", vec![Alternative::new(None, Vec::new())]),
            Rule::new(1, "term", vec![Alternative::new(None, Vec::new())]),
        ];
        let model = GrammarModel::new("G", rules);
        assert_eq!(model.rule_by_name("term").map(Rule::index), Some(1));
        assert_eq!(model.rule(0).map(Rule::name), Some("expr"));
        assert!(model.rule_by_name("missing").is_none());
    }

    #[test]
    fn char_class_negation() {
        let class = CharClass::new(vec![CharRange::new('a', 'z')], false);
        assert!(class.matches('m'));
        assert!(!class.matches('0'));

        let negated = CharClass::new(vec![CharRange::new('a', 'z')], true);
        assert!(!negated.matches('m'));
        assert!(negated.matches('0'));
    }

    #[test]
    fn implicit_literal_lookup() {
        let defs = vec![
            TokenDef::implicit_literal(TokenType::new(0), "+"),
            TokenDef::named(
                TokenType::new(1),
                "INT",
                TokenPattern::single(PatternElement::new(
                    Atom::Class(CharClass::new(vec![CharRange::new('0', '9')], false)),
                    Suffix::Plus,
                )),
                Channel::Default,
                false,
                false,
            ),
        ];
        let lexer = LexerGrammar::new(defs);
        assert_eq!(
            lexer.token_type_of_literal("+"),
            Some(TokenType::new(0))
        );
        assert_eq!(lexer.token_type_by_name("INT"), Some(TokenType::new(1)));
        assert_eq!(lexer.symbolic_name(TokenType::new(0)), None);
        assert_eq!(
            lexer.def(TokenType::new(0)).map(TokenDef::display_name),
            Some("'+'".into())
        );
    }

    #[test]
    fn declared_keyword_token_resolves_by_literal() {
        let defs = vec![TokenDef::named(
            TokenType::new(0),
            "PLUS",
            TokenPattern::single(PatternElement::new(Atom::Literal("+".into()), Suffix::One)),
            Channel::Default,
            false,
            false,
        )];
        let lexer = LexerGrammar::new(defs);
        assert_eq!(lexer.token_type_of_literal("+"), Some(TokenType::new(0)));
        assert_eq!(lexer.symbolic_name(TokenType::new(0)), Some("PLUS"));
    }
}
