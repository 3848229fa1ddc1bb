// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![cfg(test)]

use super::grammar::{
    Alternative, Atom, CharClass, CharRange, Element, ElementKind, GrammarModel, GrammarPair,
    LexerGrammar, PatternElement, Rule, Suffix, TokenDef, TokenPattern,
};
use super::span::Span;
use super::token::{Channel, Token, TokenType};
use super::tree::{RuleNode, TerminalNode, TreeNode};

pub(crate) const TINY_GRAMMAR_SRC: &str = "grammar G;\n\nr: 'a' 'b' EOF;\n";

pub(crate) const EXPR_GRAMMAR_SRC: &str = "\
grammar Expr;

expr
    : expr '*' expr   #Mul
    | expr '+' expr   #Add
    | INT             #Lit
    ;

INT : [0-9]+ ;
WS  : [ \\t\\r\\n]+ -> skip ;
";

/// Hand-built pair for `grammar G; r: 'a' 'b' EOF;` so interpreter, layout
/// and query tests do not depend on the compiler.
pub(crate) fn tiny_pair() -> GrammarPair {
    let rules = vec![Rule::new(
        0,
        "r",
        vec![Alternative::new(
            None,
            vec![
                Element::new(ElementKind::Literal("a".into()), Suffix::One),
                Element::new(ElementKind::Literal("b".into()), Suffix::One),
                Element::new(ElementKind::Eof, Suffix::One),
            ],
        )],
    )];
    let defs = vec![
        TokenDef::implicit_literal(TokenType::new(0), "a"),
        TokenDef::implicit_literal(TokenType::new(1), "b"),
    ];
    GrammarPair::new(GrammarModel::new("G", rules), LexerGrammar::new(defs))
}

/// Pair for a digits-and-operators grammar with direct left recursion:
/// `expr: expr '*' expr #Mul | expr '+' expr #Add | INT #Lit;`.
pub(crate) fn expr_pair() -> GrammarPair {
    let expr_ref = |suffix| Element::new(ElementKind::RuleRef("expr".into()), suffix);
    let rules = vec![Rule::new(
        0,
        "expr",
        vec![
            Alternative::new(
                Some("Mul".into()),
                vec![
                    expr_ref(Suffix::One),
                    Element::new(ElementKind::Literal("*".into()), Suffix::One),
                    expr_ref(Suffix::One),
                ],
            ),
            Alternative::new(
                Some("Add".into()),
                vec![
                    expr_ref(Suffix::One),
                    Element::new(ElementKind::Literal("+".into()), Suffix::One),
                    expr_ref(Suffix::One),
                ],
            ),
            Alternative::new(
                Some("Lit".into()),
                vec![Element::new(ElementKind::TokenRef("INT".into()), Suffix::One)],
            ),
        ],
    )];
    let digits = PatternElement::new(
        Atom::Class(CharClass::new(vec![CharRange::new('0', '9')], false)),
        Suffix::Plus,
    );
    let blanks = PatternElement::new(
        Atom::Class(
            CharClass::new(
                vec![
                    CharRange::single(' '),
                    CharRange::single('\t'),
                    CharRange::single('\r'),
                    CharRange::single('\n'),
                ],
                false,
            ),
        ),
        Suffix::Plus,
    );
    let defs = vec![
        TokenDef::implicit_literal(TokenType::new(0), "*"),
        TokenDef::implicit_literal(TokenType::new(1), "+"),
        TokenDef::named(
            TokenType::new(2),
            "INT",
            TokenPattern::single(digits),
            Channel::Default,
            false,
            false,
        ),
        TokenDef::named(
            TokenType::new(3),
            "WS",
            TokenPattern::single(blanks),
            Channel::Default,
            true,
            false,
        ),
    ];
    GrammarPair::new(GrammarModel::new("Expr", rules), LexerGrammar::new(defs))
}

pub(crate) fn terminal(ty: u32, text: &str, start: usize) -> TreeNode {
    TreeNode::Terminal(TerminalNode::new(Token::new(
        TokenType::new(ty),
        Channel::Default,
        text,
        Span::new(start, start + text.len()),
    )))
}

pub(crate) fn eof_terminal(at: usize) -> TreeNode {
    TreeNode::Terminal(TerminalNode::new(Token::eof(at)))
}

/// Parse tree of `tiny_pair()` over input `"ab"`.
pub(crate) fn tiny_ok_tree() -> TreeNode {
    TreeNode::Rule(RuleNode::new(
        0,
        "r",
        1,
        None,
        Span::new(0, 2),
        vec![terminal(0, "a", 0), terminal(1, "b", 1), eof_terminal(2)],
    ))
}
