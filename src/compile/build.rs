// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use smol_str::SmolStr;

use crate::model::{
    Alternative, Atom, ElementKind, GrammarIssue, GrammarModel, GrammarPair, LexerGrammar, Rule,
    TokenDef, TokenPattern, TokenType,
};

use super::parse::{ParsedGrammar, ParsedLexerRule, ParsedParserRule};

/// Validates the parsed declarations and materializes the grammar pair.
///
/// Best-effort: all findable problems are reported in one pass. The caller
/// rejects the pair when any blocking issue was collected.
pub(super) fn build(
    parsed: ParsedGrammar,
    file_name: &str,
    issues: &mut Vec<GrammarIssue>,
) -> Option<GrammarPair> {
    check_name_matches_file(&parsed, file_name, issues);

    let parser_rules = dedup_parser_rules(parsed.parser_rules, issues);
    let lexer_rules = dedup_lexer_rules(parsed.lexer_rules, issues);

    if parser_rules.is_empty() {
        issues.push(GrammarIssue::error("grammar has no parser rules", None));
        return None;
    }

    let keyword_literals = single_literal_names(&lexer_rules);
    let implicit_literals = collect_implicit_literals(&parser_rules, &keyword_literals);

    let mut defs = Vec::new();
    for literal in &implicit_literals {
        let ty = TokenType::new(defs.len() as u32);
        defs.push(TokenDef::implicit_literal(ty, literal.clone()));
    }
    for rule in &lexer_rules {
        let ty = TokenType::new(defs.len() as u32);
        defs.push(TokenDef::named(
            ty,
            rule.name.clone(),
            rule.pattern.clone(),
            rule.channel,
            rule.skip,
            rule.fragment,
        ));
    }
    let lexer = LexerGrammar::new(defs);

    validate_parser_references(&parser_rules, &lexer, issues);
    validate_lexer_references(&lexer_rules, issues);
    warn_unused_fragments(&lexer_rules, issues);

    let rules = parser_rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| Rule::new(index, rule.name, rule.alternatives))
        .collect();
    let name = parsed.name.unwrap_or_else(|| SmolStr::from("unnamed"));
    Some(GrammarPair::new(GrammarModel::new(name, rules), lexer))
}

fn check_name_matches_file(
    parsed: &ParsedGrammar,
    file_name: &str,
    issues: &mut Vec<GrammarIssue>,
) {
    let Some(name) = &parsed.name else {
        return;
    };
    let stem = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .strip_suffix(".g4")
        .unwrap_or(file_name);
    if !stem.is_empty() && stem != name.as_str() {
        issues.push(GrammarIssue::warning(
            format!("grammar name '{name}' does not match file name '{file_name}'"),
            None,
        ));
    }
}

fn dedup_parser_rules(
    rules: Vec<ParsedParserRule>,
    issues: &mut Vec<GrammarIssue>,
) -> Vec<ParsedParserRule> {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::new();
    for rule in rules {
        if seen.insert(rule.name.clone()) {
            kept.push(rule);
        } else {
            issues.push(GrammarIssue::error(
                format!("duplicate rule '{}'", rule.name),
                Some(rule.name_span),
            ));
        }
    }
    kept
}

fn dedup_lexer_rules(
    rules: Vec<ParsedLexerRule>,
    issues: &mut Vec<GrammarIssue>,
) -> Vec<ParsedLexerRule> {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::new();
    for rule in rules {
        if seen.insert(rule.name.clone()) {
            kept.push(rule);
        } else {
            issues.push(GrammarIssue::error(
                format!("duplicate lexer rule '{}'", rule.name),
                Some(rule.name_span),
            ));
        }
    }
    kept
}

/// Literal text of every non-fragment lexer rule whose whole pattern is one
/// literal (declared keyword tokens). Parser literals matching these do not
/// get an implicit definition.
fn single_literal_names(rules: &[ParsedLexerRule]) -> BTreeSet<SmolStr> {
    let mut literals = BTreeSet::new();
    for rule in rules {
        if rule.fragment {
            continue;
        }
        let alts = rule.pattern.alts();
        if alts.len() == 1 && alts[0].len() == 1 {
            if let (Atom::Literal(text), crate::model::Suffix::One) =
                (alts[0][0].atom(), alts[0][0].suffix())
            {
                literals.insert(text.clone());
            }
        }
    }
    literals
}

/// First-appearance order across all parser rules, groups included.
fn collect_implicit_literals(
    rules: &[ParsedParserRule],
    keyword_literals: &BTreeSet<SmolStr>,
) -> Vec<SmolStr> {
    let mut ordered = Vec::new();
    let mut seen = BTreeSet::new();
    for rule in rules {
        collect_literals_in_alts(&rule.alternatives, keyword_literals, &mut ordered, &mut seen);
    }
    ordered
}

fn collect_literals_in_alts(
    alternatives: &[Alternative],
    keyword_literals: &BTreeSet<SmolStr>,
    ordered: &mut Vec<SmolStr>,
    seen: &mut BTreeSet<SmolStr>,
) {
    for alternative in alternatives {
        for element in alternative.elements() {
            match element.kind() {
                ElementKind::Literal(text) => {
                    if !keyword_literals.contains(text) && seen.insert(text.clone()) {
                        ordered.push(text.clone());
                    }
                }
                ElementKind::Group(inner) => {
                    collect_literals_in_alts(inner, keyword_literals, ordered, seen);
                }
                _ => {}
            }
        }
    }
}

fn validate_parser_references(
    rules: &[ParsedParserRule],
    lexer: &LexerGrammar,
    issues: &mut Vec<GrammarIssue>,
) {
    let rule_names: BTreeSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    for rule in rules {
        validate_refs_in_alts(&rule.alternatives, rule, &rule_names, lexer, issues);
    }
}

fn validate_refs_in_alts(
    alternatives: &[Alternative],
    rule: &ParsedParserRule,
    rule_names: &BTreeSet<&str>,
    lexer: &LexerGrammar,
    issues: &mut Vec<GrammarIssue>,
) {
    for alternative in alternatives {
        for element in alternative.elements() {
            match element.kind() {
                ElementKind::RuleRef(name) => {
                    if !rule_names.contains(name.as_str()) {
                        issues.push(GrammarIssue::error(
                            format!("rule '{}' references undefined rule '{name}'", rule.name),
                            Some(rule.name_span),
                        ));
                    }
                }
                ElementKind::TokenRef(name) => match lexer.def_by_name(name) {
                    None => issues.push(GrammarIssue::error(
                        format!("rule '{}' references undefined token '{name}'", rule.name),
                        Some(rule.name_span),
                    )),
                    Some(def) if def.is_fragment() => issues.push(GrammarIssue::error(
                        format!(
                            "rule '{}' references fragment '{name}'; fragments never produce tokens",
                            rule.name
                        ),
                        Some(rule.name_span),
                    )),
                    Some(_) => {}
                },
                ElementKind::Group(inner) => {
                    validate_refs_in_alts(inner, rule, rule_names, lexer, issues);
                }
                _ => {}
            }
        }
    }
}

fn validate_lexer_references(rules: &[ParsedLexerRule], issues: &mut Vec<GrammarIssue>) {
    let names: BTreeSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
    for rule in rules {
        validate_refs_in_pattern(&rule.pattern, rule, &names, issues);
    }
}

fn validate_refs_in_pattern(
    pattern: &TokenPattern,
    rule: &ParsedLexerRule,
    names: &BTreeSet<&str>,
    issues: &mut Vec<GrammarIssue>,
) {
    for sequence in pattern.alts() {
        for element in sequence {
            match element.atom() {
                Atom::Ref(name) => {
                    if !names.contains(name.as_str()) {
                        issues.push(GrammarIssue::error(
                            format!(
                                "lexer rule '{}' references undefined rule '{name}'",
                                rule.name
                            ),
                            Some(rule.name_span),
                        ));
                    }
                }
                Atom::Group(inner) => validate_refs_in_pattern(inner, rule, names, issues),
                _ => {}
            }
        }
    }
}

// A fragment is only reachable from other lexer rules, so references from
// parser rules do not count.
fn warn_unused_fragments(lexer_rules: &[ParsedLexerRule], issues: &mut Vec<GrammarIssue>) {
    let mut referenced = BTreeSet::new();
    for rule in lexer_rules {
        collect_pattern_refs(&rule.pattern, &mut referenced);
    }
    for rule in lexer_rules {
        if rule.fragment && !referenced.contains(&rule.name) {
            issues.push(GrammarIssue::warning(
                format!("fragment '{}' is never used", rule.name),
                Some(rule.name_span),
            ));
        }
    }
}

fn collect_pattern_refs(pattern: &TokenPattern, out: &mut BTreeSet<SmolStr>) {
    for sequence in pattern.alts() {
        for element in sequence {
            match element.atom() {
                Atom::Ref(name) => {
                    out.insert(name.clone());
                }
                Atom::Group(inner) => collect_pattern_refs(inner, out),
                _ => {}
            }
        }
    }
}

