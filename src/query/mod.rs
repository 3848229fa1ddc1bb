// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries over parse outcomes.
//!
//! These power selection sync between the sample input and the tree: offset
//! to node, node to source span, offset to token. All of them are pure and
//! recomputed against whatever outcome the caller holds.

use crate::model::{NodePath, Span, Token, TreeNode};

/// Deepest node covering `offset`, as a path from `root`.
///
/// Terminals win over their enclosing rule. Returns `None` when the offset
/// falls outside the root span or in a gap between children, which is where
/// skipped tokens live; those never materialize into the tree. Overlapping
/// recovery spans resolve to the first covering child in document order.
pub fn node_covering_offset(root: &TreeNode, offset: usize) -> Option<NodePath> {
    if !root.span().contains(offset) {
        return None;
    }

    let mut path = NodePath::root();
    let mut node = root;
    loop {
        let next = node
            .children()
            .iter()
            .enumerate()
            .find(|(_, child)| child.span().contains(offset));
        match next {
            Some((idx, child)) => {
                path = path.child(idx as u32);
                node = child;
            }
            None => {
                if node.children().is_empty() {
                    return Some(path);
                }
                return None;
            }
        }
    }
}

/// Half-open source span of the node at `path`, derived from its leftmost
/// and rightmost leaf descendants. `None` when the path does not resolve.
pub fn token_span_of_node(root: &TreeNode, path: &NodePath) -> Option<Span> {
    let node = root.node_at_path(path)?;
    match (leftmost_leaf(node), rightmost_leaf(node)) {
        (Some(first), Some(last)) => Some(Span::new(first.span().start(), last.span().end())),
        _ => Some(node.span()),
    }
}

/// Index of the token whose span contains `offset`, hidden tokens included.
///
/// Binary search over the span-ordered token sequence; the zero-width EOF
/// sentinel never matches.
pub fn token_at_offset(tokens: &[Token], offset: usize) -> Option<usize> {
    let idx = tokens.partition_point(|t| t.span().end() <= offset);
    let token = tokens.get(idx)?;
    token.span().contains(offset).then_some(idx)
}

fn leftmost_leaf(node: &TreeNode) -> Option<&TreeNode> {
    match node.children().first() {
        None => Some(node),
        Some(_) => node.children().iter().find_map(leftmost_leaf),
    }
}

fn rightmost_leaf(node: &TreeNode) -> Option<&TreeNode> {
    match node.children().last() {
        None => Some(node),
        Some(_) => node.children().iter().rev().find_map(rightmost_leaf),
    }
}

#[cfg(test)]
mod tests {
    use super::{node_covering_offset, token_at_offset, token_span_of_node};
    use crate::interp::{interpret, CancelToken, InterpretOptions};
    use crate::model::fixtures::expr_pair;
    use crate::model::{NodePath, ParseOutcome, Span};

    fn outcome(input: &str) -> ParseOutcome {
        interpret(
            &expr_pair(),
            "expr",
            input,
            &CancelToken::new(),
            &InterpretOptions::default(),
        )
        .expect("interpretation succeeds")
    }

    #[test]
    fn offsets_resolve_to_the_covering_terminal() {
        let outcome = outcome("1+2*3");
        let path = node_covering_offset(outcome.root(), 0).unwrap();
        assert_eq!(path.indices(), &[0, 0]);

        let star = node_covering_offset(outcome.root(), 3).unwrap();
        assert_eq!(star.indices(), &[2, 1]);
    }

    #[test]
    fn offsets_in_skipped_regions_resolve_to_nothing() {
        let outcome = outcome("1 + 2");
        assert!(node_covering_offset(outcome.root(), 1).is_none());
        assert!(node_covering_offset(outcome.root(), 5).is_none());
    }

    #[test]
    fn node_spans_come_from_the_leaf_fringe() {
        let outcome = outcome("1+2*3");
        let root_span = token_span_of_node(outcome.root(), &NodePath::root()).unwrap();
        assert_eq!(root_span, Span::new(0, 5));

        let mul = token_span_of_node(outcome.root(), &NodePath::from_indices([2])).unwrap();
        assert_eq!(mul, Span::new(2, 5));

        assert!(token_span_of_node(outcome.root(), &NodePath::from_indices([9])).is_none());
    }

    #[test]
    fn token_lookup_sees_hidden_tokens() {
        let outcome = outcome("1 + 2");
        let tokens = outcome.tokens();

        assert_eq!(token_at_offset(tokens, 0), Some(0));
        assert_eq!(token_at_offset(tokens, 1), Some(1));
        assert_eq!(token_at_offset(tokens, 2), Some(2));
        assert_eq!(token_at_offset(tokens, 4), Some(4));
        assert_eq!(token_at_offset(tokens, 5), None);
    }
}
