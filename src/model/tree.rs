// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use smallvec::SmallVec;
use smol_str::SmolStr;

use super::span::Span;
use super::token::Token;

/// One node of a parse tree.
///
/// Every node's span is a contiguous sub-interval of its parent's span;
/// the interpreter enforces this at materialization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Rule(RuleNode),
    Terminal(TerminalNode),
    Error(ErrorNode),
}

impl TreeNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Rule(node) => node.span,
            Self::Terminal(node) => node.token.span(),
            Self::Error(node) => node.span,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::Rule(node) => &node.children,
            Self::Terminal(_) | Self::Error(_) => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Resolves a child-index path rooted at `self`.
    pub fn node_at_path(&self, path: &NodePath) -> Option<&TreeNode> {
        let mut node = self;
        for &idx in path.indices() {
            node = node.children().get(idx as usize)?;
        }
        Some(node)
    }

    /// Number of nodes in the subtree, `self` included.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(TreeNode::node_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    rule_index: usize,
    rule_name: SmolStr,
    alt_number: usize,
    alt_label: Option<SmolStr>,
    span: Span,
    children: Vec<TreeNode>,
}

impl RuleNode {
    pub fn new(
        rule_index: usize,
        rule_name: impl Into<SmolStr>,
        alt_number: usize,
        alt_label: Option<SmolStr>,
        span: Span,
        children: Vec<TreeNode>,
    ) -> Self {
        Self {
            rule_index,
            rule_name: rule_name.into(),
            alt_number,
            alt_label,
            span,
            children,
        }
    }

    pub fn rule_index(&self) -> usize {
        self.rule_index
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// 1-based number of the matched alternative. For a left-recursive rule
    /// this is the alternative of the outermost application.
    pub fn alt_number(&self) -> usize {
        self.alt_number
    }

    pub fn alt_label(&self) -> Option<&str> {
        self.alt_label.as_deref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalNode {
    token: Token,
}

impl TerminalNode {
    pub fn new(token: Token) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

/// Synthetic node covering input the parser could not fit into any rule,
/// or marking a missing element inserted during recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    token: Option<Token>,
    message: SmolStr,
    span: Span,
}

impl ErrorNode {
    pub fn new(token: Option<Token>, message: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            token,
            message: message.into(),
            span,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Stable address of a tree node: the child-index path from the root.
///
/// Paths are short in practice, so indices live inline. Addressing by path
/// instead of by reference lets layout, rendering and selection refer to
/// nodes without owning or borrowing the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath(SmallVec<[u32; 8]>);

impl NodePath {
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        Self(indices.into_iter().collect())
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of the `idx`-th child of this node.
    pub fn child(&self, idx: u32) -> Self {
        let mut next = self.0.clone();
        next.push(idx);
        Self(next)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        let mut up = self.0.clone();
        up.pop();
        Some(Self(up))
    }

    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = itoa::Buffer::new();
        f.write_str("/")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(buf.format(*idx))?;
        }
        Ok(())
    }
}
