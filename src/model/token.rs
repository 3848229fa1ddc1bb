// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use smol_str::SmolStr;

use super::span::Span;

/// Index into the lexer grammar's token definition table.
///
/// `TokenType::EOF` is a reserved sentinel that never collides with a
/// definition index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenType(u32);

impl TokenType {
    pub const EOF: TokenType = TokenType(u32::MAX);

    pub fn new(index: u32) -> Self {
        debug_assert!(index != u32::MAX, "u32::MAX is reserved for EOF");
        Self(index)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn is_eof(&self) -> bool {
        *self == Self::EOF
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            f.write_str("EOF")
        } else {
            let mut buf = itoa::Buffer::new();
            f.write_str(buf.format(self.0))
        }
    }
}

/// Token channel. The parser consumes the default channel only; hidden
/// tokens stay in the outcome's sequence for the token pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Default,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    ty: TokenType,
    channel: Channel,
    text: SmolStr,
    span: Span,
}

impl Token {
    pub fn new(ty: TokenType, channel: Channel, text: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            ty,
            channel,
            text: text.into(),
            span,
        }
    }

    /// The end-of-input sentinel: empty span at `at`, default channel.
    pub fn eof(at: usize) -> Self {
        Self {
            ty: TokenType::EOF,
            channel: Channel::Default,
            text: SmolStr::default(),
            span: Span::empty(at),
        }
    }

    pub fn ty(&self) -> TokenType {
        self.ty
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_eof(&self) -> bool {
        self.ty.is_eof()
    }
}
