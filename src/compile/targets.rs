// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// A code-generation target a grammar may declare.
///
/// Grammars carry target-specific actions and options; the preview ignores
/// those, but callers can ask up front whether a declared target is one the
/// interpreter handles. The table is a plain enumeration queried by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    name: &'static str,
    supported: bool,
}

impl Target {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }
}

const TARGETS: &[Target] = &[
    Target {
        name: "Java",
        supported: true,
    },
    Target {
        name: "JavaScript",
        supported: true,
    },
    Target {
        name: "TypeScript",
        supported: true,
    },
    Target {
        name: "Python3",
        supported: true,
    },
    Target {
        name: "Go",
        supported: true,
    },
    Target {
        name: "CSharp",
        supported: true,
    },
    Target {
        name: "Cpp",
        supported: true,
    },
    Target {
        name: "Swift",
        supported: false,
    },
    Target {
        name: "PHP",
        supported: false,
    },
    Target {
        name: "Dart",
        supported: false,
    },
];

pub fn targets() -> &'static [Target] {
    TARGETS
}

pub fn target(name: &str) -> Option<&'static Target> {
    TARGETS.iter().find(|t| t.name == name)
}
