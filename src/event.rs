// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Explicit event channel between the preview core and its consumers.
//!
//! Publishers push [`PreviewEvent`]s through an [`EventBus`]; consumers
//! subscribe and drain a plain mpsc receiver at their own pace. A receiver
//! that was dropped is pruned on the next publish.

use std::sync::mpsc;
use std::sync::Mutex;

use crate::model::{GrammarKey, NodePath};

/// Which side initiated a selection change. The other side follows and must
/// not echo the change back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    Source,
    Tree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewEvent {
    /// A new preview update was committed for the session.
    PreviewUpdated { key: GrammarKey, generation: u64 },
    SelectionChanged {
        origin: SelectionOrigin,
        path: Option<NodePath>,
    },
    HoverChanged { path: Option<NodePath> },
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::Sender<PreviewEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<PreviewEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .push(tx);
        rx
    }

    /// Delivers `event` to every live subscriber, dropping the ones whose
    /// receiver has gone away.
    pub fn publish(&self, event: PreviewEvent) {
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .len()
    }
}
