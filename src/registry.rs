// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Session registry: at most one live session per grammar key.
//!
//! A session owns the current [`SessionSnapshot`] behind a mutex and hands
//! out `Arc` clones of it. Mutations swap in a new snapshot; readers keep
//! whatever snapshot they already hold. Removing a session writes its start
//! rule and manual sample input through the settings store so the next
//! session under the same key starts where the previous one left off.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use smol_str::SmolStr;

use crate::compile::compile_grammar;
use crate::model::{GrammarKey, InputSource, ParseOutcome, SessionSnapshot};
use crate::store::{input_key, start_rule_key, SettingsStore, StoreError};

/// Live state of one grammar preview session.
///
/// All methods take `&self`; the snapshot mutex serializes writers while
/// readers only ever see a complete snapshot.
#[derive(Debug)]
pub struct GrammarSession {
    key: GrammarKey,
    snapshot: Mutex<Arc<SessionSnapshot>>,
}

impl GrammarSession {
    fn new(snapshot: SessionSnapshot) -> Self {
        Self {
            key: snapshot.key().clone(),
            snapshot: Mutex::new(Arc::new(snapshot)),
        }
    }

    pub fn key(&self) -> &GrammarKey {
        &self.key
    }

    /// The current snapshot. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot
            .lock()
            .expect("session lock poisoned")
            .clone()
    }

    /// Compiles `source` and installs the result, successful or not. A
    /// failed compile leaves the session without a grammar pair but with
    /// the collected issues; either way the generation moves forward and
    /// any previous outcome is dropped.
    pub fn apply_grammar_source(&self, source: &str) -> Arc<SessionSnapshot> {
        let file_name = format!("{}.g4", self.key);
        let (pair, issues) = match compile_grammar(source, &file_name) {
            Ok(compiled) => {
                let (pair, notes) = compiled.into_parts();
                (Some(Arc::new(pair)), notes)
            }
            Err(issues) => (None, issues),
        };
        self.swap(|current| current.with_grammar(source, pair, issues))
    }

    pub fn set_start_rule(&self, start_rule: Option<SmolStr>) -> Arc<SessionSnapshot> {
        self.swap(|current| current.with_start_rule(start_rule))
    }

    pub fn set_input(&self, input: InputSource) -> Arc<SessionSnapshot> {
        self.swap(|current| current.with_input(input))
    }

    /// Installs an outcome produced for `generation`. Returns `false` and
    /// drops the outcome when the session has moved on since.
    pub fn commit_outcome(&self, generation: u64, outcome: Arc<ParseOutcome>) -> bool {
        let mut guard = self.snapshot.lock().expect("session lock poisoned");
        if guard.generation() != generation {
            return false;
        }
        *guard = Arc::new(guard.with_outcome(outcome));
        true
    }

    fn swap(
        &self,
        next: impl FnOnce(&SessionSnapshot) -> SessionSnapshot,
    ) -> Arc<SessionSnapshot> {
        let mut guard = self.snapshot.lock().expect("session lock poisoned");
        *guard = Arc::new(next(&guard));
        guard.clone()
    }
}

/// Owner of all sessions, keyed by grammar key.
///
/// There is no process-wide instance; whoever drives the preview creates
/// one registry and passes it around.
pub struct SessionRegistry {
    store: Arc<dyn SettingsStore>,
    sessions: Mutex<BTreeMap<GrammarKey, Arc<GrammarSession>>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the session for `key`, creating and hydrating it from the
    /// settings store on first use. Idempotent; concurrent callers get the
    /// same session.
    pub fn get_or_create(&self, key: &GrammarKey) -> Arc<GrammarSession> {
        let mut sessions = self.sessions.lock().expect("registry lock poisoned");
        if let Some(session) = sessions.get(key) {
            return session.clone();
        }
        let session = Arc::new(GrammarSession::new(self.hydrate(key)));
        sessions.insert(key.clone(), session.clone());
        session
    }

    pub fn get(&self, key: &GrammarKey) -> Option<Arc<GrammarSession>> {
        self.sessions
            .lock()
            .expect("registry lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn keys(&self) -> Vec<GrammarKey> {
        self.sessions
            .lock()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Drops the session for `key` after persisting its start rule and
    /// manual sample input. Removing an unknown key is a no-op.
    pub fn remove(&self, key: &GrammarKey) -> Result<(), StoreError> {
        let removed = self
            .sessions
            .lock()
            .expect("registry lock poisoned")
            .remove(key);
        let Some(session) = removed else {
            return Ok(());
        };

        let snapshot = session.snapshot();
        let input = match snapshot.input() {
            InputSource::Manual(text) if !text.is_empty() => Some(text.as_str()),
            _ => None,
        };
        self.store.set_value(&input_key(key), input)?;
        self.store
            .set_value(&start_rule_key(key), snapshot.start_rule())?;
        Ok(())
    }

    fn hydrate(&self, key: &GrammarKey) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot::new(key.clone());
        if let Some(text) = self.store.get_value(&input_key(key)) {
            snapshot = snapshot.with_input(InputSource::Manual(text));
        }
        if let Some(rule) = self.store.get_value(&start_rule_key(key)) {
            snapshot = snapshot.with_start_rule(Some(SmolStr::from(rule)));
        }
        snapshot
    }
}
