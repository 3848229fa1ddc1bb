// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Debounced background reparsing.
//!
//! One worker thread drains a pending map keyed by grammar key. Repeated
//! edits within the debounce window replace the pending entry, so a typing
//! burst costs one interpretation. A run that is superseded mid-flight has
//! its cancel token tripped and its result is dropped; outcomes only reach
//! the session through the generation-gated commit, so a stale tree is
//! never displayed. The scheduler is owned by whoever drives the preview;
//! there is no process-wide instance.

use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::event::{EventBus, PreviewEvent};
use crate::interp::{interpret, CancelToken, InterpretError, InterpretOptions};
use crate::model::{GrammarIssue, GrammarKey, ParseOutcome, SessionSnapshot};
use crate::registry::GrammarSession;

/// What one reparse pass resolved the session to.
#[derive(Debug, Clone)]
pub enum PreviewUpdate {
    /// The grammar did not compile; nothing to interpret.
    GrammarInvalid(Vec<GrammarIssue>),
    /// No start rule is set, or the configured one no longer exists.
    NoStartRule,
    Outcome(Arc<ParseOutcome>),
}

/// Per-session scheduler state, exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparsePhase {
    Idle,
    Scheduled,
    Running,
    /// A run is still winding down after being superseded.
    Cancelled,
}

type UpdateFn = dyn Fn(&GrammarKey, &PreviewUpdate) + Send + Sync;

#[derive(Debug)]
struct PendingRun {
    session: Arc<GrammarSession>,
    generation: u64,
    due: Instant,
}

#[derive(Debug)]
struct RunningJob {
    key: GrammarKey,
    generation: u64,
    cancel: CancelToken,
}

#[derive(Debug, Default)]
struct SchedulerState {
    pending: BTreeMap<GrammarKey, PendingRun>,
    running: Option<RunningJob>,
    shutdown: bool,
}

struct Inner {
    state: Mutex<SchedulerState>,
    cv: Condvar,
    debounce: Duration,
    options: InterpretOptions,
    bus: Arc<EventBus>,
    on_update: Box<UpdateFn>,
}

/// Debounce-coalescing reparse worker.
pub struct ReparseScheduler {
    inner: Arc<Inner>,
    worker: Option<JoinHandle<()>>,
}

impl ReparseScheduler {
    pub fn new(
        debounce: Duration,
        options: InterpretOptions,
        bus: Arc<EventBus>,
        on_update: impl Fn(&GrammarKey, &PreviewUpdate) + Send + Sync + 'static,
    ) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(SchedulerState::default()),
            cv: Condvar::new(),
            debounce,
            options,
            bus,
            on_update: Box::new(on_update),
        });

        let worker = std::thread::Builder::new()
            .name("galatea-reparse".to_owned())
            .spawn({
                let inner = inner.clone();
                move || run_worker(&inner)
            })
            .expect("spawn reparse worker thread");

        Self {
            inner,
            worker: Some(worker),
        }
    }

    /// Records an edit on `session`. Replaces any pending entry for the same
    /// key with a fresh debounce deadline and trips the cancel token of an
    /// in-flight run the edit has outdated.
    pub fn notify_changed(&self, session: &Arc<GrammarSession>) {
        let generation = session.snapshot().generation();
        let mut state = self.inner.state.lock().expect("reparse lock poisoned");
        if state.shutdown {
            return;
        }
        if let Some(running) = state.running.as_ref() {
            if running.key == *session.key() && running.generation < generation {
                running.cancel.cancel();
            }
        }
        state.pending.insert(
            session.key().clone(),
            PendingRun {
                session: session.clone(),
                generation,
                due: Instant::now() + self.inner.debounce,
            },
        );
        self.inner.cv.notify_all();
    }

    pub fn phase(&self, key: &GrammarKey) -> ReparsePhase {
        let state = self.inner.state.lock().expect("reparse lock poisoned");
        if let Some(running) = state.running.as_ref() {
            if running.key == *key {
                return if running.cancel.is_cancelled() {
                    ReparsePhase::Cancelled
                } else {
                    ReparsePhase::Running
                };
            }
        }
        if state.pending.contains_key(key) {
            ReparsePhase::Scheduled
        } else {
            ReparsePhase::Idle
        }
    }

    /// Blocks until every pending entry has been dispatched and no run is in
    /// flight.
    pub fn flush(&self) {
        let mut state = self.inner.state.lock().expect("reparse lock poisoned");
        while !state.shutdown && (!state.pending.is_empty() || state.running.is_some()) {
            state = self.inner.cv.wait(state).expect("reparse cv poisoned");
        }
    }

    /// Stops the worker and joins it. Pending entries are dropped; an
    /// in-flight run is cancelled. Idempotent.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.inner.state.lock().expect("reparse lock poisoned");
            state.shutdown = true;
            state.pending.clear();
            if let Some(running) = state.running.as_ref() {
                running.cancel.cancel();
            }
            self.inner.cv.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ReparseScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(inner: &Arc<Inner>) {
    while let Some((session, cancel)) = next_job(inner) {
        let snapshot = session.snapshot();
        {
            let mut state = inner.state.lock().expect("reparse lock poisoned");
            if let Some(running) = state.running.as_mut() {
                running.generation = snapshot.generation();
            }
        }

        if let Some(update) = resolve(&snapshot, &cancel, &inner.options) {
            let committed = match &update {
                PreviewUpdate::Outcome(outcome) => {
                    session.commit_outcome(snapshot.generation(), outcome.clone())
                }
                PreviewUpdate::GrammarInvalid(_) | PreviewUpdate::NoStartRule => true,
            };
            if committed {
                (inner.on_update)(snapshot.key(), &update);
                inner.bus.publish(PreviewEvent::PreviewUpdated {
                    key: snapshot.key().clone(),
                    generation: snapshot.generation(),
                });
            }
        }

        let mut state = inner.state.lock().expect("reparse lock poisoned");
        state.running = None;
        inner.cv.notify_all();
    }
}

/// Waits for the earliest due pending entry and claims it, or returns `None`
/// on shutdown. Entries come due in edit order.
fn next_job(inner: &Inner) -> Option<(Arc<GrammarSession>, CancelToken)> {
    let mut state = inner.state.lock().expect("reparse lock poisoned");
    loop {
        if state.shutdown {
            return None;
        }

        let now = Instant::now();
        let due_key = state
            .pending
            .iter()
            .filter(|(_, entry)| entry.due <= now)
            .min_by_key(|(_, entry)| entry.due)
            .map(|(key, _)| key.clone());

        if let Some(key) = due_key {
            if let Some(entry) = state.pending.remove(&key) {
                let cancel = CancelToken::new();
                state.running = Some(RunningJob {
                    key,
                    generation: entry.generation,
                    cancel: cancel.clone(),
                });
                return Some((entry.session, cancel));
            }
            continue;
        }

        state = match state.pending.values().map(|entry| entry.due).min() {
            Some(due) => {
                let timeout = due.saturating_duration_since(now);
                inner
                    .cv
                    .wait_timeout(state, timeout)
                    .expect("reparse cv poisoned")
                    .0
            }
            None => inner.cv.wait(state).expect("reparse cv poisoned"),
        };
    }
}

/// Resolves a snapshot to at most one update. A cancelled run resolves to
/// nothing; the superseding edit already has its own pending entry.
fn resolve(
    snapshot: &SessionSnapshot,
    cancel: &CancelToken,
    options: &InterpretOptions,
) -> Option<PreviewUpdate> {
    let Some(pair) = snapshot.pair() else {
        return Some(PreviewUpdate::GrammarInvalid(snapshot.issues().to_vec()));
    };
    let Some(rule) = snapshot.start_rule() else {
        return Some(PreviewUpdate::NoStartRule);
    };
    match interpret(pair, rule, snapshot.input().text(), cancel, options) {
        Ok(outcome) => Some(PreviewUpdate::Outcome(Arc::new(outcome))),
        Err(InterpretError::NoStartRule { .. }) => Some(PreviewUpdate::NoStartRule),
        Err(InterpretError::Cancelled) => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{PreviewUpdate, ReparsePhase, ReparseScheduler};
    use crate::event::{EventBus, PreviewEvent};
    use crate::interp::InterpretOptions;
    use crate::model::fixtures::TINY_GRAMMAR_SRC;
    use crate::model::{GrammarKey, InputSource};
    use crate::registry::{GrammarSession, SessionRegistry};
    use crate::store::MemorySettings;

    struct Harness {
        scheduler: ReparseScheduler,
        bus: Arc<EventBus>,
        updates: Arc<Mutex<Vec<PreviewUpdate>>>,
        _registry: SessionRegistry,
        session: Arc<GrammarSession>,
    }

    fn harness(debounce_ms: u64) -> Harness {
        let bus = Arc::new(EventBus::new());
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let scheduler = ReparseScheduler::new(
            Duration::from_millis(debounce_ms),
            InterpretOptions::default(),
            bus.clone(),
            move |_key, update| sink.lock().unwrap().push(update.clone()),
        );
        let registry = SessionRegistry::new(Arc::new(MemorySettings::new()));
        let session = registry.get_or_create(&GrammarKey::new("G").unwrap());
        Harness {
            scheduler,
            bus,
            updates,
            _registry: registry,
            session,
        }
    }

    fn ready_session(h: &Harness) {
        h.session.apply_grammar_source(TINY_GRAMMAR_SRC);
        h.session.set_start_rule(Some("r".into()));
        h.session.set_input(InputSource::Manual("ab".to_owned()));
    }

    #[test]
    fn a_burst_of_edits_dispatches_once() {
        let h = harness(30);
        ready_session(&h);

        for _ in 0..3 {
            h.scheduler.notify_changed(&h.session);
        }
        h.scheduler.flush();

        let updates = h.updates.lock().unwrap();
        assert_eq!(updates.len(), 1, "updates: {updates:?}");
        assert!(matches!(updates[0], PreviewUpdate::Outcome(_)));

        let outcome = h.session.snapshot().outcome().cloned();
        assert!(outcome.is_some_and(|o| o.is_clean()));
    }

    #[test]
    fn invalid_grammar_resolves_to_its_issues() {
        let h = harness(5);
        h.session.apply_grammar_source("not a grammar");
        h.scheduler.notify_changed(&h.session);
        h.scheduler.flush();

        let updates = h.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            PreviewUpdate::GrammarInvalid(issues) => assert!(!issues.is_empty()),
            other => panic!("expected GrammarInvalid, got {other:?}"),
        }
        assert!(h.session.snapshot().outcome().is_none());
    }

    #[test]
    fn unset_start_rule_resolves_to_no_start_rule() {
        let h = harness(5);
        h.session.apply_grammar_source(TINY_GRAMMAR_SRC);
        h.scheduler.notify_changed(&h.session);
        h.scheduler.flush();

        let updates = h.updates.lock().unwrap();
        assert!(matches!(updates[0], PreviewUpdate::NoStartRule));
    }

    #[test]
    fn vanished_start_rule_resolves_to_no_start_rule() {
        let h = harness(5);
        ready_session(&h);
        h.session.set_start_rule(Some("nope".into()));
        h.scheduler.notify_changed(&h.session);
        h.scheduler.flush();

        let updates = h.updates.lock().unwrap();
        assert!(matches!(updates[0], PreviewUpdate::NoStartRule));
        assert!(h.session.snapshot().outcome().is_none());
    }

    #[test]
    fn phase_settles_back_to_idle() {
        let h = harness(5);
        let key = GrammarKey::new("G").unwrap();
        assert_eq!(h.scheduler.phase(&key), ReparsePhase::Idle);

        ready_session(&h);
        h.scheduler.notify_changed(&h.session);
        h.scheduler.flush();
        assert_eq!(h.scheduler.phase(&key), ReparsePhase::Idle);
    }

    #[test]
    fn committed_updates_are_published_on_the_bus() {
        let h = harness(5);
        let rx = h.bus.subscribe();
        ready_session(&h);
        h.scheduler.notify_changed(&h.session);
        h.scheduler.flush();

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match event {
            PreviewEvent::PreviewUpdated { key, generation } => {
                assert_eq!(key, GrammarKey::new("G").unwrap());
                assert_eq!(generation, h.session.snapshot().generation());
            }
            other => panic!("expected PreviewUpdated, got {other:?}"),
        }
    }

    #[test]
    fn shutdown_ignores_later_notifications() {
        let mut h = harness(5);
        ready_session(&h);
        h.scheduler.shutdown();
        h.scheduler.notify_changed(&h.session);
        h.scheduler.flush();
        assert!(h.updates.lock().unwrap().is_empty());
    }
}
