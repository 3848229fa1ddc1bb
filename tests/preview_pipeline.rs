// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end pipeline checks: grammar text in, rendered tree out.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use galatea::event::EventBus;
use galatea::interp::InterpretOptions;
use galatea::layout::{default_extent, layout_tree, LayoutConfig};
use galatea::model::{Channel, GrammarKey, InputSource, Span};
use galatea::query::{node_covering_offset, token_span_of_node};
use galatea::registry::SessionRegistry;
use galatea::render::render_layout_unicode;
use galatea::reparse::ReparseScheduler;
use galatea::store::{JsonFileSettings, MemorySettings};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!(
            "galatea-{prefix}-{}-{nanos}-{counter}",
            std::process::id()
        ));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("preview_pipeline")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"))
}

fn scheduler(bus: &Arc<EventBus>) -> ReparseScheduler {
    ReparseScheduler::new(
        Duration::from_millis(1),
        InterpretOptions::default(),
        bus.clone(),
        |_, _| {},
    )
}

#[test]
fn expr_grammar_parses_lays_out_and_renders() {
    let bus = Arc::new(EventBus::new());
    let registry = SessionRegistry::new(Arc::new(MemorySettings::new()));
    let scheduler = scheduler(&bus);

    let key = GrammarKey::new("Expr").unwrap();
    let session = registry.get_or_create(&key);
    session.apply_grammar_source(&read_fixture("Expr.g4"));
    session.set_start_rule(Some("expr".into()));
    session.set_input(InputSource::Manual("1+2*3".to_owned()));

    scheduler.notify_changed(&session);
    scheduler.flush();

    let snapshot = session.snapshot();
    let pair = snapshot.pair().expect("compiled pair").clone();
    let outcome = snapshot.outcome().expect("parse outcome").clone();
    assert!(outcome.is_clean());
    assert_eq!(outcome.root().span(), Span::new(0, 5));

    let layout = layout_tree(outcome.root(), &pair, &LayoutConfig::default(), default_extent);
    let render = render_layout_unicode(&layout, None).expect("render");
    assert!(!render.text.trim().is_empty());
    assert_eq!(render.highlight_index.len(), layout.len());

    // Offset 2 sits on the '2' literal; its covering node maps back to a
    // span that contains the offset.
    let path = node_covering_offset(outcome.root(), 2).expect("covering node");
    let span = token_span_of_node(outcome.root(), &path).expect("token span");
    assert!(span.contains(2));
}

#[test]
fn a_burst_of_edits_settles_on_the_last_input() {
    let bus = Arc::new(EventBus::new());
    let registry = SessionRegistry::new(Arc::new(MemorySettings::new()));
    let scheduler = scheduler(&bus);

    let key = GrammarKey::new("Expr").unwrap();
    let session = registry.get_or_create(&key);
    session.apply_grammar_source(&read_fixture("Expr.g4"));
    session.set_start_rule(Some("expr".into()));

    for text in ["1", "1+", "1+2"] {
        session.set_input(InputSource::Manual(text.to_owned()));
        scheduler.notify_changed(&session);
    }
    scheduler.flush();

    let snapshot = session.snapshot();
    let outcome = snapshot.outcome().expect("parse outcome");
    assert!(outcome.is_clean());
    assert_eq!(outcome.root().span(), Span::new(0, 3));
}

#[test]
fn recognition_errors_still_produce_a_renderable_tree() {
    let bus = Arc::new(EventBus::new());
    let registry = SessionRegistry::new(Arc::new(MemorySettings::new()));
    let scheduler = scheduler(&bus);

    let key = GrammarKey::new("Expr").unwrap();
    let session = registry.get_or_create(&key);
    session.apply_grammar_source(&read_fixture("Expr.g4"));
    session.set_start_rule(Some("expr".into()));
    session.set_input(InputSource::Manual("1+*".to_owned()));

    scheduler.notify_changed(&session);
    scheduler.flush();

    let snapshot = session.snapshot();
    let pair = snapshot.pair().expect("compiled pair").clone();
    let outcome = snapshot.outcome().expect("parse outcome").clone();
    assert!(!outcome.is_clean());
    assert!(!outcome.errors().is_empty());

    let layout = layout_tree(outcome.root(), &pair, &LayoutConfig::default(), default_extent);
    let render = render_layout_unicode(&layout, None).expect("render");
    assert!(!render.text.trim().is_empty());
}

#[test]
fn hidden_channel_tokens_stay_out_of_the_parse() {
    let bus = Arc::new(EventBus::new());
    let registry = SessionRegistry::new(Arc::new(MemorySettings::new()));
    let scheduler = scheduler(&bus);

    let key = GrammarKey::new("List").unwrap();
    let session = registry.get_or_create(&key);
    session.apply_grammar_source(&read_fixture("List.g4"));
    session.set_start_rule(Some("list".into()));
    session.set_input(InputSource::Manual("ab,cd #trailing note".to_owned()));

    scheduler.notify_changed(&session);
    scheduler.flush();

    let snapshot = session.snapshot();
    let outcome = snapshot.outcome().expect("parse outcome");
    assert!(outcome.is_clean());
    assert!(outcome
        .tokens()
        .iter()
        .any(|token| token.channel() == Channel::Hidden));
}

#[test]
fn an_invalid_grammar_reports_issues_and_no_outcome() {
    let bus = Arc::new(EventBus::new());
    let registry = SessionRegistry::new(Arc::new(MemorySettings::new()));
    let scheduler = scheduler(&bus);

    let key = GrammarKey::new("Broken").unwrap();
    let session = registry.get_or_create(&key);
    session.apply_grammar_source("grammar Broken;\n\nr: 'a'\n");
    session.set_start_rule(Some("r".into()));
    session.set_input(InputSource::Manual("a".to_owned()));

    scheduler.notify_changed(&session);
    scheduler.flush();

    let snapshot = session.snapshot();
    assert!(snapshot.pair().is_none());
    assert!(!snapshot.issues().is_empty());
    assert!(snapshot.outcome().is_none());
}

#[test]
fn settings_survive_a_registry_restart() {
    let tmp = TempDir::new("pipeline");
    let settings_path = tmp.path().join("settings.json");
    let key = GrammarKey::new("Expr").unwrap();

    {
        let registry = SessionRegistry::new(Arc::new(
            JsonFileSettings::open(&settings_path).expect("open settings"),
        ));
        let session = registry.get_or_create(&key);
        session.apply_grammar_source(&read_fixture("Expr.g4"));
        session.set_start_rule(Some("expr".into()));
        session.set_input(InputSource::Manual("4*5".to_owned()));
        registry.remove(&key).expect("persist on remove");
    }

    let registry = SessionRegistry::new(Arc::new(
        JsonFileSettings::open(&settings_path).expect("reopen settings"),
    ));
    let session = registry.get_or_create(&key);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.input().text(), "4*5");
    assert_eq!(snapshot.start_rule(), Some("expr"));
}
