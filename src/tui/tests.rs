// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use super::{draw, App, Focus, PreviewView};
use crate::event::EventBus;
use crate::interp::InterpretOptions;
use crate::model::fixtures::{EXPR_GRAMMAR_SRC, TINY_GRAMMAR_SRC};
use crate::model::{GrammarKey, InputSource, NodePath};
use crate::registry::SessionRegistry;
use crate::reparse::ReparseScheduler;
use crate::store::MemorySettings;

fn app_with(grammar: &str, start_rule: Option<&str>, input: &str) -> (App, SessionRegistry) {
    let bus = Arc::new(EventBus::new());
    let registry = SessionRegistry::new(Arc::new(MemorySettings::new()));
    let session = registry.get_or_create(&GrammarKey::new("T").unwrap());
    session.apply_grammar_source(grammar);
    session.set_start_rule(start_rule.map(Into::into));
    session.set_input(InputSource::Manual(input.to_owned()));
    let scheduler = ReparseScheduler::new(
        Duration::from_millis(1),
        InterpretOptions::default(),
        bus.clone(),
        |_, _| {},
    );
    (App::new(session, scheduler, bus), registry)
}

fn settle(app: &mut App) {
    app.scheduler.flush();
    app.drain_events();
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    app.drain_events();
}

#[test]
fn typing_reparses_and_updates_the_tree() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "");
    settle(&mut app);

    press(&mut app, KeyCode::Char('a'));
    press(&mut app, KeyCode::Char('b'));
    assert_eq!(app.input, "ab");

    settle(&mut app);
    let PreviewView::Tree { outcome, render, .. } = &app.view else {
        panic!("expected a rendered tree");
    };
    assert!(outcome.is_clean());
    assert!(render.text.contains("<EOF>"));
}

#[test]
fn cursor_moves_select_the_covering_node() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "ab");
    settle(&mut app);
    assert_eq!(app.focus, Focus::Input);

    press(&mut app, KeyCode::Right);
    assert_eq!(app.cursor, 1);
    assert_eq!(app.selected, Some(NodePath::from_indices([1])));

    press(&mut app, KeyCode::Left);
    assert_eq!(app.cursor, 0);
    assert_eq!(app.selected, Some(NodePath::from_indices([0])));
}

#[test]
fn tree_walk_moves_the_input_cursor() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "ab");
    settle(&mut app);

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.focus, Focus::Tree);

    press(&mut app, KeyCode::Up);
    assert_eq!(app.selected, Some(NodePath::root()));
    assert_eq!(app.cursor, 0);

    press(&mut app, KeyCode::Down);
    assert_eq!(app.selected, Some(NodePath::from_indices([0])));

    press(&mut app, KeyCode::Right);
    assert_eq!(app.selected, Some(NodePath::from_indices([1])));
    assert_eq!(app.cursor, 1);

    press(&mut app, KeyCode::Up);
    assert_eq!(app.selected, Some(NodePath::root()));
    assert_eq!(app.cursor, 0);
}

#[test]
fn an_invalid_grammar_shows_its_issues() {
    let (mut app, _registry) = app_with("not a grammar", None, "");
    settle(&mut app);

    let PreviewView::Invalid(issues) = &app.view else {
        panic!("expected the invalid-grammar placeholder");
    };
    assert!(!issues.is_empty());
}

#[test]
fn a_missing_start_rule_shows_the_placeholder() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, None, "ab");
    settle(&mut app);
    assert!(matches!(app.view, PreviewView::NoStartRule));
}

#[test]
fn a_vanished_start_rule_shows_the_placeholder() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("nope"), "ab");
    settle(&mut app);
    assert!(matches!(app.view, PreviewView::NoStartRule));
}

#[test]
fn zoom_and_fit_adjust_the_viewport() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "ab");
    settle(&mut app);
    app.tree_view_size = (80, 24);

    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('+'));
    assert!(app.viewport.scale() > 1.0);

    press(&mut app, KeyCode::Char('f'));
    let fitted = app.viewport.scale();
    assert!(fitted > 1.0);

    press(&mut app, KeyCode::Char('-'));
    assert!(app.viewport.scale() < fitted);
}

#[test]
fn quitting_needs_ctrl_q_while_editing() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "ab");
    settle(&mut app);

    press(&mut app, KeyCode::Char('q'));
    assert!(!app.should_quit);
    assert_eq!(app.input, "qab");

    app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
}

#[test]
fn q_quits_outside_the_input_pane() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "ab");
    settle(&mut app);

    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
}

#[test]
fn number_keys_switch_panes_except_while_editing() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "ab");
    settle(&mut app);

    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('3'));
    assert_eq!(app.focus, Focus::Tokens);
    press(&mut app, KeyCode::Char('4'));
    assert_eq!(app.focus, Focus::Errors);
    press(&mut app, KeyCode::Char('1'));
    assert_eq!(app.focus, Focus::Input);

    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.focus, Focus::Input);
    assert_eq!(app.input, "2ab");
}

#[test]
fn picking_a_token_jumps_the_cursor() {
    let (mut app, _registry) = app_with(EXPR_GRAMMAR_SRC, Some("expr"), "1+2");
    settle(&mut app);

    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char('3'));
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.cursor, 1);
    assert_eq!(app.selected, Some(NodePath::from_indices([1])));
}

#[test]
fn edits_that_drop_the_selected_node_clear_the_selection() {
    let (mut app, _registry) = app_with(EXPR_GRAMMAR_SRC, Some("expr"), "1+2");
    settle(&mut app);

    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Right);
    assert_eq!(app.selected, Some(NodePath::from_indices([2, 0])));

    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.input, "2");
    settle(&mut app);

    assert!(matches!(app.view, PreviewView::Tree { .. }));
    assert!(app.selected.is_none());
}

#[test]
fn drawing_fits_a_small_terminal() {
    let (mut app, _registry) = app_with(TINY_GRAMMAR_SRC, Some("r"), "ab");
    settle(&mut app);

    let backend = TestBackend::new(60, 18);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|frame| draw(frame, &mut app)).unwrap();

    press(&mut app, KeyCode::Right);
    terminal.draw(|frame| draw(frame, &mut app)).unwrap();
}
