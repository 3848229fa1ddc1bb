// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! Interactive preview shell (ratatui + crossterm) with four panes: sample
//! input, parse tree, token stream and diagnostics. The input cursor and
//! the tree selection stay in sync in both directions, and every edit
//! reparses in the background through the debounced scheduler.

use std::error::Error;
use std::io;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::event::{EventBus, PreviewEvent, SelectionOrigin};
use crate::layout::{default_extent, layout_tree, LayoutConfig, LayoutTree, Point, Viewport};
use crate::model::Span as SourceSpan;
use crate::model::{
    Channel, GrammarIssue, InputSource, LineIndex, NodePath, ParseOutcome, Token,
};
use crate::present::{label_for, LabelMode};
use crate::query::{node_covering_offset, token_span_of_node};
use crate::registry::GrammarSession;
use crate::render::{render_layout_unicode, AnnotatedRender};
use crate::reparse::{ReparsePhase, ReparseScheduler};

#[cfg(test)]
mod tests;

const FOCUS_COLOR: Color = Color::LightGreen;
const BLUR_COLOR: Color = Color::DarkGray;
const SELECTION_BG: Color = Color::Blue;
const STATUS_COLOR: Color = Color::Gray;
const ZOOM_STEP: f32 = 1.25;
const PAN_STEP: f32 = 4.0;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Runs the interactive preview shell until the user quits.
pub fn run(
    session: Arc<GrammarSession>,
    scheduler: ReparseScheduler,
    bus: Arc<EventBus>,
) -> Result<(), Box<dyn Error>> {
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(session, scheduler, bus);

    while !app.should_quit {
        app.drain_events();
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                _ => {}
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Tree,
    Tokens,
    Errors,
}

/// What the tree pane currently shows.
enum PreviewView {
    /// No parse yet, or one is still pending.
    Empty,
    Invalid(Vec<GrammarIssue>),
    NoStartRule,
    /// The tree exists but exceeds the drawable canvas.
    Oversize(String),
    Tree {
        outcome: Arc<ParseOutcome>,
        layout: LayoutTree,
        render: AnnotatedRender,
    },
}

struct App {
    session: Arc<GrammarSession>,
    scheduler: ReparseScheduler,
    bus: Arc<EventBus>,
    events: mpsc::Receiver<PreviewEvent>,
    focus: Focus,
    input: String,
    /// Byte offset into `input`, always on a char boundary.
    cursor: usize,
    selected: Option<NodePath>,
    view: PreviewView,
    viewport: Viewport,
    tree_scroll: (u16, u16),
    tree_view_size: (u16, u16),
    tokens_state: ListState,
    errors_state: ListState,
    should_quit: bool,
}

impl App {
    fn new(session: Arc<GrammarSession>, scheduler: ReparseScheduler, bus: Arc<EventBus>) -> Self {
        let events = bus.subscribe();
        let input = session.snapshot().input().text().to_owned();
        let mut app = Self {
            session,
            scheduler,
            bus,
            events,
            focus: Focus::Input,
            input,
            cursor: 0,
            selected: None,
            view: PreviewView::Empty,
            viewport: Viewport::new(),
            tree_scroll: (0, 0),
            tree_view_size: (0, 0),
            tokens_state: ListState::default(),
            errors_state: ListState::default(),
            should_quit: false,
        };
        app.scheduler.notify_changed(&app.session);
        app.rebuild_view();
        app
    }

    /// Applies queued bus events: committed reparses rebuild the view,
    /// selection changes from other publishers are adopted and mirrored into
    /// the pane that did not originate them.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                PreviewEvent::PreviewUpdated { key, .. } if key == *self.session.key() => {
                    self.rebuild_view();
                }
                PreviewEvent::PreviewUpdated { .. } => {}
                PreviewEvent::SelectionChanged { origin, path } => {
                    if path != self.selected {
                        self.selected = path;
                        if origin == SelectionOrigin::Tree {
                            self.move_cursor_to_selection();
                        }
                    }
                }
                PreviewEvent::HoverChanged { .. } => {}
            }
        }
    }

    fn rebuild_view(&mut self) {
        let snapshot = self.session.snapshot();
        self.view = match snapshot.pair() {
            None if snapshot.issues().is_empty() => PreviewView::Empty,
            None => PreviewView::Invalid(snapshot.issues().to_vec()),
            Some(pair) => {
                let resolvable = snapshot
                    .start_rule()
                    .is_some_and(|name| pair.grammar().rule_by_name(name).is_some());
                if !resolvable {
                    PreviewView::NoStartRule
                } else {
                    match snapshot.outcome() {
                        None => PreviewView::Empty,
                        Some(outcome) => {
                            let layout = layout_tree(
                                outcome.root(),
                                pair,
                                &LayoutConfig::default(),
                                default_extent,
                            );
                            match render_layout_unicode(&layout, Some(&self.viewport)) {
                                Ok(render) => PreviewView::Tree {
                                    outcome: outcome.clone(),
                                    layout,
                                    render,
                                },
                                Err(err) => PreviewView::Oversize(err.to_string()),
                            }
                        }
                    }
                }
            }
        };

        if let Some(path) = self.selected.clone() {
            let resolves = matches!(
                &self.view,
                PreviewView::Tree { outcome, .. } if outcome.root().node_at_path(&path).is_some()
            );
            if !resolves {
                self.selected = None;
            }
        }

        let token_count = match &self.view {
            PreviewView::Tree { outcome, .. } => outcome.tokens().len(),
            _ => 0,
        };
        clamp_list_state(&mut self.tokens_state, token_count);
        let error_count = self.error_lines().len();
        clamp_list_state(&mut self.errors_state, error_count);
    }

    /// Re-renders the current layout after a viewport change.
    fn rerender_tree(&mut self) {
        let rendered = match &self.view {
            PreviewView::Tree { layout, .. } => {
                Some(render_layout_unicode(layout, Some(&self.viewport)))
            }
            _ => None,
        };
        match rendered {
            Some(Ok(fresh)) => {
                if let PreviewView::Tree { render, .. } = &mut self.view {
                    *render = fresh;
                }
            }
            Some(Err(err)) => self.view = PreviewView::Oversize(err.to_string()),
            None => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('q') {
                self.should_quit = true;
            }
            return;
        }
        self.handle_key_code(key.code);
    }

    fn handle_key_code(&mut self, code: KeyCode) {
        if code == KeyCode::Tab {
            self.focus = next_focus(self.focus);
            return;
        }
        if self.focus != Focus::Input {
            match code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('1') => {
                    self.focus = Focus::Input;
                    return;
                }
                KeyCode::Char('2') => {
                    self.focus = Focus::Tree;
                    return;
                }
                KeyCode::Char('3') => {
                    self.focus = Focus::Tokens;
                    return;
                }
                KeyCode::Char('4') => {
                    self.focus = Focus::Errors;
                    return;
                }
                _ => {}
            }
        }
        match self.focus {
            Focus::Input => self.handle_input_key(code),
            Focus::Tree => self.handle_tree_key(code),
            Focus::Tokens => self.handle_tokens_key(code),
            Focus::Errors => self.handle_errors_key(code),
        }
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(ch) => self.insert_char(ch),
            KeyCode::Enter => self.insert_char('\n'),
            KeyCode::Backspace => self.delete_before_cursor(),
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Left => {
                self.move_cursor_left();
                self.sync_selection_from_cursor();
            }
            KeyCode::Right => {
                self.move_cursor_right();
                self.sync_selection_from_cursor();
            }
            KeyCode::Up => {
                self.move_cursor_vertically(-1);
                self.sync_selection_from_cursor();
            }
            KeyCode::Down => {
                self.move_cursor_vertically(1);
                self.sync_selection_from_cursor();
            }
            KeyCode::Home => {
                self.move_cursor_to_line_edge(false);
                self.sync_selection_from_cursor();
            }
            KeyCode::End => {
                self.move_cursor_to_line_edge(true);
                self.sync_selection_from_cursor();
            }
            _ => {}
        }
    }

    fn handle_tree_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.select_parent(),
            KeyCode::Down => self.select_first_child(),
            KeyCode::Left => self.select_sibling(-1),
            KeyCode::Right => self.select_sibling(1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(ZOOM_STEP),
            KeyCode::Char('-') => self.zoom(1.0 / ZOOM_STEP),
            KeyCode::Char('f') => self.fit_tree(),
            KeyCode::Char('h') => {
                self.viewport.pan_by(-PAN_STEP, 0.0);
                self.rerender_tree();
            }
            KeyCode::Char('l') => {
                self.viewport.pan_by(PAN_STEP, 0.0);
                self.rerender_tree();
            }
            KeyCode::Char('k') => self.tree_scroll.0 = self.tree_scroll.0.saturating_sub(1),
            KeyCode::Char('j') => self.tree_scroll.0 = self.tree_scroll.0.saturating_add(1),
            _ => {}
        }
    }

    fn handle_tokens_key(&mut self, code: KeyCode) {
        let PreviewView::Tree { outcome, .. } = &self.view else {
            return;
        };
        let count = outcome.tokens().len();
        match code {
            KeyCode::Up => list_move(&mut self.tokens_state, count, -1),
            KeyCode::Down => list_move(&mut self.tokens_state, count, 1),
            KeyCode::Enter => {
                let start = self
                    .tokens_state
                    .selected()
                    .and_then(|idx| outcome.tokens().get(idx))
                    .map(|token| token.span().start());
                if let Some(start) = start {
                    self.move_cursor_to_offset(start);
                    self.sync_selection_from_cursor();
                }
            }
            _ => {}
        }
    }

    fn handle_errors_key(&mut self, code: KeyCode) {
        let spans = self.error_spans();
        match code {
            KeyCode::Up => list_move(&mut self.errors_state, spans.len(), -1),
            KeyCode::Down => list_move(&mut self.errors_state, spans.len(), 1),
            KeyCode::Enter => {
                let target = self
                    .errors_state
                    .selected()
                    .and_then(|idx| spans.get(idx).copied().flatten());
                if let Some(span) = target {
                    self.move_cursor_to_offset(span.start());
                    self.sync_selection_from_cursor();
                }
            }
            _ => {}
        }
    }

    fn insert_char(&mut self, ch: char) {
        self.input.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.apply_input_edit();
    }

    fn delete_before_cursor(&mut self) {
        if let Some((idx, _)) = self.input[..self.cursor].char_indices().next_back() {
            self.input.remove(idx);
            self.cursor = idx;
            self.apply_input_edit();
        }
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
            self.apply_input_edit();
        }
    }

    fn apply_input_edit(&mut self) {
        self.session
            .set_input(InputSource::Manual(self.input.clone()));
        self.scheduler.notify_changed(&self.session);
    }

    fn move_cursor_left(&mut self) {
        if let Some((idx, _)) = self.input[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    fn move_cursor_right(&mut self) {
        if let Some(ch) = self.input[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn move_cursor_vertically(&mut self, delta: isize) {
        let index = LineIndex::new(&self.input);
        let pos = index.line_col(self.cursor);
        let target = pos.line() as isize + delta;
        if target < 1 {
            return;
        }
        let Some(start) = index.line_start(target as usize) else {
            return;
        };
        let column = (pos.column() - 1).min(line_byte_len(&self.input, start));
        self.move_cursor_to_offset(start + column);
    }

    fn move_cursor_to_line_edge(&mut self, end: bool) {
        let index = LineIndex::new(&self.input);
        let pos = index.line_col(self.cursor);
        if let Some(start) = index.line_start(pos.line()) {
            self.cursor = if end {
                start + line_byte_len(&self.input, start)
            } else {
                start
            };
        }
    }

    fn move_cursor_to_offset(&mut self, offset: usize) {
        self.cursor = offset.min(self.input.len());
        while !self.input.is_char_boundary(self.cursor) {
            self.cursor -= 1;
        }
    }

    /// Source side of the selection sync: the deepest node covering the
    /// cursor becomes selected and the change is announced on the bus.
    fn sync_selection_from_cursor(&mut self) {
        let PreviewView::Tree { outcome, .. } = &self.view else {
            return;
        };
        let path = node_covering_offset(outcome.root(), self.cursor);
        if path != self.selected {
            self.selected = path.clone();
            self.bus.publish(PreviewEvent::SelectionChanged {
                origin: SelectionOrigin::Source,
                path,
            });
        }
    }

    fn select_parent(&mut self) {
        if !matches!(&self.view, PreviewView::Tree { .. }) {
            return;
        }
        let next = match &self.selected {
            None => Some(NodePath::root()),
            Some(path) => path.parent(),
        };
        if let Some(path) = next {
            self.apply_tree_selection(path);
        }
    }

    fn select_first_child(&mut self) {
        let PreviewView::Tree { outcome, .. } = &self.view else {
            return;
        };
        let next = match &self.selected {
            None => Some(NodePath::root()),
            Some(path) => outcome
                .root()
                .node_at_path(path)
                .filter(|node| !node.children().is_empty())
                .map(|_| path.child(0)),
        };
        if let Some(path) = next {
            self.apply_tree_selection(path);
        }
    }

    fn select_sibling(&mut self, step: isize) {
        let PreviewView::Tree { outcome, .. } = &self.view else {
            return;
        };
        let Some(path) = self.selected.clone() else {
            self.apply_tree_selection(NodePath::root());
            return;
        };
        let (Some(parent), Some(last)) = (path.parent(), path.last()) else {
            return;
        };
        let target = last as isize + step;
        if target < 0 {
            return;
        }
        let candidate = parent.child(target as u32);
        if outcome.root().node_at_path(&candidate).is_some() {
            self.apply_tree_selection(candidate);
        }
    }

    /// Tree side of the selection sync: the cursor follows the selected
    /// node's source span and the change is announced on the bus.
    fn apply_tree_selection(&mut self, path: NodePath) {
        if self.selected.as_ref() == Some(&path) {
            return;
        }
        self.selected = Some(path.clone());
        self.move_cursor_to_selection();
        self.bus.publish(PreviewEvent::SelectionChanged {
            origin: SelectionOrigin::Tree,
            path: Some(path),
        });
    }

    fn move_cursor_to_selection(&mut self) {
        let span = self.selected_source_span();
        if let Some(span) = span {
            self.move_cursor_to_offset(span.start());
        }
    }

    fn selected_source_span(&self) -> Option<SourceSpan> {
        let PreviewView::Tree { outcome, .. } = &self.view else {
            return None;
        };
        let path = self.selected.as_ref()?;
        token_span_of_node(outcome.root(), path)
    }

    fn zoom(&mut self, factor: f32) {
        let (width, height) = self.tree_view_size;
        let anchor = Point::new(f32::from(width) / 2.0, f32::from(height) / 2.0);
        self.viewport.zoom_by(factor, anchor);
        self.rerender_tree();
    }

    fn fit_tree(&mut self) {
        let bounds = match &self.view {
            PreviewView::Tree { layout, .. } => layout.bounding_box(),
            _ => return,
        };
        let (width, height) = self.tree_view_size;
        self.viewport.fit_to(f32::from(width), f32::from(height), bounds);
        self.tree_scroll = (0, 0);
        self.rerender_tree();
    }

    fn error_lines(&self) -> Vec<String> {
        match &self.view {
            PreviewView::Invalid(issues) => issues.iter().map(ToString::to_string).collect(),
            PreviewView::Tree { outcome, .. } => {
                let mut lines: Vec<String> =
                    outcome.errors().iter().map(ToString::to_string).collect();
                lines.extend(outcome.ambiguities().iter().map(ToString::to_string));
                lines
            }
            _ => Vec::new(),
        }
    }

    fn error_spans(&self) -> Vec<Option<SourceSpan>> {
        match &self.view {
            PreviewView::Invalid(issues) => issues.iter().map(GrammarIssue::span).collect(),
            PreviewView::Tree { outcome, .. } => {
                let mut spans: Vec<Option<SourceSpan>> =
                    outcome.errors().iter().map(|err| Some(err.span())).collect();
                spans.extend(outcome.ambiguities().iter().map(|_| None));
                spans
            }
            _ => Vec::new(),
        }
    }

    fn selected_status_label(&self) -> Option<String> {
        let PreviewView::Tree { outcome, .. } = &self.view else {
            return None;
        };
        let path = self.selected.as_ref()?;
        let node = outcome.root().node_at_path(path)?;
        let snapshot = self.session.snapshot();
        let pair = snapshot.pair()?;
        Some(label_for(node, pair, LabelMode::Verbose))
    }
}

fn next_focus(focus: Focus) -> Focus {
    match focus {
        Focus::Input => Focus::Tree,
        Focus::Tree => Focus::Tokens,
        Focus::Tokens => Focus::Errors,
        Focus::Errors => Focus::Input,
    }
}

fn list_move(state: &mut ListState, len: usize, step: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match state.selected() {
        None => {
            if step < 0 {
                len - 1
            } else {
                0
            }
        }
        Some(idx) => (idx as isize + step).clamp(0, len as isize - 1) as usize,
    };
    state.select(Some(next));
}

fn clamp_list_state(state: &mut ListState, len: usize) {
    match state.selected() {
        Some(_) if len == 0 => state.select(None),
        Some(idx) if idx >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

fn line_byte_len(text: &str, start: usize) -> usize {
    text[start..].find('\n').unwrap_or(text.len() - start)
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.size());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(45),
            Constraint::Percentage(25),
        ])
        .split(outer[0]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(panes[2]);

    draw_input_pane(frame, app, panes[0]);
    draw_tree_pane(frame, app, panes[1]);
    draw_tokens_pane(frame, app, side[0]);
    draw_errors_pane(frame, app, side[1]);
    draw_status_line(frame, app, outer[1]);
}

fn draw_input_pane(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let selected = app.selected_source_span();
    let text = input_text(&app.input, app.cursor, selected, app.focus == Focus::Input);
    let paragraph =
        Paragraph::new(text).block(pane_block("Input", '1', app.focus == Focus::Input));
    frame.render_widget(paragraph, area);
}

fn draw_tree_pane(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    app.tree_view_size = (area.width.saturating_sub(2), area.height.saturating_sub(2));
    let block = pane_block("Tree", '2', app.focus == Focus::Tree);
    let paragraph = match &app.view {
        PreviewView::Empty => Paragraph::new("waiting for a parse"),
        PreviewView::Invalid(issues) => {
            let mut lines = vec![Line::from(Span::styled(
                "grammar has errors",
                Style::default().fg(Color::LightRed),
            ))];
            lines.push(Line::default());
            lines.extend(issues.iter().map(|issue| Line::from(issue.to_string())));
            Paragraph::new(Text::from(lines))
        }
        PreviewView::NoStartRule => Paragraph::new("no start rule selected"),
        PreviewView::Oversize(message) => {
            Paragraph::new(format!("tree too large to draw: {message}"))
        }
        PreviewView::Tree { render, .. } => {
            Paragraph::new(tree_text(render, app.selected.as_ref())).scroll(app.tree_scroll)
        }
    };
    frame.render_widget(paragraph.block(block), area);
}

fn draw_tokens_pane(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let block = pane_block("Tokens", '3', app.focus == Focus::Tokens);
    let items = match &app.view {
        PreviewView::Tree { outcome, .. } => {
            let snapshot = app.session.snapshot();
            let pair = snapshot.pair();
            outcome
                .tokens()
                .iter()
                .map(|token| {
                    let name = pair.and_then(|p| p.lexer().symbolic_name(token.ty()));
                    ListItem::new(token_line(token, name))
                })
                .collect::<Vec<_>>()
        }
        _ => Vec::new(),
    };
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(SELECTION_BG).fg(Color::White));
    frame.render_stateful_widget(list, area, &mut app.tokens_state);
}

fn draw_errors_pane(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let block = pane_block("Errors", '4', app.focus == Focus::Errors);
    let items = app
        .error_lines()
        .into_iter()
        .map(ListItem::new)
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(SELECTION_BG).fg(Color::White));
    frame.render_stateful_widget(list, area, &mut app.errors_state);
}

fn draw_status_line(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let snapshot = app.session.snapshot();
    let phase = match app.scheduler.phase(snapshot.key()) {
        ReparsePhase::Idle => "idle",
        ReparsePhase::Scheduled => "reparse queued",
        ReparsePhase::Running => "reparsing",
        ReparsePhase::Cancelled => "cancelling",
    };
    let rule = snapshot.start_rule().unwrap_or("<none>");
    let mut line = format!(" {} | start {rule} | {phase}", snapshot.key());
    if let Some(label) = app.selected_status_label() {
        line.push_str(" | ");
        line.push_str(&label);
    }
    let status = Paragraph::new(line).style(Style::default().fg(STATUS_COLOR));
    frame.render_widget(status, area);
}

fn pane_block(title: &str, key: char, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(FOCUS_COLOR)
    } else {
        Style::default().fg(BLUR_COLOR)
    };
    Block::default()
        .borders(Borders::ALL)
        .title(format!("{title} [{key}]"))
        .border_style(style)
}

/// Styles the sample input char by char: the selected node's span gets a
/// background, the cursor cell is reversed when the pane has focus.
fn input_text(
    input: &str,
    cursor: usize,
    selected: Option<SourceSpan>,
    focused: bool,
) -> Text<'static> {
    let selection_style = Style::default().bg(SELECTION_BG).fg(Color::White);
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);

    let mut lines = Vec::<Line<'static>>::new();
    let mut spans = Vec::<Span<'static>>::new();
    let mut offset = 0usize;
    for ch in input.chars() {
        if ch == '\n' {
            if focused && offset == cursor {
                spans.push(Span::styled(" ", cursor_style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
            offset += 1;
            continue;
        }
        let mut style = Style::default();
        if selected.is_some_and(|span| span.contains(offset)) {
            style = selection_style;
        }
        if focused && offset == cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(ch.to_string(), style));
        offset += ch.len_utf8();
    }
    if focused && cursor >= input.len() {
        spans.push(Span::styled(" ", cursor_style));
    }
    lines.push(Line::from(spans));
    Text::from(lines)
}

/// Converts the rendered canvas to styled lines, backgrounding the cells of
/// the selected node via the highlight index.
fn tree_text(render: &AnnotatedRender, selected: Option<&NodePath>) -> Text<'static> {
    let rows: Vec<&str> = render.text.split('\n').collect();
    let mut flags: Vec<Vec<bool>> = rows
        .iter()
        .map(|row| vec![false; row.chars().count()])
        .collect();
    if let Some(spans) = selected.and_then(|path| render.highlight_index.get(path)) {
        // Spans were clamped to the rendered text when the index was built.
        for &(y, x0, x1) in spans {
            for x in x0..=x1 {
                flags[y][x] = true;
            }
        }
    }

    let highlight = Style::default().bg(SELECTION_BG).fg(Color::White);
    let lines = rows
        .iter()
        .zip(&flags)
        .map(|(row, row_flags)| {
            let mut spans = Vec::<Span<'static>>::new();
            let mut run = String::new();
            let mut run_flag = false;
            for (ch, &flag) in row.chars().zip(row_flags) {
                if flag != run_flag && !run.is_empty() {
                    spans.push(styled_run(std::mem::take(&mut run), run_flag, highlight));
                }
                run_flag = flag;
                run.push(ch);
            }
            if !run.is_empty() {
                spans.push(styled_run(run, run_flag, highlight));
            }
            Line::from(spans)
        })
        .collect::<Vec<_>>();
    Text::from(lines)
}

fn styled_run(run: String, highlighted: bool, highlight: Style) -> Span<'static> {
    if highlighted {
        Span::styled(run, highlight)
    } else {
        Span::raw(run)
    }
}

fn token_line(token: &Token, name: Option<&str>) -> String {
    if token.is_eof() {
        return format!("<EOF> @{}", token.span().start());
    }
    let span = token.span();
    let mut line = match name {
        Some(name) => format!("{name} '{}' {}..{}", token.text(), span.start(), span.end()),
        None => format!("'{}' {}..{}", token.text(), span.start(), span.end()),
    };
    if token.channel() == Channel::Hidden {
        line.push_str(" (hidden)");
    }
    line
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}
