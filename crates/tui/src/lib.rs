pub mod worker;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use sqlnav_core::catalog_navigator::{CatalogNavigator, NodeId, VisibleNode};
use sqlnav_core::connection_manager::{ConnectionParams, ConnectionStatus, DatabaseKind};
use sqlnav_core::results::{ResultSurface, ResultsView};
use sqlnav_core::session::SessionSnapshot;
use sqlnav_core::settings::{ConnectionDefaults, Settings};
use thiserror::Error;
use tracing::{debug, info};

use crate::worker::{DbWorker, WorkerEvent, WorkerRequest};

const TICK_RATE: Duration = Duration::from_millis(120);
const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    ConnectionForm,
    Navigator,
    Editor,
    Results,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Self::ConnectionForm => Self::ConnectionForm,
            Self::Navigator => Self::Editor,
            Self::Editor => Self::Results,
            Self::Results => Self::Navigator,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::ConnectionForm => Self::ConnectionForm,
            Self::Navigator => Self::Results,
            Self::Editor => Self::Navigator,
            Self::Results => Self::Editor,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::ConnectionForm => "Connection",
            Self::Navigator => "Navigator",
            Self::Editor => "Query Editor",
            Self::Results => "Results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Kind,
    Host,
    Port,
    User,
    Password,
}

impl FormField {
    const ALL: [Self; 5] = [Self::Kind, Self::Host, Self::Port, Self::User, Self::Password];

    fn next(self) -> Self {
        match self {
            Self::Kind => Self::Host,
            Self::Host => Self::Port,
            Self::Port => Self::User,
            Self::User => Self::Password,
            Self::Password => Self::Kind,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Kind => Self::Password,
            Self::Host => Self::Kind,
            Self::Port => Self::Host,
            Self::User => Self::Port,
            Self::Password => Self::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConnectionForm {
    kind: DatabaseKind,
    host: String,
    port: String,
    user: String,
    password: String,
    active_field: FormField,
}

impl ConnectionForm {
    fn from_defaults(defaults: &ConnectionDefaults) -> Self {
        Self {
            kind: defaults.kind,
            host: defaults.host.clone(),
            port: defaults.port_or_default(),
            user: defaults.user.clone(),
            password: String::new(),
            active_field: FormField::Host,
        }
    }

    fn label(&self, field: FormField) -> &'static str {
        match field {
            FormField::Kind => "Database",
            FormField::Host if self.kind.is_file_based() => "Path",
            FormField::Host => "Host",
            FormField::Port => "Port",
            FormField::User => "Username",
            FormField::Password => "Password",
        }
    }

    fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::Kind => format!("< {} >", self.kind.label()),
            FormField::Host => self.host.clone(),
            FormField::Port => self.port.clone(),
            FormField::User => self.user.clone(),
            FormField::Password => "*".repeat(self.password.chars().count()),
        }
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Kind => None,
            FormField::Host => Some(&mut self.host),
            FormField::Port => Some(&mut self.port),
            FormField::User => Some(&mut self.user),
            FormField::Password => Some(&mut self.password),
        }
    }

    /// Switches kind; a port that was empty or still the old default follows along.
    fn cycle_kind(&mut self, forward: bool) {
        let previous_default = self.kind.default_port().unwrap_or_default();
        self.kind = if forward {
            self.kind.next()
        } else {
            self.kind.previous()
        };

        if self.port.is_empty() || self.port == previous_default {
            self.port = self.kind.default_port().unwrap_or_default().to_string();
        }
    }

    fn insert_char(&mut self, ch: char) {
        if let Some(value) = self.field_mut(self.active_field) {
            value.push(ch);
        }
    }

    fn backspace(&mut self) {
        if let Some(value) = self.field_mut(self.active_field) {
            value.pop();
        }
    }

    fn to_params(&self) -> ConnectionParams {
        ConnectionParams {
            kind: self.kind,
            host: self.host.trim().to_string(),
            port: self.port.trim().to_string(),
            username: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionKey {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Msg {
    Quit,
    ToggleHelp,
    NextPane,
    PreviousPane,
    NewConnection,
    Submit,
    Cancel,
    Execute,
    Navigate(DirectionKey),
    Input(char),
    Backspace,
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Popup {
    title: &'static str,
    message: String,
}

#[derive(Debug)]
struct TuiApp {
    pane: Pane,
    form: ConnectionForm,
    connection: ConnectionStatus,
    navigator: CatalogNavigator,
    results: ResultsView,
    editor: String,
    tree_cursor: usize,
    results_scroll: usize,
    popup: Option<Popup>,
    show_help: bool,
    should_quit: bool,
    spinner: usize,
    status_line: String,
}

impl TuiApp {
    fn new(settings: &Settings) -> Self {
        Self {
            pane: Pane::ConnectionForm,
            form: ConnectionForm::from_defaults(&settings.connection),
            connection: ConnectionStatus::disconnected(),
            navigator: CatalogNavigator::default(),
            results: ResultsView::new(settings.message_log_capacity.max(1)),
            editor: String::new(),
            tree_cursor: 0,
            results_scroll: 0,
            popup: None,
            show_help: false,
            should_quit: false,
            spinner: 0,
            status_line: "Fill in the connection form and press Enter".to_string(),
        }
    }

    fn visible_nodes(&self) -> Vec<VisibleNode> {
        self.navigator.visible_nodes()
    }

    fn selected_node(&self) -> Option<NodeId> {
        self.visible_nodes()
            .into_iter()
            .nth(self.tree_cursor)
            .map(|node| node.id)
    }

    /// Updates UI state; returns the database work the message asks for, if any.
    fn handle(&mut self, msg: Msg) -> Option<WorkerRequest> {
        if self.popup.is_some() {
            if matches!(msg, Msg::Submit | Msg::Cancel) {
                self.popup = None;
            }
            return None;
        }

        match msg {
            Msg::Quit => self.should_quit = true,
            Msg::ToggleHelp => self.show_help = !self.show_help,
            Msg::Cancel if self.show_help => self.show_help = false,
            Msg::Cancel => {
                if self.pane == Pane::ConnectionForm {
                    if self.connection.is_connected {
                        self.pane = Pane::Navigator;
                        self.status_line = "Connection form closed".to_string();
                    } else {
                        self.should_quit = true;
                    }
                }
            }
            Msg::NewConnection => {
                self.pane = Pane::ConnectionForm;
                self.status_line = "Enter connection details".to_string();
            }
            Msg::NextPane => {
                if self.pane == Pane::ConnectionForm {
                    self.form.active_field = self.form.active_field.next();
                } else {
                    self.pane = self.pane.next();
                }
            }
            Msg::PreviousPane => {
                if self.pane == Pane::ConnectionForm {
                    self.form.active_field = self.form.active_field.previous();
                } else {
                    self.pane = self.pane.previous();
                }
            }
            Msg::Submit => return self.submit(),
            Msg::Execute => {
                if self.pane != Pane::ConnectionForm {
                    self.status_line = "Executing query...".to_string();
                    return Some(WorkerRequest::Execute(self.editor.clone()));
                }
            }
            Msg::Navigate(direction) => self.navigate(direction),
            Msg::Input(ch) => match self.pane {
                Pane::ConnectionForm => self.form.insert_char(ch),
                Pane::Editor => self.editor.push(ch),
                Pane::Navigator | Pane::Results => {}
            },
            Msg::Backspace => match self.pane {
                Pane::ConnectionForm => self.form.backspace(),
                Pane::Editor => {
                    self.editor.pop();
                }
                Pane::Navigator | Pane::Results => {}
            },
            Msg::Tick => self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len(),
        }
        None
    }

    fn submit(&mut self) -> Option<WorkerRequest> {
        match self.pane {
            Pane::ConnectionForm => {
                let params = self.form.to_params();
                self.status_line = format!("Connecting to {}...", params.locator());
                Some(WorkerRequest::Connect(params))
            }
            Pane::Navigator => {
                let id = self.selected_node()?;
                if matches!(id, NodeId::Table { .. }) {
                    self.status_line = format!("Previewing {}", id.label());
                    Some(WorkerRequest::SelectNode(id))
                } else {
                    Some(WorkerRequest::ExpandNode(id))
                }
            }
            Pane::Editor => {
                self.editor.push('\n');
                None
            }
            Pane::Results => None,
        }
    }

    fn navigate(&mut self, direction: DirectionKey) {
        match self.pane {
            Pane::ConnectionForm => match direction {
                DirectionKey::Up => self.form.active_field = self.form.active_field.previous(),
                DirectionKey::Down => self.form.active_field = self.form.active_field.next(),
                DirectionKey::Left if self.form.active_field == FormField::Kind => {
                    self.form.cycle_kind(false);
                }
                DirectionKey::Right if self.form.active_field == FormField::Kind => {
                    self.form.cycle_kind(true);
                }
                DirectionKey::Left | DirectionKey::Right => {}
            },
            Pane::Navigator => {
                let last = self.visible_nodes().len().saturating_sub(1);
                match direction {
                    DirectionKey::Up => self.tree_cursor = self.tree_cursor.saturating_sub(1),
                    DirectionKey::Down => self.tree_cursor = (self.tree_cursor + 1).min(last),
                    DirectionKey::Left | DirectionKey::Right => {}
                }
            }
            Pane::Results => match direction {
                DirectionKey::Left | DirectionKey::Right => {
                    let surface = self.results.active().other();
                    self.results.select(surface);
                    self.results_scroll = 0;
                }
                DirectionKey::Up => self.results_scroll = self.results_scroll.saturating_sub(1),
                DirectionKey::Down => self.results_scroll = self.results_scroll.saturating_add(1),
            },
            Pane::Editor => {}
        }
    }

    fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Connected { snapshot, latency } => {
                self.apply_snapshot(snapshot);
                self.tree_cursor = 0;
                self.pane = Pane::Navigator;
                self.popup = Some(Popup {
                    title: "Connection",
                    message: "Connected successfully!".to_string(),
                });
                self.status_line = format!("Connected in {} ms", latency.as_millis());
            }
            WorkerEvent::ConnectFailed(message) => {
                self.popup = Some(Popup {
                    title: "Connection",
                    message: format!("Connection failed: {message}"),
                });
                self.status_line = "Connection failed".to_string();
            }
            WorkerEvent::Updated {
                snapshot,
                editor_text,
            } => {
                self.apply_snapshot(snapshot);
                if let Some(text) = editor_text {
                    self.editor = text;
                }
                self.status_line = self
                    .results
                    .messages()
                    .last()
                    .unwrap_or("Ready")
                    .to_string();
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.connection = snapshot.connection;
        self.navigator = snapshot.navigator;
        // A tab chosen with Left/Right survives actions that picked no surface.
        let local_surface = self.results.active();
        let picked = snapshot.results.surface_picks() != self.results.surface_picks();
        self.results = snapshot.results;
        if picked {
            self.results_scroll = 0;
        } else {
            self.results.select(local_surface);
        }
        let last = self.visible_nodes().len().saturating_sub(1);
        self.tree_cursor = self.tree_cursor.min(last);
    }
}

pub fn run(settings: Settings) -> Result<(), TuiError> {
    let mut worker = DbWorker::spawn(&settings)?;
    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, &settings, &mut worker);
    let restore_result = restore_terminal(&mut terminal);
    worker.shutdown();

    if let Err(error) = run_result {
        restore_result?;
        return Err(error);
    }

    restore_result?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    settings: &Settings,
    worker: &mut DbWorker,
) -> Result<(), TuiError> {
    let mut app = TuiApp::new(settings);
    let mut last_tick = Instant::now();
    info!("ui started");

    loop {
        while let Some(event) = worker.try_recv() {
            app.apply(event);
        }

        terminal.draw(|frame| render(frame, &app, worker.is_busy()))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let request = map_key_event(app.pane, key).and_then(|msg| app.handle(msg));
                    if let Some(request) = request {
                        debug!(?request, "dispatching to worker");
                        if !worker.send(request) {
                            app.status_line = "Database worker stopped".to_string();
                        }
                    }
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.handle(Msg::Tick);
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    info!("ui stopped");
    Ok(())
}

fn render(frame: &mut Frame<'_>, app: &TuiApp, busy: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(header(app, busy), chunks[0]);

    if app.pane == Pane::ConnectionForm {
        render_connection_form(frame, app, chunks[1]);
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(columns[1]);

        render_navigator(frame, app, columns[0]);
        render_editor(frame, app, right[0]);
        render_results(frame, app, right[1]);
    }

    let footer = Paragraph::new(vec![
        Line::from(footer_hint(app.pane)),
        Line::from(format!("Status: {}", app.status_line)),
    ])
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.show_help {
        render_help_popup(frame);
    }
    if let Some(popup) = &app.popup {
        render_popup(frame, popup);
    }
}

fn header(app: &TuiApp, busy: bool) -> Paragraph<'static> {
    let connection = match (&app.connection.kind, &app.connection.locator) {
        (Some(kind), Some(locator)) if app.connection.is_connected => {
            format!("{kind} {locator}")
        }
        _ => "not connected".to_string(),
    };
    let activity = if busy {
        format!("working {}", SPINNER_FRAMES[app.spinner % SPINNER_FRAMES.len()])
    } else {
        "idle".to_string()
    };

    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.pane.title()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::raw(format!("Connection: {connection}")),
        Span::raw(" | "),
        Span::raw(format!(
            "Catalog: {}",
            app.navigator.active_catalog().unwrap_or("-")
        )),
        Span::raw(" | "),
        Span::raw(activity),
    ]))
    .block(Block::default().borders(Borders::ALL).title("sqlnav"))
}

fn footer_hint(pane: Pane) -> &'static str {
    match pane {
        Pane::ConnectionForm => {
            "Enter: connect | Tab/Up/Down: field | Left/Right: database kind | Esc: cancel"
        }
        Pane::Navigator => "Enter: expand / preview | Up/Down: move | Tab: next pane | F1: help",
        Pane::Editor => "Ctrl+E / F5: execute | Tab: next pane | Ctrl+O: connect | F1: help",
        Pane::Results => "Left/Right: Table / Messages | Up/Down: scroll | Tab: next pane",
    }
}

fn focus_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn render_connection_form(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let mut lines = vec![Line::from("Connect to a database"), Line::from("")];
    for field in FormField::ALL {
        let marker = if app.form.active_field == field { ">" } else { " " };
        lines.push(Line::from(format!(
            "{marker} {:<9} {}",
            format!("{}:", app.form.label(field)),
            app.form.display_value(field)
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Locator: {}", app.form.to_params().locator())));

    let form = Paragraph::new(lines)
        .block(focus_block("Connection", true))
        .alignment(Alignment::Left);
    let area = centered_rect(60, 70, area);
    frame.render_widget(Clear, area);
    frame.render_widget(form, area);
}

fn tree_row_text(node: &VisibleNode) -> String {
    let indent = "  ".repeat(node.depth);
    let marker = match node.expanded {
        Some(true) => "▾ ",
        Some(false) => "▸ ",
        None => "  ",
    };
    format!("{indent}{marker}{}", node.id.label())
}

fn render_navigator(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let visible_limit = usize::from(area.height.saturating_sub(2)).max(1);
    let window_start = app.tree_cursor.saturating_sub(visible_limit.saturating_sub(1));
    let focused = app.pane == Pane::Navigator;

    let lines: Vec<Line<'_>> = app
        .visible_nodes()
        .iter()
        .enumerate()
        .skip(window_start)
        .take(visible_limit)
        .map(|(index, node)| {
            let text = tree_row_text(node);
            if index == app.tree_cursor && focused {
                Line::from(Span::styled(
                    text,
                    Style::default().add_modifier(Modifier::REVERSED),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).block(focus_block("Navigator", focused)),
        area,
    );
}

fn render_editor(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let focused = app.pane == Pane::Editor;
    let mut text = app.editor.clone();
    if focused {
        text.push('_');
    }
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(focus_block("Query Editor", focused)),
        area,
    );
}

fn render_results(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let focused = app.pane == Pane::Results;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let tabs = Tabs::new(ResultSurface::ALL.iter().map(|surface| surface.title()))
        .select(app.results.active().index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, sections[0]);

    let block = focus_block("Results", focused);
    let visible_limit = usize::from(sections[1].height.saturating_sub(3)).max(1);
    match app.results.active() {
        ResultSurface::Table => {
            let grid = app.results.grid();
            let start = app.results_scroll.min(grid.row_count().saturating_sub(1));
            let rows = grid
                .rows()
                .iter()
                .skip(start)
                .take(visible_limit)
                .map(|row| Row::new(row.iter().map(|value| Cell::from(value.to_string()))));
            let column_count = u32::try_from(grid.column_count()).unwrap_or(u32::MAX).max(1);
            let widths = vec![Constraint::Ratio(1, column_count); grid.column_count()];
            let table = Table::new(rows, widths)
                .header(
                    Row::new(grid.columns().iter().map(|name| Cell::from(name.clone())))
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .block(block);
            frame.render_widget(table, sections[1]);
        }
        ResultSurface::Messages => {
            let messages = app.results.messages();
            let start = messages
                .len()
                .saturating_sub(visible_limit)
                .saturating_sub(app.results_scroll);
            let lines: Vec<Line<'_>> = messages
                .visible_lines(start, visible_limit)
                .into_iter()
                .map(|line| {
                    if line.starts_with("ERROR: ") {
                        Line::from(Span::styled(line, Style::default().fg(Color::Red)))
                    } else {
                        Line::from(line)
                    }
                })
                .collect();
            frame.render_widget(Paragraph::new(lines).block(block), sections[1]);
        }
    }
}

fn render_popup(frame: &mut Frame<'_>, popup: &Popup) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);
    let body = Paragraph::new(vec![
        Line::from(popup.message.as_str()),
        Line::from(""),
        Line::from("Press Enter to close"),
    ])
    .wrap(Wrap { trim: true })
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(popup.title));
    frame.render_widget(body, area);
}

fn render_help_popup(frame: &mut Frame<'_>) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("Global keymap"),
        Line::from("Ctrl+Q: quit"),
        Line::from("F1: toggle help"),
        Line::from("Tab / Shift+Tab: cycle panes"),
        Line::from("Ctrl+O: open the connection form"),
        Line::from("Ctrl+E or F5: execute the editor text"),
        Line::from("Enter on Databases: reload catalogs"),
        Line::from("Enter on a catalog: load its tables"),
        Line::from("Enter on a table: preview its rows"),
        Line::from("Left/Right in results: switch Table / Messages"),
        Line::from("Esc: close popup or form"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, area);
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100_u16 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100_u16 - height_percent) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100_u16 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100_u16 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

fn map_key_event(pane: Pane, key: KeyEvent) -> Option<Msg> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') if ctrl => return Some(Msg::Quit),
        KeyCode::Char('e') if ctrl => return Some(Msg::Execute),
        KeyCode::Char('o') if ctrl => return Some(Msg::NewConnection),
        KeyCode::F(1) => return Some(Msg::ToggleHelp),
        KeyCode::F(5) => return Some(Msg::Execute),
        KeyCode::Tab => return Some(Msg::NextPane),
        KeyCode::BackTab => return Some(Msg::PreviousPane),
        KeyCode::Esc => return Some(Msg::Cancel),
        KeyCode::Enter => return Some(Msg::Submit),
        KeyCode::Up => return Some(Msg::Navigate(DirectionKey::Up)),
        KeyCode::Down => return Some(Msg::Navigate(DirectionKey::Down)),
        _ => {}
    }

    let accepts_text = matches!(pane, Pane::ConnectionForm | Pane::Editor);
    match key.code {
        KeyCode::Left if !matches!(pane, Pane::Editor) => Some(Msg::Navigate(DirectionKey::Left)),
        KeyCode::Right if !matches!(pane, Pane::Editor) => {
            Some(Msg::Navigate(DirectionKey::Right))
        }
        KeyCode::Backspace if accepts_text => Some(Msg::Backspace),
        KeyCode::Char(ch) if accepts_text && !ctrl => Some(Msg::Input(ch)),
        _ => None,
    }
}
