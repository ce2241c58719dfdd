use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use matchtui_core::{
    config::AppConfig,
    outcome::Outcome,
    score::{PlayerProfile, ScoreRecord},
    session::{RevealOutcome, SessionController, SessionPhase, SessionSnapshot},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::info;

use crate::block_font;

const MAX_FIELD_LEN: usize = 64;
const GRID_COLUMNS: usize = 6;
const CARD_HEIGHT: u16 = 3;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

impl Theme {
    fn outcome_color(&self, outcome: Outcome) -> Color {
        match outcome {
            Outcome::Win => self.success,
            Outcome::Draw => self.warning,
            Outcome::Lose => self.danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Form,
    Play,
    Scores,
}

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone, Default)]
struct TextField {
    input: String,
    cursor: usize,
}

impl TextField {
    fn with_value(value: &str) -> Self {
        Self {
            input: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let mut next = self.cursor as isize + delta;
        if next < 0 {
            next = 0;
        } else if next > len {
            next = len;
        }
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_FIELD_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    fn value(&self) -> String {
        self.input.trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormFocus {
    Name,
    Email,
    Institution,
}

#[derive(Debug, Clone)]
struct FormState {
    name: TextField,
    email: TextField,
    institution: TextField,
    focus: FormFocus,
    error: Option<String>,
}

impl FormState {
    fn from_profile(profile: &PlayerProfile) -> Self {
        fn keep(value: &str) -> &str {
            if value == "N/A" {
                ""
            } else {
                value
            }
        }
        Self {
            name: TextField::with_value(keep(&profile.name)),
            email: TextField::with_value(keep(&profile.email)),
            institution: TextField::with_value(keep(&profile.institution)),
            focus: FormFocus::Name,
            error: None,
        }
    }

    fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            FormFocus::Name => &mut self.name,
            FormFocus::Email => &mut self.email,
            FormFocus::Institution => &mut self.institution,
        }
    }

    fn next_focus(&mut self) {
        self.focus = match self.focus {
            FormFocus::Name => FormFocus::Email,
            FormFocus::Email => FormFocus::Institution,
            FormFocus::Institution => FormFocus::Name,
        };
    }

    fn prev_focus(&mut self) {
        self.focus = match self.focus {
            FormFocus::Name => FormFocus::Institution,
            FormFocus::Email => FormFocus::Name,
            FormFocus::Institution => FormFocus::Email,
        };
    }

    fn validate(&self) -> Result<PlayerProfile, String> {
        let name = self.name.value();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let email = self.email.value();
        if !email.contains('@') {
            return Err("Email must contain an @".to_string());
        }
        let institution = self.institution.value();
        if institution.is_empty() {
            return Err("Institution is required".to_string());
        }
        Ok(PlayerProfile {
            name,
            email,
            institution,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditFocus {
    Name,
    Institution,
}

#[derive(Debug, Clone)]
struct ScoreEditModal {
    index: usize,
    record: ScoreRecord,
    name: TextField,
    institution: TextField,
    focus: EditFocus,
}

impl ScoreEditModal {
    fn new(index: usize, record: ScoreRecord) -> Self {
        let name = TextField::with_value(&record.name);
        let institution = TextField::with_value(&record.institution);
        Self {
            index,
            record,
            name,
            institution,
            focus: EditFocus::Name,
        }
    }

    fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            EditFocus::Name => &mut self.name,
            EditFocus::Institution => &mut self.institution,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            EditFocus::Name => EditFocus::Institution,
            EditFocus::Institution => EditFocus::Name,
        };
    }

    fn updated_record(&self) -> ScoreRecord {
        let mut record = self.record.clone();
        let name = self.name.value();
        if !name.is_empty() {
            record.name = name;
        }
        let institution = self.institution.value();
        if !institution.is_empty() {
            record.institution = institution;
        }
        record
    }
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    grid_cursor: usize,
    score_cursor: usize,
    list_height: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            grid_cursor: 0,
            score_cursor: 0,
            list_height: 1,
        }
    }
}

impl UiState {
    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// High-level application state for the matchtui interface.
pub struct MatchApp {
    config: AppConfig,
    controller: SessionController,
    state: UiState,
    screen: Screen,
    theme: Theme,
    form: Option<FormState>,
    score_edit: Option<ScoreEditModal>,
    scores: Vec<ScoreRecord>,
    has_profile: bool,
    announced_over: bool,
    announced_clip_end: bool,
}

impl MatchApp {
    pub fn new(config: AppConfig, controller: SessionController, has_profile: bool) -> Self {
        Self {
            config,
            controller,
            state: UiState::default(),
            screen: Screen::Menu,
            theme: Theme::default(),
            form: None,
            score_edit: None,
            scores: Vec::new(),
            has_profile,
            announced_over: false,
            announced_clip_end: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx, self.config.tick());

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let Some(app_event) = event_rx.recv().await else {
                break;
            };
            match app_event {
                AppEvent::Input(evt) => {
                    if let Err(err) = self.handle_input(evt) {
                        self.state.set_status(format!("Error: {err}"));
                    }
                }
                AppEvent::Tick => self.handle_tick(),
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn handle_tick(&mut self) {
        self.controller.tick();
        if self.screen != Screen::Play {
            return;
        }

        let snapshot = self.controller.snapshot();
        if snapshot.ai_finished_first
            && snapshot.phase == SessionPhase::Started
            && !self.announced_clip_end
        {
            self.announced_clip_end = true;
            self.state
                .set_status("The clip is over. Finish the grid anyway!");
        }
        if snapshot.phase == SessionPhase::Over && !self.announced_over {
            self.announced_over = true;
            if let Some(outcome) = snapshot.outcome {
                info!(%outcome, elapsed = snapshot.elapsed.as_secs(), "Session over");
                self.state.set_status(format!(
                    "{outcome} in {}",
                    format_mmss(snapshot.elapsed.as_secs())
                ));
            }
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if self.score_edit.is_some() {
            return self.handle_score_edit_key(key);
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Form => self.handle_form_key(key),
            Screen::Play => self.handle_play_key(key),
            Screen::Scores => self.handle_scores_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        const MENU_LEN: usize = 3;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.menu_cursor = (self.state.menu_cursor + 1).min(MENU_LEN - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.menu_cursor = self.state.menu_cursor.saturating_sub(1);
            }
            KeyCode::Enter => match self.state.menu_cursor {
                0 => {
                    if self.has_profile {
                        self.start_play()?;
                    } else {
                        self.open_form();
                    }
                }
                1 => self.open_scores(),
                _ => self.state.should_quit = true,
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            self.screen = Screen::Menu;
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.screen = Screen::Menu;
                self.state.set_status("Ready");
            }
            KeyCode::Tab | KeyCode::Down => form.next_focus(),
            KeyCode::BackTab | KeyCode::Up => form.prev_focus(),
            KeyCode::Enter => {
                if form.focus == FormFocus::Institution {
                    self.submit_form()?;
                } else {
                    form.next_focus();
                }
            }
            KeyCode::F(2) => {
                self.form = None;
                self.controller.set_profile(PlayerProfile::anonymous());
                self.has_profile = true;
                self.start_play()?;
            }
            KeyCode::Left => form.focused_mut().move_cursor(-1),
            KeyCode::Right => form.focused_mut().move_cursor(1),
            KeyCode::Home => form.focused_mut().move_home(),
            KeyCode::End => form.focused_mut().move_end(),
            KeyCode::Backspace => form.focused_mut().backspace(),
            KeyCode::Delete => form.focused_mut().delete(),
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    form.focused_mut().insert(c);
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn submit_form(&mut self) -> Result<()> {
        let result = match self.form.as_ref() {
            Some(form) => form.validate(),
            None => return Ok(()),
        };
        match result {
            Ok(profile) => {
                self.form = None;
                self.controller.set_profile(profile);
                self.has_profile = true;
                self.start_play()?;
            }
            Err(message) => {
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(message);
                }
            }
        }
        Ok(())
    }

    fn handle_play_key(&mut self, key: KeyEvent) -> Result<()> {
        let card_count = self.controller.snapshot().cards.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.controller.reset();
                self.screen = Screen::Menu;
                self.state.set_status("Ready");
            }
            KeyCode::Char('r') => self.start_play()?,
            KeyCode::Char('l') => {
                if self.controller.phase() == SessionPhase::Over {
                    self.controller.reset();
                    self.open_scores();
                }
            }
            KeyCode::Char('h') | KeyCode::Left => self.move_grid_cursor(-1, card_count),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_grid_cursor(GRID_COLUMNS as isize, card_count)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_grid_cursor(-(GRID_COLUMNS as isize), card_count)
            }
            KeyCode::Right => self.move_grid_cursor(1, card_count),
            KeyCode::Enter | KeyCode::Char(' ') => self.reveal_at_cursor(),
            _ => {}
        }
        Ok(())
    }

    fn handle_scores_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Menu;
                self.state.set_status("Ready");
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.scores.is_empty() {
                    self.state.score_cursor =
                        (self.state.score_cursor + 1).min(self.scores.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.score_cursor = self.state.score_cursor.saturating_sub(1);
            }
            KeyCode::Char('e') => {
                if let Some(record) = self.scores.get(self.state.score_cursor).cloned() {
                    self.score_edit = Some(ScoreEditModal::new(self.state.score_cursor, record));
                }
            }
            KeyCode::Char('d') => {
                if self.scores.is_empty() {
                    return Ok(());
                }
                match self.controller.remove_score(self.state.score_cursor) {
                    Ok(board) => {
                        self.scores = board;
                        if self.state.score_cursor >= self.scores.len() {
                            self.state.score_cursor = self.scores.len().saturating_sub(1);
                        }
                        self.state.set_status("Score removed");
                    }
                    Err(err) => self.state.set_status(format!("Delete failed: {err}")),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_score_edit_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(modal) = self.score_edit.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.score_edit = None;
                self.state.set_status("Edit cancelled");
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => modal.toggle_focus(),
            KeyCode::Enter => {
                let index = modal.index;
                let record = modal.updated_record();
                match self.controller.update_score(index, record) {
                    Ok(board) => {
                        self.scores = board;
                        self.score_edit = None;
                        self.state.set_status("Score updated");
                    }
                    Err(err) => self.state.set_status(format!("Update failed: {err}")),
                }
            }
            KeyCode::Left => modal.focused_mut().move_cursor(-1),
            KeyCode::Right => modal.focused_mut().move_cursor(1),
            KeyCode::Home => modal.focused_mut().move_home(),
            KeyCode::End => modal.focused_mut().move_end(),
            KeyCode::Backspace => modal.focused_mut().backspace(),
            KeyCode::Delete => modal.focused_mut().delete(),
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    modal.focused_mut().insert(c);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn open_form(&mut self) {
        self.form = Some(FormState::from_profile(self.controller.profile()));
        self.screen = Screen::Form;
        self.state.set_status("Enter your details to play");
    }

    fn open_scores(&mut self) {
        self.scores = self.controller.scores();
        self.state.score_cursor = 0;
        self.screen = Screen::Scores;
        self.state
            .set_status(format!("{} scores on the board", self.scores.len()));
    }

    fn start_play(&mut self) -> Result<()> {
        self.controller.reset();
        self.controller.start()?;
        self.announced_over = false;
        self.announced_clip_end = false;
        self.state.grid_cursor = 0;
        self.screen = Screen::Play;
        self.state.set_status("Memorize the cards!");
        Ok(())
    }

    fn move_grid_cursor(&mut self, delta: isize, card_count: usize) {
        if card_count == 0 {
            return;
        }
        let len = card_count as isize;
        let mut next = self.state.grid_cursor as isize + delta;
        if next < 0 {
            next = 0;
        } else if next >= len {
            next = len - 1;
        }
        self.state.grid_cursor = next as usize;
    }

    fn reveal_at_cursor(&mut self) {
        let snapshot = self.controller.snapshot();
        let Some(card) = snapshot.cards.get(self.state.grid_cursor) else {
            return;
        };
        match self.controller.reveal(card.id) {
            RevealOutcome::Matched { complete } => {
                if complete {
                    // Final status comes from the tick that observes Over.
                } else {
                    self.state.set_status("A pair!");
                }
            }
            RevealOutcome::Mismatched(_, _) => self.state.set_status("No match"),
            RevealOutcome::Flipped | RevealOutcome::Rejected => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Form => self.draw_form(frame),
            Screen::Play => self.draw_play(frame),
            Screen::Scores => self.draw_scores(frame),
        }
        if let Some(modal) = self.score_edit.clone() {
            self.render_score_edit(frame, &modal);
        }
    }

    fn draw_menu(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let banner_lines = block_font::render("MATCHTUI");
        let banner_height = banner_lines.len() as u16;
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((banner_height + 2).min(area.height)),
                Constraint::Min(3),
            ])
            .split(area);

        let banner_content: Vec<Line> = banner_lines
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        let banner = Paragraph::new(banner_content).alignment(Alignment::Center);
        frame.render_widget(banner, layout[0]);

        let menu_items = ["Play", "Leaderboard", "Quit"];
        let menu_height = (menu_items.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(layout[1].height);
        let menu_width = 28.min(layout[1].width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, layout[1]);

        let menu_lines: Vec<Line> = menu_items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
    }

    fn draw_form(&mut self, frame: &mut Frame) {
        let frame_area = frame.size();
        let mut width = cmp::min(60_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 30_u16);
        let height = 12_u16.min(frame_area.height.saturating_sub(2)).max(9_u16);
        let area = centered_rect(width, height, frame_area);

        let Some(form) = self.form.as_ref() else {
            return;
        };

        frame.render_widget(Clear, area);

        let field_line = |label: &str, field: &TextField, focused: bool| {
            let marker = if focused { "> " } else { "  " };
            Line::from(vec![
                Span::styled(
                    format!("{marker}{label:<12}"),
                    if focused {
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(self.theme.muted)
                    },
                ),
                Span::raw(field.input.clone()),
            ])
        };

        let mut lines = vec![
            field_line("Name", &form.name, form.focus == FormFocus::Name),
            field_line("Email", &form.email, form.focus == FormFocus::Email),
            field_line(
                "Institution",
                &form.institution,
                form.focus == FormFocus::Institution,
            ),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" next/submit  "),
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" switch  "),
                Span::styled("F2", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" skip  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" back"),
            ]),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(self.theme.danger),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Before you play"),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        let (field, row) = match form.focus {
            FormFocus::Name => (&form.name, 0_u16),
            FormFocus::Email => (&form.email, 1),
            FormFocus::Institution => (&form.institution, 2),
        };
        let cursor_x = (area.x + 15 + field.cursor as u16)
            .min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 1 + row;
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn draw_play(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let snapshot = self.controller.snapshot();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(CARD_HEIGHT),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_play_header(frame, chunks[0], &snapshot);
        self.render_grid(frame, chunks[1], &snapshot);
        self.render_status(frame, chunks[2]);

        if snapshot.phase == SessionPhase::Over {
            self.render_outcome_overlay(frame, &snapshot);
        }
    }

    fn render_play_header(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(18), Constraint::Min(10)])
            .split(area);

        let timer = Paragraph::new(Line::from(Span::styled(
            format!("Time {}", format_mmss(snapshot.elapsed.as_secs())),
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(timer, chunks[0]);

        match (snapshot.video.position, snapshot.video.duration) {
            (Some(position), Some(duration)) if duration > 0.0 => {
                let ratio = (position / duration).clamp(0.0, 1.0);
                let style = if snapshot.ai_finished_first {
                    Style::default().fg(self.theme.danger)
                } else {
                    Style::default().fg(self.theme.warning)
                };
                let gauge = Gauge::default()
                    .block(Block::default().borders(Borders::ALL).title("Opponent"))
                    .gauge_style(style)
                    .ratio(ratio)
                    .label(format!(
                        "{} / {}",
                        format_mmss(position as u64),
                        format_mmss(duration as u64)
                    ));
                frame.render_widget(gauge, chunks[1]);
            }
            _ => {
                let missing = Paragraph::new("Opponent clip unavailable")
                    .style(Style::default().fg(self.theme.muted))
                    .block(Block::default().borders(Borders::ALL).title("Opponent"));
                frame.render_widget(missing, chunks[1]);
            }
        }
    }

    fn render_grid(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        if snapshot.cards.is_empty() {
            let empty = Paragraph::new("No cards dealt")
                .style(Style::default().fg(self.theme.muted))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Cards"));
            frame.render_widget(empty, area);
            return;
        }

        let rows = snapshot.cards.len().div_ceil(GRID_COLUMNS);
        let grid_height = (rows as u16).saturating_mul(CARD_HEIGHT);
        let grid_width = (GRID_COLUMNS as u16).saturating_mul(7);
        let grid_area = centered_rect(
            grid_width.min(area.width),
            grid_height.min(area.height),
            area,
        );

        let row_constraints: Vec<Constraint> =
            (0..rows).map(|_| Constraint::Length(CARD_HEIGHT)).collect();
        let row_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(row_constraints)
            .split(grid_area);

        for (row_idx, row_area) in row_chunks.iter().enumerate() {
            let col_constraints: Vec<Constraint> =
                (0..GRID_COLUMNS).map(|_| Constraint::Length(7)).collect();
            let col_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(col_constraints)
                .split(*row_area);

            for (col_idx, col_area) in col_chunks.iter().enumerate() {
                let index = row_idx * GRID_COLUMNS + col_idx;
                let Some(card) = snapshot.cards.get(index) else {
                    continue;
                };

                let selected = index == self.state.grid_cursor;
                let face_style = if card.matched {
                    Style::default()
                        .fg(self.theme.success)
                        .add_modifier(Modifier::BOLD)
                } else if card.face_up {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                let border_style = if selected {
                    Style::default()
                        .fg(self.theme.selection_fg)
                        .bg(self.theme.selection_bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };

                let content = if card.face_up {
                    card.face.clone()
                } else {
                    "▒".to_string()
                };
                let widget = Paragraph::new(Line::from(Span::styled(content, face_style)))
                    .alignment(Alignment::Center)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(border_style),
                    );
                frame.render_widget(widget, *col_area);
            }
        }
    }

    fn render_outcome_overlay(&self, frame: &mut Frame, snapshot: &SessionSnapshot) {
        let Some(outcome) = snapshot.outcome else {
            return;
        };
        let frame_area = frame.size();
        let banner_lines = block_font::render(&outcome.to_string());
        let width = banner_lines
            .iter()
            .map(|line| line.chars().count() as u16)
            .max()
            .unwrap_or(20)
            .saturating_add(6)
            .min(frame_area.width);
        let height = (banner_lines.len() as u16 + 6).min(frame_area.height);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let color = self.theme.outcome_color(outcome);
        let mut lines: Vec<Line> = banner_lines
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "Cleared in {}",
            format_mmss(snapshot.elapsed.as_secs())
        )));
        lines.push(Line::from(vec![
            Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" play again  "),
            Span::styled("l", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" leaderboard  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" menu"),
        ]));

        let overlay = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Result"));
        frame.render_widget(overlay, area);
    }

    fn draw_scores(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        self.state.list_height = chunks[0].height.saturating_sub(2) as usize;

        let items: Vec<ListItem> = self
            .scores
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let line = Line::from(vec![
                    Span::styled(
                        format!("{:>3}. ", idx + 1),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(
                        format!("{:>5} ", format_mmss(record.time / 1000)),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{:<5} ", record.result),
                        Style::default().fg(self.theme.outcome_color(record.result)),
                    ),
                    Span::raw(format!("{}  ", record.name)),
                    Span::styled(
                        format!("{}  ", record.institution),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(
                        record.date.format("%Y-%m-%d").to_string(),
                        Style::default().fg(self.theme.muted),
                    ),
                ]);
                ListItem::new(line)
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Leaderboard (e edit, d delete, Esc back)"),
            )
            .highlight_style(
                Style::default()
                    .fg(self.theme.selection_fg)
                    .bg(self.theme.selection_bg)
                    .add_modifier(Modifier::BOLD),
            );
        let mut list_state = ListState::default();
        if !self.scores.is_empty() {
            list_state.select(Some(self.state.score_cursor));
        }
        frame.render_stateful_widget(list, chunks[0], &mut list_state);

        self.render_status(frame, chunks[1]);
    }

    fn render_score_edit(&self, frame: &mut Frame, modal: &ScoreEditModal) {
        let frame_area = frame.size();
        let mut width = cmp::min(60_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 30_u16);
        let height = 8_u16.min(frame_area.height.saturating_sub(2)).max(6_u16);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let field_line = |label: &str, field: &TextField, focused: bool| {
            let marker = if focused { "> " } else { "  " };
            Line::from(vec![
                Span::styled(
                    format!("{marker}{label:<12}"),
                    if focused {
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(self.theme.muted)
                    },
                ),
                Span::raw(field.input.clone()),
            ])
        };

        let lines = vec![
            field_line("Name", &modal.name, modal.focus == EditFocus::Name),
            field_line(
                "Institution",
                &modal.institution,
                modal.focus == EditFocus::Institution,
            ),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" save  "),
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" switch  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
        ];

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Edit score"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        let (field, row) = match modal.focus {
            EditFocus::Name => (&modal.name, 0_u16),
            EditFocus::Institution => (&modal.institution, 1),
        };
        let cursor_x = (area.x + 15 + field.cursor as u16)
            .min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 1 + row;
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let status = Paragraph::new(self.state.status.clone())
            .style(Style::default().fg(self.theme.primary_fg))
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>, tick_rate: Duration) {
    thread::spawn(move || loop {
        match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn format_mmss(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
