// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod input;
pub mod prompt;
pub mod views;

pub use input::{DEFAULT_POLL_INTERVAL, KeyReader, KeyWait, decode_event};
pub use prompt::TerminalPrompt;

use anyhow::{Context, Result};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute, terminal};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::io;
use std::time::Duration;
use tgcli_app::{AppState, KeyOutcome, MessagingClient, ScreenMode, handle_key};
use time::UtcOffset;

/// Idle redraw cadence, roughly 15 frames per second.
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(66);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Default,
    Mono,
}

impl Theme {
    pub const ALL: [Self; 2] = [Self::Default, Self::Mono];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.name().eq_ignore_ascii_case(raw.trim()))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Mono => "mono",
        }
    }

    fn title(self) -> Style {
        match self {
            Self::Default => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            Self::Mono => Style::default().add_modifier(Modifier::BOLD),
        }
    }

    fn header(self) -> Style {
        match self {
            Self::Default => Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            Self::Mono => Style::default().add_modifier(Modifier::BOLD),
        }
    }

    fn unread(self) -> Style {
        match self {
            Self::Default => Style::default().fg(Color::Green),
            Self::Mono => Style::default().add_modifier(Modifier::BOLD),
        }
    }

    fn hint(self) -> Style {
        match self {
            Self::Default => Style::default().fg(Color::DarkGray),
            Self::Mono => Style::default().add_modifier(Modifier::DIM),
        }
    }

    fn status(self) -> Style {
        match self {
            Self::Default => Style::default().fg(Color::Yellow),
            Self::Mono => Style::default(),
        }
    }

    fn error(self) -> Style {
        match self {
            Self::Default => Style::default().fg(Color::Red),
            Self::Mono => Style::default().add_modifier(Modifier::BOLD),
        }
    }
}

/// Everything the loop, controller and renderers share, built once at startup.
pub struct AppContext<C> {
    pub state: AppState,
    pub client: C,
    pub theme: Theme,
    /// Resolved before any thread is spawned; `time` refuses the lookup afterwards.
    pub local_offset: UtcOffset,
}

impl<C: MessagingClient> AppContext<C> {
    pub fn new(client: C, state: AppState, theme: Theme, local_offset: UtcOffset) -> Self {
        Self {
            state,
            client,
            theme,
            local_offset,
        }
    }
}

pub fn run_app<C: MessagingClient>(ctx: &mut AppContext<C>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut keys = KeyReader::start(DEFAULT_POLL_INTERVAL);
    tracing::info!("main loop started");
    let result = event_loop(&mut terminal, ctx, &keys);
    keys.stop();

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        terminal::LeaveAlternateScreen,
        cursor::Show
    )
    .context("leave alternate screen")?;
    result
}

/// Draw, wait for a key, handle it, refill caches; strictly in sequence.
pub fn event_loop<B, C>(
    terminal: &mut Terminal<B>,
    ctx: &mut AppContext<C>,
    keys: &KeyReader,
) -> Result<()>
where
    B: Backend,
    C: MessagingClient,
{
    views::prepare(&mut ctx.state, &mut ctx.client);
    loop {
        terminal
            .draw(|frame| render(frame, ctx))
            .context("draw frame")?;

        let key = match keys.next_key_timeout(REDRAW_INTERVAL) {
            KeyWait::Key(key) => key,
            KeyWait::Timeout => continue,
            KeyWait::Closed => {
                tracing::warn!("input closed; leaving main loop");
                return Ok(());
            }
        };

        let outcome = {
            let mut prompt = TerminalPrompt::new(terminal, keys, ctx.theme);
            handle_key(&mut ctx.state, &mut ctx.client, &mut prompt, key)
        };
        if outcome == KeyOutcome::Quit {
            tracing::info!("main loop finished");
            return Ok(());
        }
        views::prepare(&mut ctx.state, &mut ctx.client);
    }
}

pub fn render<C>(frame: &mut ratatui::Frame<'_>, ctx: &AppContext<C>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(3)])
        .split(frame.area());

    let state = &ctx.state;
    match state.mode {
        ScreenMode::DialogList => views::dialogs::render(frame, layout[0], state, ctx.theme),
        ScreenMode::ChatThread => {
            views::chat::render(frame, layout[0], state, ctx.theme, ctx.local_offset);
        }
        ScreenMode::Help => render_help(frame, layout[0], ctx.theme),
    }

    let status = Paragraph::new(state.status_line.clone().unwrap_or_default())
        .style(ctx.theme.status())
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[1]);
}

fn render_help(frame: &mut ratatui::Frame<'_>, area: Rect, theme: Theme) {
    let text = [
        "dialog list",
        "  1-9…  type a row number, Enter opens it",
        "  n / p  next / previous page",
        "  u      toggle unread-only",
        "  q      quit",
        "",
        "chat",
        "  ↑ / ↓  select older / newer message",
        "  u      load older history",
        "  r      reply to the selected message",
        "  b      back to the dialog list",
        "",
        "Esc closes this screen",
    ]
    .join("\n");
    let help = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("help")
            .title_style(theme.title()),
    );
    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
