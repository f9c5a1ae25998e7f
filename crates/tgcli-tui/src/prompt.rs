// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{KeyReader, Theme, centered_rect};
use anyhow::{Context, Result};
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tgcli_app::{Key, ReplyPrompt};

/// Reply editor drawn over the screen; reads keys from the main queue
/// until Enter or Esc.
pub struct TerminalPrompt<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    keys: &'a KeyReader,
    theme: Theme,
}

impl<'a, B: Backend> TerminalPrompt<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, keys: &'a KeyReader, theme: Theme) -> Self {
        Self {
            terminal,
            keys,
            theme,
        }
    }
}

impl<B: Backend> ReplyPrompt for TerminalPrompt<'_, B> {
    fn prompt_reply(&mut self, quoted: &str) -> Result<Option<String>> {
        let theme = self.theme;
        let mut input = String::new();
        loop {
            self.terminal
                .draw(|frame| render_prompt(frame, quoted, &input, theme))
                .context("draw reply prompt")?;

            match self.keys.next_key() {
                None | Some(Key::Esc) => return Ok(None),
                Some(Key::Enter) => return Ok(Some(input)),
                Some(Key::Backspace) => {
                    input.pop();
                }
                Some(Key::Char(ch)) => input.push(ch),
                Some(_) => {}
            }
        }
    }
}

fn render_prompt(frame: &mut ratatui::Frame<'_>, quoted: &str, input: &str, theme: Theme) {
    let area = centered_rect(80, 40, frame.area());
    frame.render_widget(Clear, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let quote = Paragraph::new(format!("> {quoted}"))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("reply to")
                .title_style(theme.title()),
        );
    frame.render_widget(quote, layout[0]);

    let editor = Paragraph::new(input.to_owned()).block(Block::default().borders(Borders::ALL));
    frame.render_widget(editor, layout[1]);

    let inner_width = layout[1].width.saturating_sub(2);
    let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    frame.set_cursor_position((
        layout[1].x + 1 + typed.min(inner_width.saturating_sub(1)),
        layout[1].y + 1,
    ));

    frame.render_widget(
        Paragraph::new("Enter send  Esc cancel").style(theme.hint()),
        layout[2],
    );
}
