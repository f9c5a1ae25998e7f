// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Theme;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use tgcli_app::{AppCommand, AppState, MEDIA_PLACEHOLDER, MessagingClient};

/// Hard cap for one dialog listing.
pub const DIALOG_FETCH_LIMIT: usize = 100;
pub const PREVIEW_CHARS: usize = 40;

const HINTS: &str = "n/p pages  u unread  digits+Enter open  q quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRow {
    /// 1-based running index across pages.
    pub number: usize,
    pub glyph: &'static str,
    pub name: String,
    pub unread: String,
    pub preview: String,
}

pub fn ensure_dialogs_loaded<C>(state: &mut AppState, client: &mut C)
where
    C: MessagingClient + ?Sized,
{
    if state.dialogs.is_loaded() {
        return;
    }
    let only_unread = state.dialog_cursor.only_unread;
    match client.iter_dialogs(DIALOG_FETCH_LIMIT) {
        Ok(mut dialogs) => {
            let fetched = dialogs.len();
            if only_unread {
                dialogs.retain(|dialog| dialog.has_unread());
            }
            tracing::info!(fetched, kept = dialogs.len(), only_unread, "dialogs loaded");
            state.dispatch(AppCommand::DialogsLoaded(dialogs));
        }
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "dialog fetch failed");
            state.dispatch(AppCommand::SetStatus(format!(
                "load dialogs failed: {error:#}"
            )));
        }
    }
}

/// Rows of the current page window.
pub fn visible_rows(state: &AppState) -> Vec<DialogRow> {
    let cursor = &state.dialog_cursor;
    state
        .dialogs
        .page(cursor.offset, cursor.page_size)
        .iter()
        .enumerate()
        .map(|(index, dialog)| DialogRow {
            number: cursor.offset + index + 1,
            glyph: dialog.kind().glyph(),
            name: dialog.display_name(),
            unread: if dialog.has_unread() {
                dialog.unread_count.to_string()
            } else {
                String::new()
            },
            preview: preview_text(dialog.last_message.as_deref()),
        })
        .collect()
}

pub fn preview_text(last_message: Option<&str>) -> String {
    match last_message {
        Some(text) if !text.trim().is_empty() => {
            truncate_chars(&text.replace(['\n', '\r'], " "), PREVIEW_CHARS)
        }
        _ => MEDIA_PLACEHOLDER.to_owned(),
    }
}

pub fn footer_text(state: &AppState) -> String {
    if state.numeric_buffer.is_empty() {
        HINTS.to_owned()
    } else {
        format!("{HINTS}  ▶ {}", state.numeric_buffer)
    }
}

pub fn title_text(state: &AppState) -> String {
    let cursor = &state.dialog_cursor;
    let filter = if cursor.only_unread {
        "unread only"
    } else {
        "all"
    };
    let total = state.dialogs.len();
    if total == 0 {
        return format!("dialogs · {filter}");
    }
    let last = (cursor.offset + cursor.page_size).min(total);
    format!("dialogs · {filter} · {}-{last} of {total}", cursor.offset + 1)
}

pub fn render(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, theme: Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title_text(state))
        .title_style(theme.title());

    let rows = visible_rows(state);
    if rows.is_empty() {
        let message = match (state.dialogs.is_loaded(), state.dialog_cursor.only_unread) {
            (false, _) => "loading dialogs…",
            (true, true) => "no unread dialogs",
            (true, false) => "no dialogs",
        };
        frame.render_widget(Paragraph::new(message).block(block), layout[0]);
    } else {
        let header = Row::new(["#", "", "name", "unread", "last message"]).style(theme.header());
        let body = rows.into_iter().map(|row| {
            Row::new([
                Cell::from(row.number.to_string()),
                Cell::from(row.glyph),
                Cell::from(row.name),
                Cell::from(row.unread).style(theme.unread()),
                Cell::from(row.preview),
            ])
        });
        let widths = [
            Constraint::Length(4),
            Constraint::Length(2),
            Constraint::Percentage(35),
            Constraint::Length(6),
            Constraint::Min(10),
        ];
        let table = Table::new(body, widths).header(header).block(block);
        frame.render_widget(table, layout[0]);
    }

    frame.render_widget(
        Paragraph::new(footer_text(state)).style(theme.hint()),
        layout[1],
    );
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}
