// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Theme;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use tgcli_app::{AppCommand, AppState, Message, MessagingClient};
use time::UtcOffset;
use time::macros::format_description;

/// Most recent messages fetched when a thread opens.
pub const INITIAL_HISTORY_LIMIT: usize = 50;

const HINTS: &str = "↑/↓ select  u older  r reply  b back";

pub fn ensure_thread_loaded<C>(state: &mut AppState, client: &mut C)
where
    C: MessagingClient + ?Sized,
{
    let Some(dialog_id) = state.chat_cursor.dialog_id else {
        return;
    };
    if state.messages.is_loaded() {
        return;
    }
    match client.get_messages(dialog_id, INITIAL_HISTORY_LIMIT, None) {
        Ok(messages) => {
            tracing::info!(
                dialog_id = dialog_id.get(),
                count = messages.len(),
                "thread loaded"
            );
            state.dispatch(AppCommand::ThreadLoaded(messages));
        }
        Err(error) => {
            tracing::warn!(
                dialog_id = dialog_id.get(),
                error = %format!("{error:#}"),
                "thread fetch failed"
            );
            state.dispatch(AppCommand::SetStatus(format!(
                "load messages failed: {error:#}"
            )));
        }
    }
}

/// One display line per buffered message, newest first.
pub fn message_lines(state: &AppState, local_offset: UtcOffset) -> Vec<String> {
    state
        .messages
        .entries()
        .iter()
        .enumerate()
        .map(|(index, message)| {
            message_line(
                message,
                index == state.chat_cursor.selected_index,
                local_offset,
            )
        })
        .collect()
}

pub fn message_line(message: &Message, selected: bool, local_offset: UtcOffset) -> String {
    let marker = if selected { "→ " } else { "  " };
    let time = message
        .date
        .to_offset(local_offset)
        .format(&format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| "--:--".to_owned());
    let text = message.text_or_placeholder().replace(['\n', '\r'], " ");
    format!("{marker}{time} {}: {text}", message.sender_label())
}

pub fn title_text(state: &AppState) -> String {
    let Some(dialog_id) = state.chat_cursor.dialog_id else {
        return "chat".to_owned();
    };
    let name = state
        .dialogs
        .entries()
        .iter()
        .find(|dialog| dialog.id == dialog_id)
        .map(|dialog| dialog.display_name());
    let loaded = state.messages.len();
    match name {
        Some(name) if name != dialog_id.to_string() => {
            format!("chat {dialog_id} · {name} · {loaded} loaded")
        }
        _ => format!("chat {dialog_id} · {loaded} loaded"),
    }
}

/// First line to show so the selection stays inside a viewport of `height` rows.
pub fn scroll_offset(selected_index: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    (selected_index + 1).saturating_sub(height)
}

pub fn render(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    theme: Theme,
    local_offset: UtcOffset,
) {
    if state.chat_cursor.dialog_id.is_none() {
        let panel = Paragraph::new("no chat selected").style(theme.error()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("chat")
                .title_style(theme.title()),
        );
        frame.render_widget(panel, area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title_text(state))
        .title_style(theme.title());

    let body = if state.messages.is_empty() {
        let message = if state.messages.is_loaded() {
            "no messages"
        } else {
            "loading messages…"
        };
        Paragraph::new(message).block(block)
    } else {
        let selected = state.chat_cursor.selected_index;
        let lines = message_lines(state, local_offset)
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                if index == selected {
                    Line::styled(line, Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    Line::raw(line)
                }
            })
            .collect::<Vec<_>>();
        let height = usize::from(layout[0].height.saturating_sub(2));
        let scroll = u16::try_from(scroll_offset(selected, height)).unwrap_or(u16::MAX);
        Paragraph::new(lines).block(block).scroll((scroll, 0))
    };
    frame.render_widget(body, layout[0]);

    frame.render_widget(Paragraph::new(HINTS).style(theme.hint()), layout[1]);
}

#[cfg(test)]
mod tests {
    use super::{message_line, message_lines, scroll_offset, title_text};
    use tgcli_app::{AppCommand, AppState, DialogId, Message, MessageId};
    use tgcli_testkit::{fixture_datetime, sample_dialog, sample_thread};
    use time::UtcOffset;
    use time::macros::offset;

    fn open(thread: Vec<tgcli_app::Message>) -> AppState {
        let mut state = AppState::new(20, false);
        state.dispatch(AppCommand::DialogsLoaded(vec![sample_dialog(9, "Avery", 0)]));
        state.dispatch(AppCommand::OpenDialog(DialogId::new(9)));
        let mut thread = thread;
        thread.reverse();
        state.dispatch(AppCommand::ThreadLoaded(thread));
        state
    }

    #[test]
    fn lines_are_newest_first_with_selection_marker() {
        let mut state = open(sample_thread(1, 3));
        state.dispatch(AppCommand::SelectOlder);

        let lines = message_lines(&state, UtcOffset::UTC);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  "));
        assert!(lines[0].ends_with("message 3"));
        assert!(lines[1].starts_with("→ "));
        assert!(lines[1].ends_with("message 2"));
    }

    #[test]
    fn line_uses_local_time_and_placeholders() {
        let message = Message {
            id: MessageId::new(1),
            date: fixture_datetime(),
            sender_id: None,
            text: None,
        };
        assert_eq!(message_line(&message, false, UtcOffset::UTC), "  00:00 ?: <media>");
        assert_eq!(
            message_line(&message, true, offset!(+3)),
            "→ 03:00 ?: <media>"
        );
    }

    #[test]
    fn title_names_dialog_and_count() {
        let state = open(sample_thread(1, 4));
        assert_eq!(title_text(&state), "chat 9 · Avery · 4 loaded");
        assert_eq!(title_text(&AppState::default()), "chat");
    }

    #[test]
    fn scroll_keeps_selection_visible() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(9, 10), 0);
        assert_eq!(scroll_offset(10, 10), 1);
        assert_eq!(scroll_offset(49, 10), 40);
        assert_eq!(scroll_offset(3, 0), 0);
    }
}
