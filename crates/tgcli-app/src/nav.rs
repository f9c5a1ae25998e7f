// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Key-driven navigation over the dialog list and chat thread screens.
//!
//! One key is handled at a time. Network calls block the caller; their
//! failures become status text and leave the state as it was before the call.

use crate::{AppCommand, AppState, Key, MessagingClient, ReplyPrompt, ScreenMode};

/// Page size for the "load older history" request.
pub const OLDER_HISTORY_LIMIT: usize = 100;

const QUOTE_PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

pub fn handle_key<C, P>(
    state: &mut AppState,
    client: &mut C,
    prompt: &mut P,
    key: Key,
) -> KeyOutcome
where
    C: MessagingClient + ?Sized,
    P: ReplyPrompt + ?Sized,
{
    state.dispatch(AppCommand::ClearStatus);
    match state.mode {
        ScreenMode::DialogList => handle_dialog_list_key(state, client, key),
        ScreenMode::ChatThread => {
            handle_chat_key(state, client, prompt, key);
            KeyOutcome::Continue
        }
        ScreenMode::Help => {
            if key == Key::Esc || key.letter() == Some('b') {
                state.dispatch(AppCommand::CloseHelp);
            }
            KeyOutcome::Continue
        }
    }
}

fn handle_dialog_list_key<C>(state: &mut AppState, client: &mut C, key: Key) -> KeyOutcome
where
    C: MessagingClient + ?Sized,
{
    match key {
        Key::Char(digit) if digit.is_ascii_digit() => {
            state.dispatch(AppCommand::PushDigit(digit));
        }
        Key::Enter if !state.numeric_buffer.is_empty() => open_selected_dialog(state),
        Key::Char(_) => match key.letter() {
            Some('n') => {
                state.dispatch(AppCommand::NextPage);
            }
            Some('p') => {
                state.dispatch(AppCommand::PrevPage);
            }
            Some('u') => {
                state.dispatch(AppCommand::ToggleUnread);
                tracing::debug!(
                    only_unread = state.dialog_cursor.only_unread,
                    "unread filter toggled"
                );
            }
            Some('q') => {
                state.dispatch(AppCommand::ClearNumeric);
                if let Err(error) = client.disconnect() {
                    tracing::warn!(error = %format!("{error:#}"), "disconnect failed");
                }
                tracing::info!("quit requested");
                return KeyOutcome::Quit;
            }
            _ => {}
        },
        _ => {}
    }
    KeyOutcome::Continue
}

fn open_selected_dialog(state: &mut AppState) {
    let Some(row) = state.take_numeric_selection() else {
        return;
    };
    let Some(dialog_id) = state.dialog_for_row(row) else {
        tracing::debug!(row, "dialog selection out of range");
        return;
    };
    tracing::info!(dialog_id = dialog_id.get(), row, "opening dialog");
    state.dispatch(AppCommand::OpenDialog(dialog_id));
}

fn handle_chat_key<C, P>(state: &mut AppState, client: &mut C, prompt: &mut P, key: Key)
where
    C: MessagingClient + ?Sized,
    P: ReplyPrompt + ?Sized,
{
    match key {
        Key::Up => {
            state.dispatch(AppCommand::SelectOlder);
        }
        Key::Down => {
            state.dispatch(AppCommand::SelectNewer);
        }
        Key::Char(_) => match key.letter() {
            Some('u') => load_older_history(state, client),
            Some('r') => reply_to_selected(state, client, prompt),
            Some('b') => back_to_dialogs(state, client),
            _ => {}
        },
        _ => {}
    }
}

fn load_older_history<C>(state: &mut AppState, client: &mut C)
where
    C: MessagingClient + ?Sized,
{
    let (Some(dialog_id), Some(oldest_id)) =
        (state.chat_cursor.dialog_id, state.messages.oldest_id())
    else {
        return;
    };

    match client.get_messages(dialog_id, OLDER_HISTORY_LIMIT, Some(oldest_id)) {
        Ok(older) => {
            let count = older.len();
            state.dispatch(AppCommand::OlderLoaded(older));
            tracing::info!(
                dialog_id = dialog_id.get(),
                before = oldest_id.get(),
                count,
                "loaded older messages"
            );
            let status = if count == 0 {
                "no older messages".to_owned()
            } else {
                format!("loaded {count} older messages")
            };
            state.dispatch(AppCommand::SetStatus(status));
        }
        Err(error) => {
            tracing::warn!(
                dialog_id = dialog_id.get(),
                error = %format!("{error:#}"),
                "older history fetch failed"
            );
            state.dispatch(AppCommand::SetStatus(format!(
                "load older messages failed: {error:#}"
            )));
        }
    }
}

fn reply_to_selected<C, P>(state: &mut AppState, client: &mut C, prompt: &mut P)
where
    C: MessagingClient + ?Sized,
    P: ReplyPrompt + ?Sized,
{
    let Some(dialog_id) = state.chat_cursor.dialog_id else {
        return;
    };
    let Some(target) = state.selected_message() else {
        return;
    };
    let target_id = target.id;
    let quoted = quote_preview(target.text_or_placeholder());

    let text = match prompt.prompt_reply(&quoted) {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => return,
        Err(error) => {
            state.dispatch(AppCommand::SetStatus(format!("reply prompt failed: {error:#}")));
            return;
        }
    };

    match client.send_message(dialog_id, &text, Some(target_id)) {
        Ok(sent_id) => {
            tracing::info!(
                dialog_id = dialog_id.get(),
                reply_to = target_id.get(),
                sent_id = sent_id.get(),
                "reply sent"
            );
            state.dispatch(AppCommand::SetStatus("reply sent".to_owned()));
        }
        Err(error) => {
            tracing::warn!(
                dialog_id = dialog_id.get(),
                error = %format!("{error:#}"),
                "reply failed"
            );
            state.dispatch(AppCommand::SetStatus(format!("send reply failed: {error:#}")));
        }
    }
}

fn back_to_dialogs<C>(state: &mut AppState, client: &mut C)
where
    C: MessagingClient + ?Sized,
{
    let ack_error = match (state.chat_cursor.dialog_id, state.messages.max_id()) {
        (Some(dialog_id), Some(max_id)) => client
            .send_read_acknowledge(dialog_id, max_id)
            .err()
            .inspect(|error| {
                tracing::warn!(
                    dialog_id = dialog_id.get(),
                    max_id = max_id.get(),
                    error = %format!("{error:#}"),
                    "read acknowledge failed"
                );
            }),
        _ => None,
    };

    state.dispatch(AppCommand::CloseChat);
    if let Some(error) = ack_error {
        state.dispatch(AppCommand::SetStatus(format!("mark as read failed: {error:#}")));
    }
}

fn quote_preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(QUOTE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
