// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Dialog, DialogId, Message, MessageId};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    DialogList,
    ChatThread,
    /// Reserved; no key enters it.
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogCursor {
    pub page_size: usize,
    pub offset: usize,
    pub only_unread: bool,
}

impl Default for DialogCursor {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
            only_unread: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChatCursor {
    pub dialog_id: Option<DialogId>,
    pub message_offset: usize,
    pub selected_index: usize,
}

/// Dialog summaries from the last bounded fetch, already filtered by the
/// unread flag that was active at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DialogCache {
    entries: Vec<Dialog>,
    loaded: bool,
}

impl DialogCache {
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Dialog] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Dialog> {
        self.entries.get(index)
    }

    /// Window `[offset, offset + page_size)` clamped to the cached count.
    pub fn page(&self, offset: usize, page_size: usize) -> &[Dialog] {
        let start = offset.min(self.entries.len());
        let end = offset.saturating_add(page_size).min(self.entries.len());
        &self.entries[start..end]
    }

    fn replace(&mut self, entries: Vec<Dialog>) {
        self.entries = entries;
        self.loaded = true;
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.loaded = false;
    }
}

/// Messages of the open thread, newest first. Index 0 is the most recent
/// message, which lines up with `ChatCursor::selected_index`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageBuffer {
    entries: Vec<Message>,
    loaded: bool,
}

impl MessageBuffer {
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.entries.get(index)
    }

    pub fn oldest_id(&self) -> Option<MessageId> {
        self.entries.last().map(|message| message.id)
    }

    pub fn max_id(&self) -> Option<MessageId> {
        self.entries.iter().map(|message| message.id).max()
    }

    fn replace(&mut self, entries: Vec<Message>) {
        self.entries = entries;
        self.loaded = true;
    }

    fn extend_older(&mut self, older: Vec<Message>) -> usize {
        let count = older.len();
        self.entries.extend(older);
        count
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.loaded = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: ScreenMode,
    pub dialog_cursor: DialogCursor,
    pub chat_cursor: ChatCursor,
    pub numeric_buffer: String,
    pub dialogs: DialogCache,
    pub messages: MessageBuffer,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: ScreenMode::DialogList,
            dialog_cursor: DialogCursor::default(),
            chat_cursor: ChatCursor::default(),
            numeric_buffer: String::new(),
            dialogs: DialogCache::default(),
            messages: MessageBuffer::default(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    PushDigit(char),
    ClearNumeric,
    NextPage,
    PrevPage,
    ToggleUnread,
    DialogsLoaded(Vec<Dialog>),
    OpenDialog(DialogId),
    ThreadLoaded(Vec<Message>),
    OlderLoaded(Vec<Message>),
    SelectOlder,
    SelectNewer,
    CloseChat,
    CloseHelp,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    NumericBufferChanged(String),
    PageChanged(usize),
    UnreadFilterChanged(bool),
    DialogsReplaced(usize),
    ModeChanged(ScreenMode),
    ThreadReplaced(usize),
    OlderAppended(usize),
    SelectionChanged(usize),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(page_size: usize, only_unread: bool) -> Self {
        Self {
            dialog_cursor: DialogCursor {
                page_size: page_size.max(1),
                offset: 0,
                only_unread,
            },
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::PushDigit(digit) => {
                if !digit.is_ascii_digit() || (digit == '0' && self.numeric_buffer.is_empty()) {
                    return Vec::new();
                }
                self.numeric_buffer.push(digit);
                vec![AppEvent::NumericBufferChanged(self.numeric_buffer.clone())]
            }
            AppCommand::ClearNumeric => self.clear_numeric().into_iter().collect(),
            AppCommand::NextPage => {
                let mut events: Vec<AppEvent> = self.clear_numeric().into_iter().collect();
                let cursor = &mut self.dialog_cursor;
                if cursor.offset + cursor.page_size < self.dialogs.len() {
                    cursor.offset += cursor.page_size;
                    events.push(AppEvent::PageChanged(cursor.offset));
                }
                events
            }
            AppCommand::PrevPage => {
                let mut events: Vec<AppEvent> = self.clear_numeric().into_iter().collect();
                let cursor = &mut self.dialog_cursor;
                if cursor.offset >= cursor.page_size {
                    cursor.offset -= cursor.page_size;
                    events.push(AppEvent::PageChanged(cursor.offset));
                }
                events
            }
            AppCommand::ToggleUnread => {
                let mut events: Vec<AppEvent> = self.clear_numeric().into_iter().collect();
                self.dialog_cursor.only_unread = !self.dialog_cursor.only_unread;
                self.dialog_cursor.offset = 0;
                self.dialogs.clear();
                events.push(AppEvent::UnreadFilterChanged(
                    self.dialog_cursor.only_unread,
                ));
                events.push(AppEvent::PageChanged(0));
                events
            }
            AppCommand::DialogsLoaded(dialogs) => {
                self.dialogs.replace(dialogs);
                if self.dialog_cursor.offset >= self.dialogs.len() {
                    self.dialog_cursor.offset = 0;
                }
                vec![AppEvent::DialogsReplaced(self.dialogs.len())]
            }
            AppCommand::OpenDialog(dialog_id) => {
                self.numeric_buffer.clear();
                self.chat_cursor = ChatCursor {
                    dialog_id: Some(dialog_id),
                    ..ChatCursor::default()
                };
                self.messages.clear();
                self.mode = ScreenMode::ChatThread;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ThreadLoaded(messages) => {
                self.messages.replace(messages);
                self.chat_cursor.selected_index = 0;
                self.chat_cursor.message_offset = 0;
                vec![AppEvent::ThreadReplaced(self.messages.len())]
            }
            AppCommand::OlderLoaded(older) => {
                let count = self.messages.extend_older(older);
                self.chat_cursor.message_offset += count;
                vec![AppEvent::OlderAppended(count)]
            }
            AppCommand::SelectOlder => {
                let len = self.messages.len();
                if len > 0 && self.chat_cursor.selected_index < len - 1 {
                    self.chat_cursor.selected_index += 1;
                    return vec![AppEvent::SelectionChanged(self.chat_cursor.selected_index)];
                }
                Vec::new()
            }
            AppCommand::SelectNewer => {
                if self.chat_cursor.selected_index > 0 {
                    self.chat_cursor.selected_index -= 1;
                    return vec![AppEvent::SelectionChanged(self.chat_cursor.selected_index)];
                }
                Vec::new()
            }
            AppCommand::CloseChat => {
                self.chat_cursor = ChatCursor::default();
                self.messages.clear();
                self.numeric_buffer.clear();
                self.mode = ScreenMode::DialogList;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::CloseHelp => {
                if self.mode != ScreenMode::Help {
                    return Vec::new();
                }
                self.mode = ScreenMode::DialogList;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                if self.status_line.take().is_some() {
                    return vec![AppEvent::StatusCleared];
                }
                Vec::new()
            }
        }
    }

    /// Consumes the numeric buffer and returns the row number it spelled, if any.
    pub fn take_numeric_selection(&mut self) -> Option<usize> {
        let raw = std::mem::take(&mut self.numeric_buffer);
        raw.parse().ok()
    }

    /// Dialog behind a 1-based row number on the current page.
    pub fn dialog_for_row(&self, row: usize) -> Option<DialogId> {
        if row == 0 || row > self.dialog_cursor.page_size {
            return None;
        }
        self.dialogs
            .get(self.dialog_cursor.offset + row - 1)
            .map(|dialog| dialog.id)
    }

    pub fn selected_message(&self) -> Option<&Message> {
        self.messages.get(self.chat_cursor.selected_index)
    }

    fn clear_numeric(&mut self) -> Option<AppEvent> {
        if self.numeric_buffer.is_empty() {
            return None;
        }
        self.numeric_buffer.clear();
        Some(AppEvent::NumericBufferChanged(String::new()))
    }
}
