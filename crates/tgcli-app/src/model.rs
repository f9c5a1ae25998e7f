// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogKind {
    User,
    Group,
    Channel,
    Unknown,
}

impl DialogKind {
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::User => "👤",
            Self::Group => "💬",
            Self::Channel => "📢",
            Self::Unknown => "?",
        }
    }
}

/// Conversation summary as returned by the dialog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: DialogId,
    pub name: String,
    pub unread_count: u32,
    /// Text of the newest message; `None` when there is none or it carries only media.
    pub last_message: Option<String>,
    pub is_user: bool,
    pub is_group: bool,
    pub is_channel: bool,
}

impl Dialog {
    /// Category by flag priority: user, then group, then channel.
    pub const fn kind(&self) -> DialogKind {
        if self.is_user {
            DialogKind::User
        } else if self.is_group {
            DialogKind::Group
        } else if self.is_channel {
            DialogKind::Channel
        } else {
            DialogKind::Unknown
        }
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }

    pub const fn has_unread(&self) -> bool {
        self.unread_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub date: OffsetDateTime,
    pub sender_id: Option<UserId>,
    pub text: Option<String>,
}

impl Message {
    pub fn text_or_placeholder(&self) -> &str {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => MEDIA_PLACEHOLDER,
        }
    }

    pub fn sender_label(&self) -> String {
        self.sender_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_owned())
    }
}

pub const MEDIA_PLACEHOLDER: &str = "<media>";

/// Symbolic key contract shared by the input source and the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Backspace,
    Char(char),
    Other,
}

impl Key {
    /// Lowercased printable character, if any.
    pub fn letter(self) -> Option<char> {
        match self {
            Self::Char(ch) => Some(ch.to_ascii_lowercase()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Dialog, DialogKind, Key, MEDIA_PLACEHOLDER, Message};
    use crate::{DialogId, MessageId, UserId};
    use time::OffsetDateTime;

    fn dialog(is_user: bool, is_group: bool, is_channel: bool) -> Dialog {
        Dialog {
            id: DialogId::new(77),
            name: String::new(),
            unread_count: 0,
            last_message: None,
            is_user,
            is_group,
            is_channel,
        }
    }

    #[test]
    fn kind_follows_flag_priority() {
        assert_eq!(dialog(true, true, true).kind(), DialogKind::User);
        assert_eq!(dialog(false, true, true).kind(), DialogKind::Group);
        assert_eq!(dialog(false, false, true).kind(), DialogKind::Channel);
        assert_eq!(dialog(false, false, false).kind(), DialogKind::Unknown);
        assert_eq!(DialogKind::Unknown.glyph(), "?");
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let mut entry = dialog(true, false, false);
        assert_eq!(entry.display_name(), "77");
        entry.name = "Alice".to_owned();
        assert_eq!(entry.display_name(), "Alice");
    }

    #[test]
    fn message_placeholders() {
        let message = Message {
            id: MessageId::new(1),
            date: OffsetDateTime::UNIX_EPOCH,
            sender_id: None,
            text: Some(String::new()),
        };
        assert_eq!(message.text_or_placeholder(), MEDIA_PLACEHOLDER);
        assert_eq!(message.sender_label(), "?");

        let message = Message {
            sender_id: Some(UserId::new(42)),
            text: Some("hi".to_owned()),
            ..message
        };
        assert_eq!(message.text_or_placeholder(), "hi");
        assert_eq!(message.sender_label(), "42");
    }

    #[test]
    fn letter_is_case_insensitive() {
        assert_eq!(Key::Char('N').letter(), Some('n'));
        assert_eq!(Key::Enter.letter(), None);
    }
}
