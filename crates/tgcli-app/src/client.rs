// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{Dialog, DialogId, Message, MessageId};

/// Capability surface the navigation core needs from the messaging platform.
///
/// Every call blocks until the platform answers. Errors are reported by the
/// caller and never applied to local state.
pub trait MessagingClient {
    fn iter_dialogs(&mut self, limit: usize) -> Result<Vec<Dialog>>;

    /// Newest first. With `offset_id`, only messages strictly older than it.
    fn get_messages(
        &mut self,
        dialog_id: DialogId,
        limit: usize,
        offset_id: Option<MessageId>,
    ) -> Result<Vec<Message>>;

    fn send_message(
        &mut self,
        dialog_id: DialogId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId>;

    fn send_read_acknowledge(&mut self, dialog_id: DialogId, max_id: MessageId) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;
}

impl<C: MessagingClient + ?Sized> MessagingClient for Box<C> {
    fn iter_dialogs(&mut self, limit: usize) -> Result<Vec<Dialog>> {
        (**self).iter_dialogs(limit)
    }

    fn get_messages(
        &mut self,
        dialog_id: DialogId,
        limit: usize,
        offset_id: Option<MessageId>,
    ) -> Result<Vec<Message>> {
        (**self).get_messages(dialog_id, limit, offset_id)
    }

    fn send_message(
        &mut self,
        dialog_id: DialogId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId> {
        (**self).send_message(dialog_id, text, reply_to)
    }

    fn send_read_acknowledge(&mut self, dialog_id: DialogId, max_id: MessageId) -> Result<()> {
        (**self).send_read_acknowledge(dialog_id, max_id)
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }
}

/// Free-text sub-prompt used for replies.
///
/// The main loop is suspended while the prompt runs; no other key reaches the
/// controller until it returns. `Ok(None)` means the user cancelled.
pub trait ReplyPrompt {
    fn prompt_reply(&mut self, quoted: &str) -> Result<Option<String>>;
}
