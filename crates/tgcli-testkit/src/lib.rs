// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tgcli_app::{
    Dialog, DialogId, Message, MessageId, MessagingClient, ReplyPrompt, UserId,
};
use time::{Duration, OffsetDateTime};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 12] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Turner", "Brooks",
];
const GROUP_NAMES: [&str; 8] = [
    "Book Club",
    "Climbing Crew",
    "Release Train",
    "Family",
    "Flat 4B",
    "Hack Night",
    "Garden Swap",
    "On-call",
];
const CHANNEL_NAMES: [&str; 6] = [
    "Rust Weekly",
    "City Transit Alerts",
    "Release Notes",
    "Weather Station",
    "Design Digest",
    "Open Source Jobs",
];
const WORDS: [&str; 30] = [
    "meeting", "tomorrow", "lunch", "deploy", "review", "photos", "train", "late", "ticket",
    "weekend", "plan", "call", "later", "coffee", "draft", "notes", "build", "green", "failed",
    "fixed", "thanks", "sure", "maybe", "tonight", "agenda", "slides", "link", "update",
    "release", "ping",
];

/// Operation log entry recorded by [`FakeClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    IterDialogs {
        limit: usize,
    },
    GetMessages {
        dialog_id: DialogId,
        limit: usize,
        offset_id: Option<MessageId>,
    },
    SendMessage {
        dialog_id: DialogId,
        text: String,
        reply_to: Option<MessageId>,
    },
    ReadAcknowledge {
        dialog_id: DialogId,
        max_id: MessageId,
    },
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    IterDialogs,
    GetMessages,
    SendMessage,
    ReadAcknowledge,
    Disconnect,
}

/// In-memory messaging platform with a call log and injectable failures.
#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    dialogs: Vec<Dialog>,
    threads: BTreeMap<DialogId, Vec<Message>>,
    failing: BTreeSet<Operation>,
    calls: Vec<Call>,
    disconnected: bool,
    next_message_id: i64,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            next_message_id: 1_000_000,
            ..Self::default()
        }
    }

    /// Deterministic offline data set used by `--demo`.
    pub fn demo() -> Self {
        let mut faker = ChatFaker::new(7);
        let now = OffsetDateTime::now_utc();
        let mut client = Self::new();
        for index in 0..36 {
            let dialog_id = DialogId::new(10_000 + index);
            let count = 30 + faker.int_n(150) as i64;
            let thread = faker.thread(dialog_id, count, now);
            let mut dialog = faker.dialog(dialog_id, index as usize);
            dialog.last_message = thread.first().and_then(|message| message.text.clone());
            client = client.with_dialog(dialog).with_thread(dialog_id, thread);
        }
        client
    }

    pub fn with_dialog(mut self, dialog: Dialog) -> Self {
        self.dialogs.push(dialog);
        self
    }

    pub fn with_dialogs(mut self, dialogs: impl IntoIterator<Item = Dialog>) -> Self {
        self.dialogs.extend(dialogs);
        self
    }

    /// Registers a thread; messages may be given in any order.
    pub fn with_thread(mut self, dialog_id: DialogId, mut messages: Vec<Message>) -> Self {
        messages.sort_by(|left, right| right.id.cmp(&left.id));
        self.threads.insert(dialog_id, messages);
        self
    }

    pub fn fail(&mut self, operation: Operation) {
        self.failing.insert(operation);
    }

    pub fn recover(&mut self, operation: Operation) {
        self.failing.remove(&operation);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    fn check(&self, operation: Operation) -> Result<()> {
        if self.disconnected && operation != Operation::Disconnect {
            bail!("client disconnected");
        }
        if self.failing.contains(&operation) {
            bail!("simulated {operation:?} failure");
        }
        Ok(())
    }
}

impl MessagingClient for FakeClient {
    fn iter_dialogs(&mut self, limit: usize) -> Result<Vec<Dialog>> {
        self.calls.push(Call::IterDialogs { limit });
        self.check(Operation::IterDialogs)?;
        Ok(self.dialogs.iter().take(limit).cloned().collect())
    }

    fn get_messages(
        &mut self,
        dialog_id: DialogId,
        limit: usize,
        offset_id: Option<MessageId>,
    ) -> Result<Vec<Message>> {
        self.calls.push(Call::GetMessages {
            dialog_id,
            limit,
            offset_id,
        });
        self.check(Operation::GetMessages)?;
        let Some(thread) = self.threads.get(&dialog_id) else {
            bail!("dialog {dialog_id} not found");
        };
        Ok(thread
            .iter()
            .filter(|message| offset_id.is_none_or(|offset| message.id < offset))
            .take(limit)
            .cloned()
            .collect())
    }

    fn send_message(
        &mut self,
        dialog_id: DialogId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId> {
        self.calls.push(Call::SendMessage {
            dialog_id,
            text: text.to_owned(),
            reply_to,
        });
        self.check(Operation::SendMessage)?;
        self.next_message_id += 1;
        let id = MessageId::new(self.next_message_id);
        self.threads.entry(dialog_id).or_default().insert(
            0,
            Message {
                id,
                date: OffsetDateTime::now_utc(),
                sender_id: None,
                text: Some(text.to_owned()),
            },
        );
        Ok(id)
    }

    fn send_read_acknowledge(&mut self, dialog_id: DialogId, max_id: MessageId) -> Result<()> {
        self.calls.push(Call::ReadAcknowledge { dialog_id, max_id });
        self.check(Operation::ReadAcknowledge)?;
        if let Some(dialog) = self.dialogs.iter_mut().find(|dialog| dialog.id == dialog_id) {
            dialog.unread_count = 0;
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.calls.push(Call::Disconnect);
        self.check(Operation::Disconnect)?;
        self.disconnected = true;
        Ok(())
    }
}

/// Reply prompt that hands out canned answers in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Option<String>>,
    quoted: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Option<&'static str>>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(|answer| answer.map(str::to_owned))
                .collect(),
            quoted: Vec::new(),
        }
    }

    /// Quoted previews the prompt was opened with.
    pub fn quoted(&self) -> &[String] {
        &self.quoted
    }
}

impl ReplyPrompt for ScriptedPrompt {
    fn prompt_reply(&mut self, quoted: &str) -> Result<Option<String>> {
        self.quoted.push(quoted.to_owned());
        Ok(self.answers.pop_front().flatten())
    }
}

pub fn sample_dialog(id: i64, name: &str, unread_count: u32) -> Dialog {
    Dialog {
        id: DialogId::new(id),
        name: name.to_owned(),
        unread_count,
        last_message: Some(format!("hello from {name}")),
        is_user: true,
        is_group: false,
        is_channel: false,
    }
}

pub fn sample_dialogs(count: i64) -> Vec<Dialog> {
    (1..=count)
        .map(|id| sample_dialog(id, &format!("Dialog {id}"), (id % 3) as u32))
        .collect()
}

/// Messages with ids `first..=last`, one minute apart, in chronological order.
pub fn sample_thread(first: i64, last: i64) -> Vec<Message> {
    (first..=last)
        .map(|id| Message {
            id: MessageId::new(id),
            date: fixture_datetime() + Duration::minutes(id),
            sender_id: Some(UserId::new(500 + id % 4)),
            text: Some(format!("message {id}")),
        })
        .collect()
}

pub fn fixture_datetime() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for plausible dialogs and threads.
#[derive(Debug, Clone)]
pub struct ChatFaker {
    rng: DeterministicRng,
}

impl ChatFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn dialog(&mut self, id: DialogId, index: usize) -> Dialog {
        let unread_count = if self.rng.int_n(3) == 0 {
            self.rng.int_n(40) as u32 + 1
        } else {
            0
        };
        let (name, is_user, is_group, is_channel) = match index % 5 {
            0 | 1 | 2 => (
                format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES)),
                true,
                false,
                false,
            ),
            3 => (self.pick(&GROUP_NAMES).to_owned(), false, true, false),
            _ => (self.pick(&CHANNEL_NAMES).to_owned(), false, false, true),
        };
        Dialog {
            id,
            name,
            unread_count,
            last_message: None,
            is_user,
            is_group,
            is_channel,
        }
    }

    /// Newest-first thread of `count` messages ending at `now`.
    pub fn thread(&mut self, dialog_id: DialogId, count: i64, now: OffsetDateTime) -> Vec<Message> {
        let base_id = dialog_id.get() * 1_000;
        let mut at = now;
        (0..count)
            .map(|step| {
                at -= Duration::minutes(1 + self.rng.int_n(90) as i64);
                let text = if self.rng.int_n(9) == 0 {
                    None
                } else {
                    Some(self.sentence(2, 14))
                };
                Message {
                    id: MessageId::new(base_id + count - step),
                    date: at,
                    sender_id: Some(UserId::new(700 + self.rng.int_n(6) as i64)),
                    text,
                }
            })
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let count = min_words + self.rng.int_n(max_words.saturating_sub(min_words) + 1);
        let mut sentence = (0..count)
            .map(|_| self.pick(&WORDS))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence
    }
}

#[cfg(test)]
mod tests {
    use super::{Call, FakeClient, Operation, sample_dialogs, sample_thread};
    use anyhow::Result;
    use tgcli_app::{DialogId, MessageId, MessagingClient};

    #[test]
    fn offset_id_returns_strictly_older_messages_newest_first() -> Result<()> {
        let dialog_id = DialogId::new(1);
        let mut client = FakeClient::new().with_thread(dialog_id, sample_thread(1, 10));

        let older = client.get_messages(dialog_id, 3, Some(MessageId::new(6)))?;
        let ids: Vec<i64> = older.iter().map(|message| message.id.get()).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        Ok(())
    }

    #[test]
    fn injected_failures_are_logged_and_returned() {
        let mut client = FakeClient::new().with_dialogs(sample_dialogs(2));
        client.fail(Operation::IterDialogs);

        assert!(client.iter_dialogs(100).is_err());
        assert_eq!(client.calls(), &[Call::IterDialogs { limit: 100 }]);
    }

    #[test]
    fn calls_after_disconnect_fail() -> Result<()> {
        let mut client = FakeClient::new().with_dialogs(sample_dialogs(2));
        client.disconnect()?;
        let error = client.iter_dialogs(10).expect_err("disconnected client should fail");
        assert!(error.to_string().contains("disconnected"));
        Ok(())
    }

    #[test]
    fn demo_data_is_deterministic_in_shape() -> Result<()> {
        let mut first = FakeClient::demo();
        let mut second = FakeClient::demo();
        let left = first.iter_dialogs(100)?;
        let right = second.iter_dialogs(100)?;
        assert_eq!(left.len(), 36);
        let names = |dialogs: &[tgcli_app::Dialog]| {
            dialogs.iter().map(|dialog| dialog.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&left), names(&right));
        Ok(())
    }
}
