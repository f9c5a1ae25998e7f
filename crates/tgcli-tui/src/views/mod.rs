// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Screen renderers plus the lazy fetches that fill their caches.
//!
//! Fetching happens in [`prepare`], on the control path, before a frame is
//! drawn; drawing itself never touches the network.

pub mod chat;
pub mod dialogs;

use tgcli_app::{AppState, MessagingClient, ScreenMode};

pub fn prepare<C>(state: &mut AppState, client: &mut C)
where
    C: MessagingClient + ?Sized,
{
    match state.mode {
        ScreenMode::DialogList => dialogs::ensure_dialogs_loaded(state, client),
        ScreenMode::ChatThread => chat::ensure_thread_loaded(state, client),
        ScreenMode::Help => {}
    }
}

#[cfg(test)]
mod tests {
    use super::prepare;
    use tgcli_app::{AppCommand, AppState, DialogId, Key, MessagingClient, handle_key};
    use tgcli_testkit::{
        Call, FakeClient, Operation, ScriptedPrompt, sample_dialog, sample_thread,
    };

    #[test]
    fn dialog_cache_loads_once() {
        let mut client = FakeClient::new().with_dialogs(vec![
            sample_dialog(1, "a", 0),
            sample_dialog(2, "b", 4),
        ]);
        let mut state = AppState::new(20, false);

        prepare(&mut state, &mut client);
        prepare(&mut state, &mut client);

        assert_eq!(client.calls(), &[Call::IterDialogs { limit: 100 }]);
        assert_eq!(state.dialogs.len(), 2);
    }

    #[test]
    fn unread_filter_applies_at_fetch_time() {
        let mut client = FakeClient::new().with_dialogs(vec![
            sample_dialog(1, "a", 0),
            sample_dialog(2, "b", 4),
        ]);
        let mut state = AppState::new(20, true);

        prepare(&mut state, &mut client);
        let ids: Vec<i64> = state.dialogs.entries().iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn unread_toggle_refetches_with_filter() {
        let mut client = FakeClient::new().with_dialogs(vec![
            sample_dialog(1, "a", 0),
            sample_dialog(2, "b", 4),
            sample_dialog(3, "c", 0),
        ]);
        let mut prompt = ScriptedPrompt::default();
        let mut state = AppState::new(20, false);

        prepare(&mut state, &mut client);
        assert_eq!(state.dialogs.len(), 3);

        handle_key(&mut state, &mut client, &mut prompt, Key::Char('u'));
        prepare(&mut state, &mut client);

        assert_eq!(
            client.calls(),
            &[
                Call::IterDialogs { limit: 100 },
                Call::IterDialogs { limit: 100 },
            ]
        );
        let ids: Vec<i64> = state.dialogs.entries().iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![2]);
        assert!(state.dialogs.is_loaded());
    }

    #[test]
    fn empty_result_does_not_refetch() {
        let mut client = FakeClient::new();
        let mut state = AppState::new(20, false);
        prepare(&mut state, &mut client);
        prepare(&mut state, &mut client);
        assert_eq!(client.calls().len(), 1);
        assert!(state.dialogs.is_loaded());
    }

    #[test]
    fn failed_fetch_leaves_cache_unloaded_and_retries() {
        let mut client = FakeClient::new().with_dialogs(vec![sample_dialog(1, "a", 0)]);
        client.fail(Operation::IterDialogs);
        let mut state = AppState::new(20, false);

        prepare(&mut state, &mut client);
        assert!(!state.dialogs.is_loaded());
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.starts_with("load dialogs failed"), "status: {status}");

        client.recover(Operation::IterDialogs);
        prepare(&mut state, &mut client);
        assert_eq!(state.dialogs.len(), 1);
    }

    #[test]
    fn open_thread_fetches_recent_history() -> anyhow::Result<()> {
        let dialog_id = DialogId::new(3);
        let mut client = FakeClient::new().with_thread(dialog_id, sample_thread(1, 80));
        let mut state = AppState::new(20, false);
        state.dispatch(AppCommand::OpenDialog(dialog_id));

        prepare(&mut state, &mut client);
        prepare(&mut state, &mut client);

        assert_eq!(
            client.calls(),
            &[Call::GetMessages {
                dialog_id,
                limit: 50,
                offset_id: None,
            }]
        );
        assert_eq!(state.messages.len(), 50);
        assert_eq!(state.messages.max_id().map(|id| id.get()), Some(80));
        assert_eq!(client.get_messages(dialog_id, 1, None)?.len(), 1);
        Ok(())
    }
}
