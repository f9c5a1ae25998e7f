// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Console key source.
//!
//! A worker thread polls the terminal and pushes decoded keys onto an
//! unbounded queue; the main loop drains it in order.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tgcli_app::Key;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of waiting on the queue with a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    Key(Key),
    Timeout,
    /// The producer is gone and the queue is drained.
    Closed,
}

#[derive(Debug)]
pub struct KeyReader {
    rx: Receiver<Key>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl KeyReader {
    /// Spawns the polling worker. The terminal must already be in raw mode.
    pub fn start(poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);

        let worker = thread::spawn(move || {
            while !worker_stop.load(Ordering::Relaxed) {
                match event::poll(poll_interval) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(error) => {
                        tracing::warn!(%error, "terminal poll failed");
                        break;
                    }
                }
                let event = match event::read() {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::warn!(%error, "terminal read failed");
                        break;
                    }
                };
                if let Some(key) = decode_event(&event)
                    && tx.send(key).is_err()
                {
                    break;
                }
            }
            tracing::debug!("key reader stopped");
        });

        Self {
            rx,
            stop,
            worker: Some(worker),
        }
    }

    /// Fixed key script, closed once drained.
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        let (tx, rx) = mpsc::channel();
        for key in keys {
            // The receiver is alive, so sending cannot fail here.
            let _ = tx.send(key);
        }
        Self {
            rx,
            stop: Arc::new(AtomicBool::new(true)),
            worker: None,
        }
    }

    /// Blocks until a key arrives; `None` once the source is closed.
    pub fn next_key(&self) -> Option<Key> {
        self.rx.recv().ok()
    }

    pub fn next_key_timeout(&self, timeout: Duration) -> KeyWait {
        match self.rx.recv_timeout(timeout) {
            Ok(key) => KeyWait::Key(key),
            Err(RecvTimeoutError::Timeout) => KeyWait::Timeout,
            Err(RecvTimeoutError::Disconnected) => KeyWait::Closed,
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("key reader thread panicked");
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Maps a terminal event onto the symbolic key set.
///
/// Presses and auto-repeats produce keys; releases, mouse and resize events
/// yield `None`. Control chords are reported as [`Key::Other`].
pub fn decode_event(event: &Event) -> Option<Key> {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }) = event
    else {
        return None;
    };
    if !matches!(kind, KeyEventKind::Press | KeyEventKind::Repeat) {
        return None;
    }

    let key = match code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(_) if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            Key::Other
        }
        KeyCode::Char(ch) => Key::Char(*ch),
        _ => Key::Other,
    };
    Some(key)
}
