// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const SESSION_FILE_NAME: &str = "session.session";
pub const SESSION_TOKEN_FILE_NAME: &str = "session.txt";

/// On-disk home of the bearer session.
///
/// `session.session` is the primary credential; `session.txt` is a portable
/// copy that can be moved to another machine. Either one is enough to resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE_NAME)
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.join(SESSION_TOKEN_FILE_NAME)
    }

    pub fn load(&self) -> Result<Option<String>> {
        for path in [self.session_path(), self.token_path()] {
            if let Some(session) = read_session_file(&path)? {
                tracing::debug!(path = %path.display(), "loaded stored session");
                return Ok(Some(session));
            }
        }
        Ok(None)
    }

    pub fn save(&self, session: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create session directory {}", self.dir.display()))?;
        for path in [self.session_path(), self.token_path()] {
            fs::write(&path, session)
                .with_context(|| format!("write session file {}", path.display()))?;
        }
        tracing::info!(dir = %self.dir.display(), "session saved");
        Ok(())
    }

    /// Removes both session files; missing files are fine.
    pub fn clear(&self) -> Result<()> {
        for path in [self.session_path(), self.token_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => {
                    return Err(error)
                        .with_context(|| format!("remove session file {}", path.display()));
                }
            }
        }
        Ok(())
    }
}

fn read_session_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let trimmed = raw.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
        }
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error).with_context(|| format!("read session file {}", path.display())),
    }
}
