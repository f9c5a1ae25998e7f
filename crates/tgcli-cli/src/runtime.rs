// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Connecting to the gateway: stored session first, interactive login otherwise.

use crate::config::Config;
use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tgcli_api::{ApiCredentials, Client, SessionStore};

pub const CODE_ATTEMPTS: usize = 3;

pub fn connect(config: &Config, config_path: &Path) -> Result<Client> {
    let credentials = config.credentials(config_path)?;
    let store = SessionStore::new(config.session_dir()?);
    let client = Client::new(config.api_base_url(), config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            config_path.display()
        )
    })?;

    let (mut client, resumed) = restore_session(client, &store)?;
    if resumed {
        return Ok(client);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let session = interactive_login(&mut client, &credentials, &mut input, &mut output)?;
    store.save(&session)?;
    Ok(client)
}

/// Attaches the stored session if the gateway still accepts it. A rejected
/// session is removed from disk so the next start goes straight to login.
pub fn restore_session(client: Client, store: &SessionStore) -> Result<(Client, bool)> {
    let Some(session) = store.load()? else {
        return Ok((client, false));
    };
    let client = client.with_session(session);
    if client.is_authorized()? {
        tracing::info!(base_url = client.base_url(), "resumed stored session");
        return Ok((client, true));
    }
    tracing::warn!("stored session rejected; signing in again");
    store.clear()?;
    println!("Stored session is no longer valid; please sign in again.");
    Ok((client, false))
}

/// Phone number, then the confirmation code with a bounded number of retries.
pub fn interactive_login<R, W>(
    client: &mut Client,
    credentials: &ApiCredentials,
    input: &mut R,
    output: &mut W,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    let phone = prompt_line(input, output, "Phone number: ")?;
    if phone.is_empty() {
        bail!("a phone number is required to sign in");
    }
    let phone_code_hash = client
        .send_code(credentials, &phone)
        .context("request login code")?;

    for attempt in 1..=CODE_ATTEMPTS {
        let code = prompt_line(input, output, "Login code: ")?;
        match client.sign_in(credentials, &phone, &code, &phone_code_hash) {
            Ok(session) => return Ok(session),
            Err(error) => {
                tracing::warn!(attempt, error = %format!("{error:#}"), "sign-in failed");
                writeln!(output, "Sign-in failed: {error:#}").context("write to stdout")?;
            }
        }
    }
    bail!("sign-in failed after {CODE_ATTEMPTS} attempts")
}

fn prompt_line<R, W>(input: &mut R, output: &mut W, label: &str) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{label}").context("write to stdout")?;
    output.flush().context("flush stdout")?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("read from stdin")?;
    if read == 0 {
        bail!("input closed before {} was entered", label.trim_end_matches(": "));
    }
    Ok(line.trim().to_owned())
}
