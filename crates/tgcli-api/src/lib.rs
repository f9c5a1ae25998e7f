// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking JSON client for the messaging gateway.

pub mod session;

pub use session::SessionStore;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tgcli_app::{Dialog, DialogId, Message, MessageId, MessagingClient, UserId};
use time::OffsetDateTime;
use url::Url;

/// Application credentials issued by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_id: i64,
    pub api_hash: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: HttpClient,
    session: Option<String>,
    disconnected: bool,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("parse api.base_url {trimmed:?}"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            http,
            session: None,
            disconnected: false,
        })
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Asks the platform to deliver a login code; returns the code hash
    /// that must accompany the sign-in.
    pub fn send_code(&self, credentials: &ApiCredentials, phone: &str) -> Result<String> {
        let request = SendCodeRequest {
            api_id: credentials.api_id,
            api_hash: &credentials.api_hash,
            phone,
        };
        let response = self
            .http
            .post(self.endpoint("auth/send-code")?)
            .json(&request)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let parsed: SendCodeResponse = read_json(response, "send code response")?;
        Ok(parsed.phone_code_hash)
    }

    /// Exchanges the confirmation code for a session and keeps it for
    /// subsequent calls.
    pub fn sign_in(
        &mut self,
        credentials: &ApiCredentials,
        phone: &str,
        code: &str,
        phone_code_hash: &str,
    ) -> Result<String> {
        let request = SignInRequest {
            api_id: credentials.api_id,
            api_hash: &credentials.api_hash,
            phone,
            code,
            phone_code_hash,
        };
        let response = self
            .http
            .post(self.endpoint("auth/sign-in")?)
            .json(&request)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let parsed: SignInResponse = read_json(response, "sign-in response")?;
        if parsed.session.trim().is_empty() {
            bail!("sign-in returned an empty session");
        }
        self.session = Some(parsed.session.clone());
        tracing::info!("signed in");
        Ok(parsed.session)
    }

    /// `Ok(false)` when there is no session or the gateway rejects it.
    pub fn is_authorized(&self) -> Result<bool> {
        if self.session.is_none() {
            return Ok(false);
        }
        let response = self
            .authorized(self.http.get(self.endpoint("auth/me")?))?
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(true)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("build URL for {path}"))
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        if self.disconnected {
            bail!("client disconnected");
        }
        let Some(session) = self.session.as_deref() else {
            bail!("not signed in");
        };
        Ok(builder.bearer_auth(session))
    }
}

impl MessagingClient for Client {
    fn iter_dialogs(&mut self, limit: usize) -> Result<Vec<Dialog>> {
        let mut url = self.endpoint("dialogs")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let response = self
            .authorized(self.http.get(url))?
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let parsed: DialogsResponse = read_json(response, "dialog list")?;
        tracing::debug!(count = parsed.dialogs.len(), limit, "fetched dialogs");
        Ok(parsed.dialogs.into_iter().map(Dialog::from).collect())
    }

    fn get_messages(
        &mut self,
        dialog_id: DialogId,
        limit: usize,
        offset_id: Option<MessageId>,
    ) -> Result<Vec<Message>> {
        let mut url = self.endpoint(&format!("dialogs/{dialog_id}/messages"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(offset_id) = offset_id {
                query.append_pair("offset_id", &offset_id.to_string());
            }
        }

        let response = self
            .authorized(self.http.get(url))?
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let parsed: MessagesResponse = read_json(response, "message history")?;
        tracing::debug!(
            dialog_id = dialog_id.get(),
            count = parsed.messages.len(),
            limit,
            "fetched messages"
        );
        parsed
            .messages
            .into_iter()
            .map(Message::try_from)
            .collect()
    }

    fn send_message(
        &mut self,
        dialog_id: DialogId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId> {
        let request = SendMessageRequest {
            text,
            reply_to: reply_to.map(MessageId::get),
        };
        let response = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("dialogs/{dialog_id}/messages"))?),
            )?
            .json(&request)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let parsed: SendMessageResponse = read_json(response, "send response")?;
        Ok(MessageId::new(parsed.id))
    }

    fn send_read_acknowledge(&mut self, dialog_id: DialogId, max_id: MessageId) -> Result<()> {
        let response = self
            .authorized(
                self.http
                    .post(self.endpoint(&format!("dialogs/{dialog_id}/read"))?),
            )?
            .json(&ReadRequest {
                max_id: max_id.get(),
            })
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        check_status(response)
    }

    fn disconnect(&mut self) -> Result<()> {
        if self.disconnected {
            return Ok(());
        }
        let request = self.authorized(self.http.post(self.endpoint("auth/disconnect")?));
        self.disconnected = true;
        // Without a session there is nothing to release on the gateway side.
        let Ok(request) = request else {
            return Ok(());
        };
        request
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        tracing::info!("disconnected");
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        bail!("session expired -- restart tgcli to sign in again");
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }
    response.json().with_context(|| format!("decode {what}"))
}

fn check_status(response: Response) -> Result<()> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        bail!("session expired -- restart tgcli to sign in again");
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }
    Ok(())
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out -- raise api.timeout in the config");
    }
    anyhow!(
        "cannot reach {} -- check api.base_url and that the gateway is running ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<DetailedErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error.message);
    }

    if let Ok(parsed) = serde_json::from_str::<PlainErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct SendCodeRequest<'a> {
    api_id: i64,
    api_hash: &'a str,
    phone: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendCodeResponse {
    phone_code_hash: String,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    api_id: i64,
    api_hash: &'a str,
    phone: &'a str,
    code: &'a str,
    phone_code_hash: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    session: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    id: i64,
}

#[derive(Debug, Serialize)]
struct ReadRequest {
    max_id: i64,
}

#[derive(Debug, Deserialize)]
struct DialogsResponse {
    #[serde(default)]
    dialogs: Vec<WireDialog>,
}

#[derive(Debug, Deserialize)]
struct WireDialog {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    unread_count: u32,
    #[serde(default)]
    last_message: Option<String>,
    #[serde(default)]
    is_user: bool,
    #[serde(default)]
    is_group: bool,
    #[serde(default)]
    is_channel: bool,
}

impl From<WireDialog> for Dialog {
    fn from(wire: WireDialog) -> Self {
        Self {
            id: DialogId::new(wire.id),
            name: wire.name,
            unread_count: wire.unread_count,
            last_message: wire.last_message,
            is_user: wire.is_user,
            is_group: wire.is_group,
            is_channel: wire.is_channel,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: i64,
    /// Unix seconds.
    date: i64,
    #[serde(default)]
    sender_id: Option<i64>,
    #[serde(default)]
    text: Option<String>,
}

impl TryFrom<WireMessage> for Message {
    type Error = anyhow::Error;

    fn try_from(wire: WireMessage) -> Result<Self> {
        let date = OffsetDateTime::from_unix_timestamp(wire.date)
            .with_context(|| format!("message {} has invalid date {}", wire.id, wire.date))?;
        Ok(Self {
            id: MessageId::new(wire.id),
            date,
            sender_id: wire.sender_id.map(UserId::new),
            text: wire.text,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DetailedErrorEnvelope {
    error: Option<DetailedError>,
}

#[derive(Debug, Deserialize)]
struct DetailedError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct PlainErrorEnvelope {
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Client, WireMessage, clean_error_response};
    use anyhow::Result;
    use reqwest::StatusCode;
    use std::time::Duration;
    use tgcli_app::Message;

    #[test]
    fn base_url_gets_normalized() -> Result<()> {
        let client = Client::new("http://127.0.0.1:8081///", Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "http://127.0.0.1:8081");
        assert_eq!(
            client.endpoint("dialogs/5/read")?.as_str(),
            "http://127.0.0.1:8081/dialogs/5/read"
        );
        Ok(())
    }

    #[test]
    fn base_url_with_prefix_keeps_prefix() -> Result<()> {
        let client = Client::new("http://gateway.local/v1", Duration::from_secs(1))?;
        assert_eq!(
            client.endpoint("auth/me")?.as_str(),
            "http://gateway.local/v1/auth/me"
        );
        Ok(())
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let error = Client::new("  ", Duration::from_secs(1)).expect_err("empty url should fail");
        assert!(error.to_string().contains("base_url"));
    }

    #[test]
    fn error_envelopes_are_cleaned() {
        let detailed = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"PHONE_CODE_INVALID"}}"#,
        );
        assert_eq!(detailed.to_string(), "server error (400): PHONE_CODE_INVALID");

        let plain = clean_error_response(StatusCode::NOT_FOUND, r#"{"error":"no such dialog"}"#);
        assert_eq!(plain.to_string(), "server error (404): no such dialog");

        let text = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(text.to_string(), "server error (502): upstream down");

        let opaque = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "{garbage");
        assert_eq!(opaque.to_string(), "server returned 500");
    }

    #[test]
    fn wire_message_converts_unix_date() -> Result<()> {
        let wire: WireMessage =
            serde_json::from_str(r#"{"id":7,"date":1700000000,"sender_id":42}"#)?;
        let message = Message::try_from(wire)?;
        assert_eq!(message.id.get(), 7);
        assert_eq!(message.date.unix_timestamp(), 1_700_000_000);
        assert_eq!(message.sender_id.map(|id| id.get()), Some(42));
        assert_eq!(message.text, None);
        Ok(())
    }
}
