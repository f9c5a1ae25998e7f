// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tgcli_api::{ApiCredentials, Client};
use tgcli_app::{DialogId, MessageId, MessagingClient};
use tiny_http::{Header, Method, Request, Response, Server};

fn start_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

fn respond_json(request: Request, status: u16, body: &str) {
    let response = Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        );
    request.respond(response).expect("response should succeed");
}

fn bearer(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv("Authorization"))
        .map(|header| header.value.as_str().to_owned())
}

fn body_json(request: &mut Request) -> serde_json::Value {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .expect("request body should be readable");
    serde_json::from_str(&body).expect("request body should be JSON")
}

#[test]
fn unreachable_gateway_error_names_the_url() -> Result<()> {
    let mut client =
        Client::new("http://127.0.0.1:1", Duration::from_millis(50))?.with_session("s");

    let error = client
        .iter_dialogs(10)
        .expect_err("fetch should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("127.0.0.1:1"), "message: {message}");
    Ok(())
}

#[test]
fn dialogs_are_fetched_with_bearer_session() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/dialogs?limit=100");
        assert_eq!(bearer(&request).as_deref(), Some("Bearer secret"));
        respond_json(
            request,
            200,
            r#"{"dialogs":[
                {"id":1,"name":"Avery","unread_count":3,"last_message":"hi","is_user":true},
                {"id":-100,"name":"","is_channel":true}
            ]}"#,
        );
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?.with_session("secret");
    let dialogs = client.iter_dialogs(100)?;
    assert_eq!(dialogs.len(), 2);
    assert_eq!(dialogs[0].id, DialogId::new(1));
    assert_eq!(dialogs[0].unread_count, 3);
    assert_eq!(dialogs[0].last_message.as_deref(), Some("hi"));
    assert!(dialogs[1].is_channel);
    assert_eq!(dialogs[1].display_name(), "-100");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn messages_request_carries_offset_id() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/dialogs/42/messages?limit=100&offset_id=900");
        respond_json(
            request,
            200,
            r#"{"messages":[
                {"id":899,"date":1700000100,"sender_id":7,"text":"newer"},
                {"id":898,"date":1700000000,"text":null}
            ]}"#,
        );
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?.with_session("s");
    let messages = client.get_messages(DialogId::new(42), 100, Some(MessageId::new(900)))?;
    let ids: Vec<i64> = messages.iter().map(|message| message.id.get()).collect();
    assert_eq!(ids, vec![899, 898]);
    assert_eq!(messages[1].text_or_placeholder(), "<media>");
    assert_eq!(messages[1].sender_label(), "?");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn reply_and_read_acknowledge_post_json_bodies() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("send request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/dialogs/5/messages");
        let body = body_json(&mut request);
        assert_eq!(body["text"], "on my way");
        assert_eq!(body["reply_to"], 17);
        respond_json(request, 200, r#"{"id":18}"#);

        let mut request = server.recv().expect("read request expected");
        assert_eq!(request.url(), "/dialogs/5/read");
        let body = body_json(&mut request);
        assert_eq!(body["max_id"], 18);
        respond_json(request, 200, "{}");
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?.with_session("s");
    let sent = client.send_message(DialogId::new(5), "on my way", Some(MessageId::new(17)))?;
    assert_eq!(sent, MessageId::new(18));
    client.send_read_acknowledge(DialogId::new(5), sent)?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn login_flow_stores_session() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("send-code request expected");
        assert_eq!(request.url(), "/auth/send-code");
        let body = body_json(&mut request);
        assert_eq!(body["phone"], "+15550100");
        assert_eq!(body["api_id"], 12345);
        respond_json(request, 200, r#"{"phone_code_hash":"hash-1"}"#);

        let mut request = server.recv().expect("sign-in request expected");
        assert_eq!(request.url(), "/auth/sign-in");
        let body = body_json(&mut request);
        assert_eq!(body["code"], "11111");
        assert_eq!(body["phone_code_hash"], "hash-1");
        respond_json(request, 200, r#"{"session":"fresh"}"#);

        let request = server.recv().expect("me request expected");
        assert_eq!(request.url(), "/auth/me");
        assert_eq!(bearer(&request).as_deref(), Some("Bearer fresh"));
        respond_json(request, 200, r#"{"id":1}"#);
    });

    let credentials = ApiCredentials {
        api_id: 12345,
        api_hash: "0123456789abcdef".to_owned(),
    };
    let mut client = Client::new(&addr, Duration::from_secs(1))?;
    assert!(!client.is_authorized()?);

    let hash = client.send_code(&credentials, "+15550100")?;
    assert_eq!(hash, "hash-1");
    let session = client.sign_in(&credentials, "+15550100", "11111", &hash)?;
    assert_eq!(session, "fresh");
    assert_eq!(client.session(), Some("fresh"));
    assert!(client.is_authorized()?);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn rejected_session_is_not_authorized() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        respond_json(request, 401, r#"{"error":"AUTH_KEY_UNREGISTERED"}"#);
    });

    let client = Client::new(&addr, Duration::from_secs(1))?.with_session("stale");
    assert!(!client.is_authorized()?);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_errors_surface_the_gateway_message() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("send-code request expected");
        respond_json(request, 400, r#"{"error":{"message":"PHONE_NUMBER_INVALID"}}"#);

        let request = server.recv().expect("dialogs request expected");
        respond_json(request, 401, "{}");
    });

    let credentials = ApiCredentials {
        api_id: 1,
        api_hash: "x".to_owned(),
    };
    let mut client = Client::new(&addr, Duration::from_secs(1))?.with_session("s");
    let error = client
        .send_code(&credentials, "nope")
        .expect_err("invalid phone should fail");
    assert_eq!(error.to_string(), "server error (400): PHONE_NUMBER_INVALID");

    let error = client
        .iter_dialogs(10)
        .expect_err("expired session should fail");
    assert!(error.to_string().contains("session expired"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn calls_after_disconnect_fail_without_touching_the_network() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("disconnect request expected");
        assert_eq!(request.url(), "/auth/disconnect");
        assert_eq!(bearer(&request).as_deref(), Some("Bearer s"));
        respond_json(request, 200, "{}");
    });

    let mut client = Client::new(&addr, Duration::from_secs(1))?.with_session("s");
    client.disconnect()?;
    assert!(client.is_disconnected());
    client.disconnect()?;

    let error = client
        .get_messages(DialogId::new(1), 50, None)
        .expect_err("disconnected client should fail");
    assert_eq!(error.to_string(), "client disconnected");

    handle.join().expect("server thread should join");
    Ok(())
}
