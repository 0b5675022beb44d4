//! Integration tests for the mutating slot verbs: request method, path,
//! query, body, and content type, captured from a local one-shot server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;

fn flotilla() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("flotilla"))
}

// ── HTTP test helpers ─────────────────────────────────────────────────────────

fn serve_once_capturing(response: Vec<u8>) -> (u16, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        request.extend_from_slice(&buf[..n]);
                        if request_complete(&request) {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = stream.write_all(&response);
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        }
    });
    (port, rx)
}

fn request_complete(request: &[u8]) -> bool {
    let Some(headers_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&request[..headers_end]);
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    request.len() >= headers_end + 4 + content_length
}

fn http_json(body: &serde_json::Value) -> Vec<u8> {
    let payload = body.to_string();
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    )
    .into_bytes()
}

fn body_of(request: &str) -> &str {
    request
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or_default()
}

fn one_slot() -> serde_json::Value {
    serde_json::json!([{
        "id": "u1",
        "shortId": "u1",
        "self": "http://10.1.2.3:64001/v1/slot/u1",
        "binary": "foo.bar:baz:1.0",
        "config": "@prod:web:1",
        "status": "RUNNING"
    }])
}

/// Run one verb against a capturing server and return the raw request.
fn capture(args: &[&str]) -> String {
    let (port, rx) = serve_once_capturing(http_json(&one_slot()));
    let mut cmd = flotilla();
    cmd.env("FLOTILLA_COORDINATOR", format!("http://127.0.0.1:{port}"))
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("u1"));
    rx.recv_timeout(Duration::from_secs(5)).expect("request")
}

// ── Lifecycle verbs ───────────────────────────────────────────────────────────

#[test]
fn test_start_puts_running_to_the_lifecycle_resource() {
    let request = capture(&["-u", "u1", "start"]);
    let first_line = request.lines().next().expect("request line");
    assert_eq!(first_line, "PUT /v1/slot/lifecycle?uuid=u1 HTTP/1.1");
    assert_eq!(body_of(&request), "running");
}

#[test]
fn test_stop_puts_stopped() {
    let request = capture(&["-u", "u1", "stop"]);
    assert!(request.starts_with("PUT /v1/slot/lifecycle?uuid=u1 HTTP/1.1"));
    assert_eq!(body_of(&request), "stopped");
}

#[test]
fn test_restart_puts_restarting() {
    let request = capture(&["-u", "u1", "restart"]);
    assert_eq!(body_of(&request), "restarting");
}

#[test]
fn test_lifecycle_body_is_not_labelled_json() {
    let request = capture(&["-u", "u1", "start"]);
    assert!(
        !request.to_ascii_lowercase().contains("application/json"),
        "lifecycle state is a raw text body:\n{request}"
    );
}

// ── Assignment verbs ──────────────────────────────────────────────────────────

#[test]
fn test_assign_puts_json_assignment() {
    let request = capture(&["-u", "u1", "assign", "foo.bar:baz:1.0", "@prod:web:1"]);
    let first_line = request.lines().next().expect("request line");
    assert_eq!(first_line, "PUT /v1/slot/assignment?uuid=u1 HTTP/1.1");
    assert!(request.contains("Content-Type: application/json"));
    let body: serde_json::Value = serde_json::from_str(body_of(&request)).expect("json body");
    assert_eq!(
        body,
        serde_json::json!({"binary": "foo.bar:baz:1.0", "config": "@prod:web:1"})
    );
}

#[test]
fn test_assign_accepts_config_first() {
    let request = capture(&["-u", "u1", "assign", "@prod:web:1", "foo.bar:baz:1.0"]);
    let body: serde_json::Value = serde_json::from_str(body_of(&request)).expect("json body");
    assert_eq!(
        body,
        serde_json::json!({"binary": "foo.bar:baz:1.0", "config": "@prod:web:1"})
    );
}

#[test]
fn test_install_posts_to_the_slot_collection_without_filter() {
    let request = capture(&["install", "foo.bar:baz:1.0", "@prod:web:1"]);
    let first_line = request.lines().next().expect("request line");
    assert_eq!(first_line, "POST /v1/slot/ HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(body_of(&request)).expect("json body");
    assert_eq!(
        body,
        serde_json::json!({"binary": "foo.bar:baz:1.0", "config": "@prod:web:1"})
    );
}

#[test]
fn test_clear_deletes_the_assignment() {
    let request = capture(&["-u", "u1", "clear"]);
    let first_line = request.lines().next().expect("request line");
    assert_eq!(first_line, "DELETE /v1/slot/assignment?uuid=u1 HTTP/1.1");
    assert_eq!(body_of(&request), "");
}

#[test]
fn test_upgrade_posts_both_versions() {
    let request = capture(&["-u", "u1", "upgrade", "2.0", "@5"]);
    let first_line = request.lines().next().expect("request line");
    assert_eq!(first_line, "POST /v1/slot/assignment?uuid=u1 HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(body_of(&request)).expect("json body");
    assert_eq!(
        body,
        serde_json::json!({"binaryVersion": "2.0", "configVersion": "5"})
    );
}

#[test]
fn test_upgrade_with_only_binary_version_omits_config_side() {
    let request = capture(&["-u", "u1", "upgrade", "2.0"]);
    let body: serde_json::Value = serde_json::from_str(body_of(&request)).expect("json body");
    assert_eq!(body, serde_json::json!({"binaryVersion": "2.0"}));
}

// ── Terminate and reset ───────────────────────────────────────────────────────

#[test]
fn test_terminate_deletes_matching_slots() {
    let request = capture(&["-i", "h1", "terminate"]);
    let first_line = request.lines().next().expect("request line");
    assert_eq!(first_line, "DELETE /v1/slot/?host=h1 HTTP/1.1");
}

#[test]
fn test_reset_to_actual_deletes_the_expected_state() {
    let request = capture(&["-u", "u1", "reset-to-actual"]);
    let first_line = request.lines().next().expect("request line");
    assert_eq!(first_line, "DELETE /v1/slot/expected-state?uuid=u1 HTTP/1.1");
}

// ── Result rendering ──────────────────────────────────────────────────────────

#[test]
fn test_mutating_verbs_render_the_returned_slots() {
    let (port, rx) = serve_once_capturing(http_json(&one_slot()));
    let mut cmd = flotilla();
    cmd.env("FLOTILLA_COORDINATOR", format!("http://127.0.0.1:{port}"))
        .args(["-u", "u1", "start"])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "uuid\tip\tstatus\tbinary\tconfig\t\n\
             u1\t10.1.2.3\tRUNNING\tfoo.bar:baz:1.0\t@prod:web:1\t\n",
        ));
    rx.recv_timeout(Duration::from_secs(5)).expect("request");
}

#[test]
fn test_mutating_verb_with_empty_reply_exits_1() {
    let (port, _rx) = serve_once_capturing(http_json(&serde_json::json!([])));
    let mut cmd = flotilla();
    cmd.env("FLOTILLA_COORDINATOR", format!("http://127.0.0.1:{port}"))
        .args(["-u", "u1", "terminate"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "No slots match the provided filters.",
        ));
}

// ── Debug traces ──────────────────────────────────────────────────────────────

#[test]
fn test_debug_traces_json_bodies_in_curl_form() {
    let (port, _rx) = serve_once_capturing(http_json(&one_slot()));
    let mut cmd = flotilla();
    cmd.env("FLOTILLA_COORDINATOR", format!("http://127.0.0.1:{port}"))
        .args(["--debug", "-u", "u1", "assign", "b:1", "@c:1"])
        .assert()
        .success()
        .stderr(predicate::str::contains(format!(
            "curl -H 'Content-Type: application/json' -XPUT 'http://127.0.0.1:{port}/v1/slot/assignment?uuid=u1' -d '"
        )))
        .stderr(predicate::str::contains(r#"{"binary":"b:1","config":"@c:1"}"#));
}

#[test]
fn test_debug_traces_text_bodies_inline() {
    let (port, _rx) = serve_once_capturing(http_json(&one_slot()));
    let mut cmd = flotilla();
    cmd.env("FLOTILLA_COORDINATOR", format!("http://127.0.0.1:{port}"))
        .args(["--debug", "-u", "u1", "stop"])
        .assert()
        .success()
        .stderr(predicate::str::contains(format!(
            "curl -XPUT 'http://127.0.0.1:{port}/v1/slot/lifecycle?uuid=u1' -d 'stopped'"
        )));
}
