//! End-to-end tests against a live `may_minihttp` server.
//!
//! Each test starts a server on a free local port, sends raw HTTP/1.1
//! requests over TCP and checks the wire responses.

mod common;

use common::test_server::{free_addr, parse_response, send_request, setup_may_runtime};
use common::{add_pet_spec, get_pet_spec};
use http::StatusCode;
use oasbridge::api::Api;
use oasbridge::config::ApiOptions;
use oasbridge::framework::MiniHttp;
use oasbridge::operation::{Handler, HandlerArgs, Operation};
use oasbridge::server::{HttpServer, MiniHttpService, ServerHandle};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn start_pet_server() -> ServerHandle {
    setup_may_runtime();
    let mut api = Api::<MiniHttp>::new(ApiOptions::default().json_indent(0));
    api.add_operation(Arc::new(Operation::new(
        get_pet_spec(),
        Handler::from_fn(|args: HandlerArgs| {
            Ok(json!({"id": args.get_as::<i64>("petId")?, "limit": args.get_as::<i64>("limit")?}))
        }),
    )))
    .unwrap();
    api.add_operation(Arc::new(Operation::new(
        add_pet_spec(),
        Handler::from_fn(|args: HandlerArgs| {
            let pet = args.get("body").cloned().unwrap_or(Value::Null);
            Ok((pet, StatusCode::CREATED))
        }),
    )))
    .unwrap();

    let handle = HttpServer(MiniHttpService::new(Arc::new(api)))
        .start(free_addr())
        .unwrap();
    handle.wait_ready().unwrap();
    handle
}

fn get(handle: &ServerHandle, target: &str) -> (u16, HashMap<String, String>, String) {
    let raw = send_request(
        &handle.addr(),
        &format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
    );
    parse_response(&raw)
}

#[test]
fn test_get_returns_json() {
    let handle = start_pet_server();
    let (status, headers, body) = get(&handle, "/pets/12?limit=5");
    assert_eq!(status, 200);
    assert_eq!(headers["content-type"], "application/json");
    let value: Value = serde_json::from_str(body.trim()).unwrap();
    assert_eq!(value, json!({"id": 12, "limit": 5}));
    handle.stop();
}

#[test]
fn test_query_default_applied() {
    let handle = start_pet_server();
    let (status, _, body) = get(&handle, "/pets/3");
    assert_eq!(status, 200);
    let value: Value = serde_json::from_str(body.trim()).unwrap();
    assert_eq!(value["limit"], json!(10));
    handle.stop();
}

#[test]
fn test_unknown_path_is_404_problem() {
    let handle = start_pet_server();
    let (status, headers, body) = get(&handle, "/owners");
    assert_eq!(status, 404);
    assert_eq!(headers["content-type"], "application/problem+json");
    let problem: Value = serde_json::from_str(body.trim()).unwrap();
    assert_eq!(problem["status"], json!(404));
    handle.stop();
}

#[test]
fn test_wrong_method_is_405() {
    let handle = start_pet_server();
    let raw = send_request(
        &handle.addr(),
        "DELETE /pets/1 HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    let (status, _, _) = parse_response(&raw);
    assert_eq!(status, 405);
    handle.stop();
}

#[test]
fn test_bad_path_param_is_400_problem() {
    let handle = start_pet_server();
    let (status, headers, body) = get(&handle, "/pets/abc");
    assert_eq!(status, 400);
    assert_eq!(headers["content-type"], "application/problem+json");
    let problem: Value = serde_json::from_str(body.trim()).unwrap();
    assert_eq!(problem["title"], json!("Bad Request"));
    assert!(problem["detail"].as_str().unwrap().contains("petId"));
    handle.stop();
}

#[test]
fn test_post_json_body() {
    let handle = start_pet_server();
    let payload = r#"{"name":"rex","tag":"dog"}"#;
    let raw = send_request(
        &handle.addr(),
        &format!(
            "POST /pets HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{payload}",
            payload.len()
        ),
    );
    let (status, _, body) = parse_response(&raw);
    assert_eq!(status, 201);
    let value: Value = serde_json::from_str(body.trim()).unwrap();
    assert_eq!(value, json!({"name": "rex", "tag": "dog"}));
    handle.stop();
}

#[test]
fn test_post_without_body_is_400() {
    let handle = start_pet_server();
    let raw = send_request(
        &handle.addr(),
        "POST /pets HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n",
    );
    let (status, _, body) = parse_response(&raw);
    assert_eq!(status, 400);
    assert!(body.contains("Request body is required"));
    handle.stop();
}
