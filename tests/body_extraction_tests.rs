//! Body extraction by content type through both framework bindings.
//!
//! JSON (valid, invalid, `+json` suffixes), urlencoded and multipart forms,
//! raw bodies and absent bodies.

mod common;

use bytes::Bytes;
use common::http_request_with_body;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::Method;
use oasbridge::body::{extract_body, RequestBody};
use oasbridge::framework::{Framework, HttpFramework, MiniHttp, MiniRequest};
use oasbridge::lifecycle::FormData;
use oasbridge::uri_parsing::UriParserKind;
use serde_json::json;

fn http_body(content_type: Option<&str>, body: &'static [u8]) -> Option<RequestBody> {
    let body = Bytes::from_static(body);
    let req = http_request_with_body(Method::POST, "/items", &[], content_type, body);
    let canonical = HttpFramework::get_request(req, UriParserKind::OpenApi.build(Vec::new(), None));
    HttpFramework::get_body(&canonical)
}

fn mini_body(content_type: &'static str, body: &'static [u8]) -> Option<RequestBody> {
    let req = MiniRequest::new(Method::POST, "/items")
        .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
        .body(Bytes::from_static(body));
    let canonical = MiniHttp::get_request(req, UriParserKind::OpenApi.build(Vec::new(), None));
    MiniHttp::get_body(&canonical)
}

#[test]
fn test_json_body() {
    assert_eq!(
        http_body(Some("application/json"), br#"{"name":"rex"}"#),
        Some(RequestBody::Json(json!({"name": "rex"})))
    );
}

#[test]
fn test_json_with_charset_and_suffix() {
    assert_eq!(
        http_body(Some("application/json; charset=utf-8"), b"[1,2]"),
        Some(RequestBody::Json(json!([1, 2])))
    );
    assert_eq!(
        http_body(Some("application/merge-patch+json"), br#"{"a":null}"#),
        Some(RequestBody::Json(json!({"a": null})))
    );
}

#[test]
fn test_invalid_json_is_absent() {
    assert_eq!(http_body(Some("application/json"), b"not json"), None);
    assert_eq!(mini_body("application/json", b"{"), None);
}

#[test]
fn test_urlencoded_form() {
    let body = http_body(Some("application/x-www-form-urlencoded"), b"a=1&b=2").unwrap();
    let form = body.as_form().unwrap();
    assert_eq!(form, &FormData::from_pairs([("a", "1"), ("b", "2")]));
    assert_eq!(body.to_json(), Some(json!({"a": "1", "b": "2"})));
}

#[test]
fn test_urlencoded_form_keeps_repeats() {
    let body = mini_body("application/x-www-form-urlencoded", b"tag=a&tag=b+c").unwrap();
    let form = body.as_form().unwrap();
    assert_eq!(form.get_all("tag"), vec!["a", "b c"]);
    assert_eq!(form.get("tag"), Some("a"));
}

#[test]
fn test_multipart_form_with_file() {
    let body = b"--XyZ\r\n\
Content-Disposition: form-data; name=\"name\"\r\n\r\n\
rex\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"photo\"; filename=\"rex.png\"\r\n\
Content-Type: image/png\r\n\r\n\
PNGDATA\r\n\
--XyZ--\r\n";
    let extracted = mini_body("multipart/form-data; boundary=XyZ", body).unwrap();
    let form = extracted.as_form().unwrap();
    assert_eq!(form.get("name"), Some("rex"));
    let photo = form.file("photo").unwrap();
    assert_eq!(photo.filename, "rex.png");
    assert_eq!(photo.content_type.as_deref(), Some("image/png"));
    assert_eq!(&photo.data[..], b"PNGDATA");
}

#[test]
fn test_malformed_multipart_is_absent() {
    assert_eq!(mini_body("multipart/form-data", b"--x\r\n"), None);
}

#[test]
fn test_raw_body() {
    assert_eq!(
        http_body(Some("text/plain"), b"hello"),
        Some(RequestBody::Raw(Bytes::from_static(b"hello")))
    );
    assert_eq!(
        http_body(None, b"\x00\x01"),
        Some(RequestBody::Raw(Bytes::from_static(b"\x00\x01")))
    );
}

#[test]
fn test_raw_body_json_view() {
    let body = http_body(Some("text/plain"), b"hello").unwrap();
    assert_eq!(body.to_json(), Some(json!("hello")));
    let binary = http_body(Some("application/octet-stream"), b"\xff\xfe").unwrap();
    assert_eq!(binary.to_json(), None);
}

#[test]
fn test_empty_body_is_absent() {
    assert_eq!(http_body(Some("application/json"), b""), None);
    assert_eq!(http_body(Some("text/plain"), b""), None);
}

#[test]
fn test_extract_body_directly() {
    let canonical = oasbridge::lifecycle::CanonicalRequest::builder(
        Method::PUT,
        "/x",
        UriParserKind::Swagger2.build(Vec::new(), None),
    )
    .headers({
        let mut h = http::HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json"));
        h
    })
    .body(r#"{"data":{}}"#)
    .build();
    assert_eq!(extract_body(&canonical), Some(RequestBody::Json(json!({"data": {}}))));
}
