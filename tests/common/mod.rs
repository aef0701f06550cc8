#![allow(dead_code)]

use bytes::Bytes;
use http::Method;
use oasbridge::framework::PathParams;
use oasbridge::lifecycle::ParamVec;
use oasbridge::spec::{OperationSpec, ParameterMeta, RequestBodyMeta};
use serde_json::json;
use std::sync::Arc;

pub mod test_server {
    use std::collections::HashMap;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// A local address nothing is listening on yet.
    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Split a raw HTTP/1.1 response into status, lowercased headers and body.
    pub fn parse_response(resp: &str) -> (u16, HashMap<String, String>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        (status, headers, body.to_string())
    }
}

/// `http` request carrying path parameters the way a router would attach them.
pub fn http_request(method: Method, uri: &str, params: &[(&str, &str)]) -> http::Request<Bytes> {
    http_request_with_body(method, uri, params, None, Bytes::new())
}

pub fn http_request_with_body(
    method: Method,
    uri: &str,
    params: &[(&str, &str)],
    content_type: Option<&str>,
    body: impl Into<Bytes>,
) -> http::Request<Bytes> {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    let mut req = builder.body(body.into()).unwrap();
    req.extensions_mut().insert(PathParams(path_params(params)));
    req
}

pub fn path_params(params: &[(&str, &str)]) -> ParamVec {
    params
        .iter()
        .map(|(k, v)| (Arc::from(*k), (*v).to_string()))
        .collect()
}

/// `GET /pets/{petId}` with an integer path parameter and a `limit` query.
pub fn get_pet_spec() -> OperationSpec {
    OperationSpec::new("get_pet", Method::GET, "/pets/{petId}")
        .with_parameter(
            ParameterMeta::path("petId")
                .required(true)
                .schema(json!({"type": "integer"})),
        )
        .with_parameter(
            ParameterMeta::query("limit").schema(json!({"type": "integer", "default": 10})),
        )
        .with_produces("application/json")
}

/// `POST /pets` with a required JSON body.
pub fn add_pet_spec() -> OperationSpec {
    OperationSpec::new("add_pet", Method::POST, "/pets")
        .with_request_body(
            RequestBodyMeta::new(json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "tag": {"type": "string"}
                }
            }))
            .required(true),
        )
        .with_consumes("application/json")
        .with_produces("application/json")
}
