use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use oasbridge::api::ApiContext;
use oasbridge::config::ApiOptions;
use oasbridge::framework::{HttpBody, HttpFramework, HttpResponse, PathParams, Portable};
use oasbridge::jsonifier::Jsonifier;
use oasbridge::operation::{Handler, Operation, OperationAdapter};
use oasbridge::response::{build_response, get_response, HandlerReturn};
use oasbridge::spec::{OperationSpec, ParameterMeta};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

const JSON: Option<&str> = Some("application/json");

fn bench_get_response(c: &mut Criterion) {
    let jsonifier = Jsonifier::default();
    let pet = json!({"id": 7, "name": "rex", "tags": ["good", "dog"]});

    c.bench_function("get_response_json", |b| {
        b.iter(|| {
            let ret: HandlerReturn = pet.clone().into();
            black_box(get_response::<HttpFramework, Portable>(ret, JSON, &jsonifier))
        })
    });

    let mut headers = HeaderMap::new();
    headers.insert("x-rate-limit", HeaderValue::from_static("100"));
    c.bench_function("get_response_tuple_headers", |b| {
        b.iter(|| {
            let ret: HandlerReturn = (pet.clone(), StatusCode::CREATED, headers.clone()).into();
            black_box(get_response::<HttpFramework, Portable>(ret, JSON, &jsonifier))
        })
    });

    c.bench_function("get_response_native", |b| {
        b.iter(|| {
            let native = http::Response::builder()
                .status(StatusCode::ACCEPTED)
                .body(HttpBody::Full(Bytes::from_static(b"accepted")))
                .unwrap_or_default();
            let ret = HandlerReturn::<HttpResponse>::native(native);
            black_box(get_response::<HttpFramework, HttpResponse>(ret, None, &jsonifier))
        })
    });
}

fn bench_build_response(c: &mut Criterion) {
    let jsonifier = Jsonifier::default();
    let pet = json!({"id": 7, "name": "rex"});
    c.bench_function("build_response_json", |b| {
        b.iter(|| {
            let ret: HandlerReturn = pet.clone().into();
            let canonical = get_response::<HttpFramework, Portable>(ret, JSON, &jsonifier);
            black_box(canonical.and_then(|c| build_response::<HttpFramework>(c, JSON)))
        })
    });
}

fn bench_adapter_call(c: &mut Criterion) {
    let spec = OperationSpec::new("get_pet", Method::GET, "/pets/{petId}")
        .with_parameter(ParameterMeta::path("petId").schema(json!({"type": "integer"})))
        .with_parameter(
            ParameterMeta::query("limit").schema(json!({"type": "integer", "default": 10})),
        );
    let op = Arc::new(Operation::new(
        spec,
        Handler::from_fn(|args| Ok(json!({"id": args.get_as::<i64>("petId")?}))),
    ));
    let context = Arc::new(ApiContext::new(ApiOptions::default()));
    let Ok(adapter) = OperationAdapter::<HttpFramework>::from_operation(op, context, false) else {
        return;
    };

    c.bench_function("adapter_call", |b| {
        b.iter(|| {
            let mut req = http::Request::builder()
                .method(Method::GET)
                .uri("/pets/42?limit=5")
                .body(Bytes::new())
                .unwrap_or_default();
            req.extensions_mut()
                .insert(PathParams([(Arc::from("petId"), "42".to_string())].into_iter().collect()));
            black_box(adapter.call(req))
        })
    });
}

criterion_group!(benches, bench_get_response, bench_build_response, bench_adapter_call);
criterion_main!(benches);
