//! API registration and dispatch.
//!
//! Route rules under a base path, sanitized and catch-all parameters,
//! endpoint naming (dotted ids, random suffixes, duplicates), route lookup,
//! dispatch by endpoint name and API-wide options reaching the adapters.

mod common;

use common::{get_pet_spec, http_request};
use http::{Method, StatusCode};
use oasbridge::api::Api;
use oasbridge::config::ApiOptions;
use oasbridge::decorators::StaticApiKey;
use oasbridge::error::AdapterError;
use oasbridge::framework::{HttpFramework, MiniHttp};
use oasbridge::operation::{Handler, HandlerArgs, Operation};
use oasbridge::sanitize::RANDOM_SUFFIX_SEPARATOR;
use oasbridge::spec::{OperationSpec, ParameterMeta, SecurityRequirement};
use serde_json::{json, Value};
use std::sync::Arc;

fn echo(spec: OperationSpec) -> Arc<Operation> {
    Arc::new(Operation::new(
        spec,
        Handler::from_fn(|args: HandlerArgs| Ok(Value::Object(args.values().clone()))),
    ))
}

#[test]
fn test_routes_under_base_path() {
    let mut api = Api::<HttpFramework>::new(ApiOptions::default().base_path("v1/"));
    assert_eq!(api.base_path(), "/v1");
    assert_eq!(api.blueprint(), "/v1");

    let route = api.add_operation(echo(get_pet_spec())).unwrap();
    assert_eq!(route.rule, "/v1/pets/{petId}");
    assert_eq!(route.endpoint, "get_pet");
    assert_eq!(route.method, Method::GET);
    assert_eq!(route.param_names, vec!["petId".to_string()]);
}

#[test]
fn test_dashed_and_path_typed_parameters() {
    let mut api = Api::<MiniHttp>::new(ApiOptions::default());
    let spec = OperationSpec::new("files.get", Method::GET, "/files/{file-path}")
        .with_parameter(
            ParameterMeta::path("file-path").schema(json!({"type": "string", "format": "path"})),
        );
    let route = api.add_operation(echo(spec)).unwrap().clone();
    assert_eq!(route.rule, "/files/{*file_path}");
    assert_eq!(route.endpoint, "files_get");

    let (found, params) = api.find_route(&Method::GET, "/files/a/b.txt").unwrap();
    assert_eq!(found.endpoint, "files_get");
    assert_eq!(params[0].0.as_ref(), "file-path");
    assert_eq!(params[0].1, "a/b.txt");
}

#[test]
fn test_find_route_decodes_path_parameters() {
    let mut api = Api::<MiniHttp>::new(ApiOptions::default());
    let spec = OperationSpec::new("files.get", Method::GET, "/files/{name}")
        .with_parameter(ParameterMeta::path("name").schema(json!({"type": "string"})));
    api.add_operation(echo(spec)).unwrap();

    let (_, params) = api.find_route(&Method::GET, "/files/a%20b").unwrap();
    assert_eq!(params[0].0.as_ref(), "name");
    assert_eq!(params[0].1, "a b");
}

#[test]
fn test_duplicate_endpoint_rejected() {
    let mut api = Api::<HttpFramework>::new(ApiOptions::default());
    api.add_operation(echo(get_pet_spec())).unwrap();
    let err = api.add_operation(echo(get_pet_spec())).unwrap_err();
    assert!(matches!(err, AdapterError::DuplicateEndpoint(name) if name == "get_pet"));
}

#[test]
fn test_randomized_endpoints_do_not_collide() {
    let mut api = Api::<HttpFramework>::new(ApiOptions::default());
    let first = api
        .add_operation(echo(get_pet_spec().with_randomized_endpoint(6)))
        .unwrap()
        .endpoint
        .clone();
    let second = api
        .add_operation(echo(get_pet_spec().with_randomized_endpoint(6)))
        .unwrap()
        .endpoint
        .clone();
    assert_ne!(first, second);
    let (name, suffix) = first.split_once(RANDOM_SUFFIX_SEPARATOR).unwrap();
    assert_eq!(name, "get_pet");
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(api.routes().len(), 2);
}

#[test]
fn test_find_route_by_method() {
    let mut api = Api::<HttpFramework>::new(ApiOptions::default());
    api.add_operation(echo(get_pet_spec())).unwrap();
    api.add_operation(echo(OperationSpec::new("delete_pet", Method::DELETE, "/pets/{petId}")))
        .unwrap();

    let (route, params) = api.find_route(&Method::DELETE, "/pets/4").unwrap();
    assert_eq!(route.endpoint, "delete_pet");
    assert_eq!(params[0].1, "4");
    assert!(api.find_route(&Method::PUT, "/pets/4").is_none());
    assert!(api.find_route(&Method::GET, "/owners/4").is_none());
}

#[test]
fn test_dispatch_by_endpoint() {
    let mut api = Api::<HttpFramework>::new(ApiOptions::default().json_indent(0));
    api.add_operation(echo(get_pet_spec())).unwrap();
    let resp = api
        .dispatch("get_pet", http_request(Method::GET, "/pets/2", &[("petId", "2")]))
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect();
    assert!(body.ends_with(b"\n"));
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({"petId": 2, "limit": 10}));

    let err = api
        .dispatch("nope", http_request(Method::GET, "/", &[]))
        .unwrap_err();
    assert!(matches!(err, AdapterError::UnknownEndpoint(_)));
}

#[tokio::test]
async fn test_dispatch_async() {
    let mut api = Api::<HttpFramework>::new(ApiOptions::default());
    let op = Arc::new(Operation::new(
        OperationSpec::new("slow", Method::GET, "/slow"),
        Handler::from_async(|_args: HandlerArgs| async {
            tokio::task::yield_now().await;
            Ok::<_, anyhow::Error>(json!({"done": true}))
        }),
    ));
    api.add_operation(op).unwrap();
    let resp = api
        .dispatch_async("slow", http_request(Method::GET, "/slow", &[]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_pythonic_option_applies_to_operations() {
    let options = ApiOptions::default().pythonic_params(true).json_indent(0);
    let mut api = Api::<HttpFramework>::new(options);
    api.add_operation(echo(get_pet_spec())).unwrap();
    let resp = api
        .dispatch("get_pet", http_request(Method::GET, "/pets/2", &[("petId", "2")]))
        .unwrap();
    let body: Value = serde_json::from_slice(&resp.into_body().collect()).unwrap();
    assert_eq!(body, json!({"pet_id": 2, "limit": 10}));
}

#[test]
fn test_builder_registers_security_handlers() {
    let mut requirement = SecurityRequirement::new();
    requirement.insert("api_key".into(), Vec::new());
    let spec = OperationSpec::new("admin", Method::GET, "/admin").with_security(requirement);

    let mut api = Api::<HttpFramework>::builder(ApiOptions::default())
        .security_handler("api_key", StaticApiKey::query("key", "k1").with_key("k2"))
        .build();
    api.add_operation(echo(spec)).unwrap();

    let denied = api.dispatch("admin", http_request(Method::GET, "/admin?key=bad", &[])).unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    let allowed = api.dispatch("admin", http_request(Method::GET, "/admin?key=k2", &[])).unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[test]
fn test_endpoint_lookup() {
    let mut api = Api::<HttpFramework>::new(ApiOptions::default());
    api.add_operation(echo(get_pet_spec())).unwrap();
    let endpoint = api.endpoint("get_pet").unwrap();
    assert_eq!(endpoint.operation_id(), "get_pet");
    assert_eq!(endpoint.spec().path, "/pets/{petId}");
    assert!(api.endpoint("missing").is_none());
}
