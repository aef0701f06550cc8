//! # oasbridge
//!
//! **oasbridge** is the translation layer between a web framework's
//! request/response model and OpenAPI operations. It takes an incoming
//! request, decodes its parameters and body the way the operation declares
//! them, runs the operation's handler, and turns whatever the handler
//! returned back into a framework response.
//!
//! ## Overview
//!
//! Handlers are written once against framework-agnostic types. The same
//! `Arc<Operation>` can be mounted on several frameworks at the same time;
//! two bindings ship with the crate:
//!
//! - [`framework::HttpFramework`] over the `http` crate's types
//! - [`framework::MiniHttp`] over the `may_minihttp` coroutine server
//!
//! ## Architecture
//!
//! - **[`lifecycle`]** - canonical request and response values
//! - **[`uri_parsing`]** - typed decoding of path, query, form, header and cookie values
//! - **[`body`]** - content-type driven body extraction
//! - **[`response`]** - normalization of handler returns into responses
//! - **[`decorators`]** - security, validation and parameter binding stages
//! - **[`operation`]** - handlers and the per-framework operation adapter
//! - **[`api`]** - operation registration, route rules and endpoint names
//! - **[`server`]** - serving an API on `may_minihttp`
//! - **[`config`]** / **[`logging`]** - API options and tracing setup
//!
//! ### Request flow
//!
//! ```text
//! framework request
//!   -> Framework::get_request        (canonical request, URI parser attached)
//!   -> Framework::get_body           (JSON / form / raw)
//!   -> Pipeline::run_request         (security, validation, binding)
//!   -> Handler                       (HandlerArgs -> HandlerReturn)
//!   -> get_response                  (canonical response)
//!   -> Pipeline::run_response        (response validation)
//!   -> build_response                (framework response)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use http::{Method, StatusCode};
//! use oasbridge::api::Api;
//! use oasbridge::config::ApiOptions;
//! use oasbridge::framework::{HttpFramework, PathParams};
//! use oasbridge::lifecycle::ParamVec;
//! use oasbridge::operation::{Handler, Operation};
//! use oasbridge::spec::{OperationSpec, ParameterMeta};
//! use serde_json::json;
//!
//! let spec = OperationSpec::new("get_pet", Method::GET, "/pets/{petId}")
//!     .with_parameter(ParameterMeta::path("petId").schema(json!({"type": "integer"})));
//! let op = Arc::new(Operation::new(
//!     spec,
//!     Handler::from_fn(|args| Ok(json!({"id": args.get_as::<i64>("petId")?}))),
//! ));
//!
//! let mut api = Api::<HttpFramework>::new(ApiOptions::default());
//! let endpoint = api.add_operation(op).unwrap().endpoint.clone();
//!
//! let mut params = ParamVec::new();
//! params.push((Arc::from("petId"), "7".to_string()));
//! let mut request = http::Request::get("/pets/7").body(Bytes::new()).unwrap();
//! request.extensions_mut().insert(PathParams(params));
//!
//! let response = api.dispatch(&endpoint, request).unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.headers()["content-type"], "application/json");
//! ```

pub mod api;
pub mod body;
pub mod config;
pub mod decorators;
pub mod error;
pub mod framework;
pub mod http_facts;
pub mod jsonifier;
pub mod lifecycle;
pub mod logging;
pub mod operation;
pub mod response;
pub mod sanitize;
pub mod server;
pub mod spec;
pub mod stream;
pub mod uri_parsing;

pub use api::{Api, ApiContext, Route};
pub use error::{AdapterError, Problem};
pub use framework::{Framework, Portable};
pub use operation::{Handler, HandlerArgs, Operation, OperationAdapter};
pub use response::{HandlerReturn, Payload};
