//! # may_minihttp Server
//!
//! [`MiniHttpService`] serves an [`Api<MiniHttp>`](crate::api::Api) on a
//! `may_minihttp` coroutine server:
//!
//! 1. the wire request is captured into a [`MiniRequest`](crate::framework::MiniRequest)
//! 2. the first route whose method and rule match is selected
//! 3. its endpoint runs with the matched path parameters
//! 4. the response is written back, draining streamed bodies
//!
//! Unmatched paths answer `404`, a path matched under another method answers
//! `405`, and adapter errors answer `500`, all as `application/problem+json`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oasbridge::api::Api;
//! use oasbridge::config::ApiOptions;
//! use oasbridge::framework::MiniHttp;
//! use oasbridge::server::{HttpServer, MiniHttpService};
//!
//! let api = Api::<MiniHttp>::new(ApiOptions::from_env());
//! let handle = HttpServer(MiniHttpService::new(Arc::new(api)))
//!     .start("127.0.0.1:8080")
//!     .unwrap();
//! handle.join().unwrap();
//! ```

mod http_server;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use service::MiniHttpService;
