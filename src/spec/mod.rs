//! # Operation Metadata
//!
//! Router-agnostic description of OpenAPI operations: the parameters, request
//! body, produced mimetypes, response schemas and security requirements the
//! adapter layer consults while binding requests and normalizing responses.
//!
//! Loading these values from an OpenAPI or Swagger document is the caller's
//! business; operations are built programmatically:
//!
//! ```rust
//! use oasbridge::spec::{OperationSpec, ParameterMeta};
//! use http::Method;
//! use serde_json::json;
//!
//! let spec = OperationSpec::new("get_pet", Method::GET, "/pets/{petId}")
//!     .with_parameter(ParameterMeta::path("petId").schema(json!({"type": "integer"})))
//!     .with_produces("application/json");
//! assert_eq!(spec.get_mimetype(), "application/json");
//! ```

mod operation;
mod types;

pub use operation::OperationSpec;
pub use types::{
    CollectionFormat, ParameterLocation, ParameterMeta, ParameterStyle, RequestBodyMeta,
    SecurityRequirement,
};
pub(crate) use types::schema_type;
