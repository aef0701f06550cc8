use super::types::{ParameterLocation, ParameterMeta, RequestBodyMeta, SecurityRequirement};
use crate::http_facts::{all_json, DEFAULT_MIMETYPE};
use crate::uri_parsing::UriParserKind;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// Router-agnostic description of one OpenAPI operation.
///
/// This is the metadata the adapter layer needs; loading it from a document
/// is left to the caller.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub operation_id: String,
    pub method: Method,
    /// OpenAPI path template, e.g. `/pets/{petId}`
    pub path: String,
    pub parameters: Vec<ParameterMeta>,
    pub request_body: Option<RequestBodyMeta>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    /// Response body schemas keyed by status (`"200"`, `"4XX"`, `"default"`)
    pub responses: HashMap<String, Value>,
    pub security: Vec<SecurityRequirement>,
    /// Overrides the API-wide URI parser when set
    pub uri_parser: Option<UriParserKind>,
    /// Length of a random suffix appended to the endpoint name
    pub randomize_endpoint: Option<usize>,
}

impl OperationSpec {
    pub fn new(operation_id: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            method,
            path: path.into(),
            parameters: Vec::new(),
            request_body: None,
            produces: Vec::new(),
            consumes: Vec::new(),
            responses: HashMap::new(),
            security: Vec::new(),
            uri_parser: None,
            randomize_endpoint: None,
        }
    }

    pub fn with_parameter(mut self, param: ParameterMeta) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_request_body(mut self, body: RequestBodyMeta) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn with_produces(mut self, mimetype: impl Into<String>) -> Self {
        self.produces.push(mimetype.into());
        self
    }

    pub fn with_consumes(mut self, mimetype: impl Into<String>) -> Self {
        self.consumes.push(mimetype.into());
        self
    }

    pub fn with_response(mut self, status: impl Into<String>, schema: Value) -> Self {
        self.responses.insert(status.into(), schema);
        self
    }

    pub fn with_security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    pub fn with_uri_parser(mut self, kind: UriParserKind) -> Self {
        self.uri_parser = Some(kind);
        self
    }

    pub fn with_randomized_endpoint(mut self, suffix_len: usize) -> Self {
        self.randomize_endpoint = Some(suffix_len);
        self
    }

    /// Mimetype used to serialize handler results that do not carry their own.
    ///
    /// If every declared `produces` entry is JSON the first one wins; a single
    /// non-JSON entry is used as is; anything else falls back to JSON.
    pub fn get_mimetype(&self) -> String {
        if all_json(&self.produces) {
            return self
                .produces
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_MIMETYPE.to_string());
        }
        if self.produces.len() == 1 {
            return self.produces[0].clone();
        }
        DEFAULT_MIMETYPE.to_string()
    }

    /// Route converter name for every path parameter.
    pub fn get_path_parameter_types(&self) -> HashMap<String, &'static str> {
        self.parameters_in(ParameterLocation::Path)
            .map(|p| {
                let schema = p.schema.as_ref();
                let format = schema.and_then(|s| s.get("format")).and_then(Value::as_str);
                let kind = match (p.schema_type(), format) {
                    (_, Some("path")) => "path",
                    (Some("integer"), _) => "int",
                    (Some("number"), _) => "float",
                    _ => "string",
                };
                (p.name.clone(), kind)
            })
            .collect()
    }

    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterMeta> + '_ {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    pub fn parameter(&self, name: &str, location: ParameterLocation) -> Option<&ParameterMeta> {
        self.parameters_in(location).find(|p| p.name == name)
    }

    /// Schema for a response status: exact code, then `NXX` range, then `default`.
    pub fn response_schema(&self, status: u16) -> Option<&Value> {
        let exact = status.to_string();
        let range = format!("{}XX", status / 100);
        self.responses
            .get(&exact)
            .or_else(|| self.responses.get(&range))
            .or_else(|| self.responses.get("default"))
    }
}
