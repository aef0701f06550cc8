use super::{Invocation, Stage};
use crate::body::RequestBody;
use crate::error::{AdapterError, Problem};
use crate::http_facts::is_json_mimetype;
use crate::lifecycle::CanonicalResponse;
use crate::spec::{OperationSpec, ParameterLocation};
use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// JSON schema compiled once and shared by every request.
#[derive(Clone)]
pub struct SchemaValidator {
    context: String,
    validator: Arc<Validator>,
}

impl SchemaValidator {
    /// Compile `schema`; `context` names it in error messages.
    pub fn compile(context: impl Into<String>, schema: &Value) -> Result<Self, AdapterError> {
        let context = context.into();
        let validator = jsonschema::validator_for(schema).map_err(|err| AdapterError::Schema {
            context: context.clone(),
            message: err.to_string(),
        })?;
        Ok(Self {
            context,
            validator: Arc::new(validator),
        })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every violation, each prefixed with the instance path.
    pub fn errors(&self, instance: &Value) -> Vec<String> {
        self.validator
            .iter_errors(instance)
            .map(|err| {
                let path = err.instance_path().to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{path}: {err}")
                }
            })
            .collect()
    }

    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        let errors = self.errors(instance);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Validates declared parameters and the request body against their schemas.
#[derive(Debug, Clone, Default)]
pub struct RequestValidationStage {
    params: Vec<(String, ParameterLocation, SchemaValidator)>,
    body: Option<SchemaValidator>,
    body_required: bool,
}

impl RequestValidationStage {
    pub fn compile(spec: &OperationSpec) -> Result<Self, AdapterError> {
        let mut params = Vec::new();
        for param in &spec.parameters {
            if param.location == ParameterLocation::FormData {
                continue;
            }
            if let Some(schema) = &param.schema {
                let context = format!("{} parameter '{}'", param.location, param.name);
                let validator = SchemaValidator::compile(context, schema)?;
                params.push((param.name.clone(), param.location, validator));
            }
        }
        let body = match spec.request_body.as_ref().and_then(|b| b.schema.as_ref()) {
            Some(schema) => Some(SchemaValidator::compile(
                format!("request body of '{}'", spec.operation_id),
                schema,
            )?),
            None => None,
        };
        Ok(Self {
            params,
            body,
            body_required: spec.request_body.as_ref().is_some_and(|b| b.required),
        })
    }
}

impl Stage for RequestValidationStage {
    fn name(&self) -> &'static str {
        "request_validation"
    }

    fn on_request(
        &self,
        _spec: &OperationSpec,
        invocation: &mut Invocation,
    ) -> Result<(), Problem> {
        let request = invocation.request.as_ref();
        let parser = request.uri_parser();

        if !self.params.is_empty() {
            let query = parser.resolve_query(request.query());
            let path = parser.resolve_path(request.path_params());
            let headers = parser.resolve_headers(request.headers());
            let cookies = parser.resolve_cookies(&request.cookies());
            for (name, location, validator) in &self.params {
                let source = match location {
                    ParameterLocation::Query => &query,
                    ParameterLocation::Path => &path,
                    ParameterLocation::Header => &headers,
                    ParameterLocation::Cookie => &cookies,
                    ParameterLocation::FormData => continue,
                };
                if let Some(value) = source.get(name).filter(|v| !v.is_null()) {
                    validator.validate(value).map_err(|errors| {
                        let detail = format!("{}: {}", validator.context(), errors.join("; "));
                        Problem::bad_request(detail)
                    })?;
                }
            }
        }

        let instance = match &invocation.body {
            None if self.body_required => {
                return Err(Problem::bad_request("Request body is required"));
            }
            None => return Ok(()),
            Some(RequestBody::Json(value)) => value.clone(),
            Some(RequestBody::Form(form)) => Value::Object(parser.resolve_form(form)),
            Some(RequestBody::Raw(_)) => return Ok(()),
        };
        if let Some(validator) = &self.body {
            validator.validate(&instance).map_err(|errors| {
                Problem::bad_request(format!("Request body is invalid: {}", errors.join("; ")))
            })?;
        }
        Ok(())
    }
}

/// Validates JSON response bodies against the schema declared for their status.
#[derive(Debug, Clone, Default)]
pub struct ResponseValidationStage {
    by_status: HashMap<String, SchemaValidator>,
}

impl ResponseValidationStage {
    pub fn compile(spec: &OperationSpec) -> Result<Self, AdapterError> {
        let mut by_status = HashMap::new();
        for (status, schema) in &spec.responses {
            let context = format!("response {status} of '{}'", spec.operation_id);
            by_status.insert(status.clone(), SchemaValidator::compile(context, schema)?);
        }
        Ok(Self { by_status })
    }

    fn validator_for(&self, status: u16) -> Option<&SchemaValidator> {
        self.by_status
            .get(&status.to_string())
            .or_else(|| self.by_status.get(&format!("{}XX", status / 100)))
            .or_else(|| self.by_status.get("default"))
    }
}

impl Stage for ResponseValidationStage {
    fn name(&self) -> &'static str {
        "response_validation"
    }

    fn on_response(
        &self,
        _spec: &OperationSpec,
        response: &CanonicalResponse,
    ) -> Result<(), Problem> {
        if response.is_streamed() {
            return Ok(());
        }
        let status = response.status_code().map_or(200, |s| s.as_u16());
        let Some(validator) = self.validator_for(status) else {
            return Ok(());
        };
        let mimetype = response.mimetype().or(response.content_type()).unwrap_or("");
        if !is_json_mimetype(mimetype) {
            return Ok(());
        }
        let Some(body) = response.body() else {
            return Ok(());
        };
        let instance: Value = serde_json::from_slice(body)
            .map_err(|err| Problem::internal(format!("Response body is not valid JSON: {err}")))?;
        validator.validate(&instance).map_err(|errors| {
            Problem::internal(format!("Response body does not conform: {}", errors.join("; ")))
                .with_title("Response Validation Error")
        })
    }
}
