use super::{Invocation, Stage};
use crate::body::RequestBody;
use crate::error::Problem;
use crate::spec::{schema_type, OperationSpec, ParameterLocation, ParameterMeta};
use crate::uri_parsing::UriParser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

#[allow(clippy::expect_used)]
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("camel boundary regex should be valid"));

#[allow(clippy::expect_used)]
static ACRONYM_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("acronym boundary regex should be valid")
});

#[allow(clippy::expect_used)]
static INVALID_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-Z_]").expect("identifier regex should be valid"));

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Strip characters that cannot appear in an identifier.
///
/// Leading characters are dropped until a letter or underscore.
pub fn sanitize_param(name: &str) -> String {
    let start = name
        .find(|c: char| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(name.len());
    INVALID_IDENT.replace_all(&name[start..], "").into_owned()
}

/// snake_case an argument name, suffixing `_` to Rust keywords.
///
/// `petId` becomes `pet_id`, `HTTPCode` becomes `http_code`, `type` becomes `type_`.
pub fn pythonic(name: &str) -> String {
    let start = name
        .find(|c: char| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(name.len());
    let name = INVALID_IDENT.replace_all(&name[start..], "_");
    let name = ACRONYM_WORD.replace_all(&name, "${1}_${2}");
    let name = LOWER_UPPER.replace_all(&name, "${1}_${2}");
    let mut name = name.to_ascii_lowercase();
    if RUST_KEYWORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

/// Resolves declared parameters and the body into handler arguments.
///
/// Values are typed by the request's URI parser, defaults are applied and
/// a missing required value or a value of the wrong type rejects the
/// request with `400`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterBinding {
    pythonic_params: bool,
}

impl ParameterBinding {
    pub fn new(pythonic_params: bool) -> Self {
        Self { pythonic_params }
    }

    fn arg_name(&self, name: &str) -> String {
        if self.pythonic_params {
            pythonic(name)
        } else {
            sanitize_param(name)
        }
    }

    fn bind_body(
        &self,
        spec: &OperationSpec,
        invocation: &mut Invocation,
        parser: &dyn UriParser,
    ) -> Result<(), Problem> {
        let body_meta = spec.request_body.as_ref();
        match invocation.body.as_ref() {
            Some(RequestBody::Form(form)) => {
                let mut resolved = parser.resolve_form(form);
                // formData parameters (Swagger 2) and body schema properties
                for param in spec.parameters_in(ParameterLocation::FormData) {
                    let value = resolved.remove(&param.name);
                    bind_one(param, value, &mut invocation.args, |n| self.arg_name(n))?;
                }
                if let Some(props) = body_meta
                    .and_then(|b| b.schema.as_ref())
                    .and_then(|s| s.get("properties"))
                    .and_then(Value::as_object)
                {
                    for (name, schema) in props {
                        if let Some(default) = schema.get("default") {
                            resolved.entry(name.clone()).or_insert_with(|| default.clone());
                        }
                    }
                }
                for (name, value) in resolved {
                    let property = parser.form_property(&name);
                    let schema = property.as_ref().and_then(|p| p.schema.as_ref());
                    check_type(&name, "formData", &value, schema)?;
                    invocation.args.insert(self.arg_name(&name), value);
                }
                invocation.files = form.files().to_vec();
            }
            Some(body) => {
                let name = body_meta.map_or("body", |b| b.arg_name());
                if let Some(value) = body.to_json() {
                    invocation.args.insert(self.arg_name(name), value);
                }
            }
            None => {
                if let Some(meta) = body_meta {
                    if meta.required {
                        return Err(Problem::bad_request("Request body is required"));
                    }
                    let default = meta.schema.as_ref().and_then(|s| s.get("default"));
                    if let Some(default) = default {
                        invocation.args.insert(self.arg_name(meta.arg_name()), default.clone());
                    }
                }
                for param in spec.parameters_in(ParameterLocation::FormData) {
                    bind_one(param, None, &mut invocation.args, |n| self.arg_name(n))?;
                }
            }
        }
        Ok(())
    }
}

impl Stage for ParameterBinding {
    fn name(&self) -> &'static str {
        "parameter_binding"
    }

    fn on_request(&self, spec: &OperationSpec, invocation: &mut Invocation) -> Result<(), Problem> {
        let request = Arc::clone(&invocation.request);
        let parser = request.uri_parser().as_ref();

        let mut query = parser.resolve_query(request.query());
        let mut path = parser.resolve_path(request.path_params());
        let mut headers = parser.resolve_headers(request.headers());
        let mut cookies = parser.resolve_cookies(&request.cookies());

        for param in &spec.parameters {
            let source = match param.location {
                ParameterLocation::Query => &mut query,
                ParameterLocation::Path => &mut path,
                ParameterLocation::Header => &mut headers,
                ParameterLocation::Cookie => &mut cookies,
                ParameterLocation::FormData => continue,
            };
            let value = source.remove(&param.name);
            bind_one(param, value, &mut invocation.args, |n| self.arg_name(n))?;
        }

        self.bind_body(spec, invocation, parser)?;

        debug!(
            operation_id = %spec.operation_id,
            arg_count = invocation.args.len(),
            file_count = invocation.files.len(),
            "Bound handler arguments"
        );
        Ok(())
    }
}

fn bind_one(
    param: &ParameterMeta,
    value: Option<Value>,
    args: &mut Map<String, Value>,
    arg_name: impl Fn(&str) -> String,
) -> Result<(), Problem> {
    let value = match value.filter(|v| !v.is_null()) {
        Some(value) => value,
        None => match param.default_value() {
            Some(default) => default.clone(),
            None if param.required => {
                return Err(Problem::bad_request(format!(
                    "Missing {} parameter '{}'",
                    param.location, param.name
                )));
            }
            None => return Ok(()),
        },
    };
    check_type(&param.name, param.location.as_str(), &value, param.schema.as_ref())?;
    args.insert(arg_name(&param.name), value);
    Ok(())
}

/// Reject values the URI parser could not coerce to their declared type.
fn check_type(
    name: &str,
    location: &str,
    value: &Value,
    schema: Option<&Value>,
) -> Result<(), Problem> {
    let expected = schema_type(schema);
    let mismatch = match (expected, value) {
        (Some("integer" | "number" | "boolean"), Value::String(_)) => expected,
        (Some("array"), Value::Array(items)) => {
            let item_schema = schema.and_then(|s| s.get("items"));
            match schema_type(item_schema) {
                Some(t @ ("integer" | "number" | "boolean")) => {
                    items.iter().any(Value::is_string).then_some(t)
                }
                _ => None,
            }
        }
        _ => None,
    };
    match mismatch {
        Some(expected) => Err(Problem::bad_request(format!(
            "Wrong type, expected '{expected}' for {location} parameter '{name}'"
        ))),
        None => Ok(()),
    }
}
