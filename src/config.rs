//! # API Configuration
//!
//! [`ApiOptions`] holds the settings shared by every operation mounted on an
//! [`Api`](crate::api::Api). Options can be written in code, loaded from a
//! YAML file, read from the environment, or layered: file first, then
//! environment overrides.
//!
//! ## YAML
//!
//! ```yaml
//! base_path: /v1
//! pythonic_params: true
//! json_indent: 0
//! validate_requests: true
//! validate_responses: false
//! uri_parser: swagger2
//! ```
//!
//! Every key is optional.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Example |
//! |----------|-------|---------|
//! | `OASB_BASE_PATH` | `base_path` | `/v1` |
//! | `OASB_PYTHONIC_PARAMS` | `pythonic_params` | `true` |
//! | `OASB_JSON_INDENT` | `json_indent` | `0` |
//! | `OASB_VALIDATE_REQUESTS` | `validate_requests` | `false` |
//! | `OASB_VALIDATE_RESPONSES` | `validate_responses` | `true` |
//! | `OASB_URI_PARSER` | `uri_parser` | `first_value` |
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`. Values that do
//! not parse are ignored with a warning.

use crate::uri_parsing::UriParserKind;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiOptions {
    /// Prefix of every route rule
    pub base_path: String,
    /// snake_case handler argument names
    pub pythonic_params: bool,
    /// Indentation of JSON responses; `0` is compact
    pub json_indent: usize,
    pub validate_requests: bool,
    pub validate_responses: bool,
    /// Parser used by operations that do not pick their own
    pub uri_parser: UriParserKind,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            pythonic_params: false,
            json_indent: 2,
            validate_requests: true,
            validate_responses: false,
            uri_parser: UriParserKind::OpenApi,
        }
    }
}

impl ApiOptions {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("failed to parse API options")
    }

    /// Load from a YAML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read API options from {}", path.display()))?;
        let options = Self::from_yaml_str(&raw)
            .with_context(|| format!("invalid API options in {}", path.display()))?;
        Ok(options.with_env_overrides())
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_path) = env::var("OASB_BASE_PATH") {
            self.base_path = base_path;
        }
        if let Some(v) = env_bool("OASB_PYTHONIC_PARAMS") {
            self.pythonic_params = v;
        }
        if let Ok(raw) = env::var("OASB_JSON_INDENT") {
            match raw.trim().parse() {
                Ok(indent) => self.json_indent = indent,
                Err(_) => warn!(var = "OASB_JSON_INDENT", value = %raw, "Ignoring invalid value"),
            }
        }
        if let Some(v) = env_bool("OASB_VALIDATE_REQUESTS") {
            self.validate_requests = v;
        }
        if let Some(v) = env_bool("OASB_VALIDATE_RESPONSES") {
            self.validate_responses = v;
        }
        if let Ok(raw) = env::var("OASB_URI_PARSER") {
            match UriParserKind::parse(raw.trim()) {
                Some(kind) => self.uri_parser = kind,
                None => warn!(var = "OASB_URI_PARSER", value = %raw, "Ignoring invalid value"),
            }
        }
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn pythonic_params(mut self, enabled: bool) -> Self {
        self.pythonic_params = enabled;
        self
    }

    pub fn json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    pub fn validate_requests(mut self, enabled: bool) -> Self {
        self.validate_requests = enabled;
        self
    }

    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    pub fn uri_parser(mut self, kind: UriParserKind) -> Self {
        self.uri_parser = kind;
        self
    }
}

fn env_bool(var: &str) -> Option<bool> {
    let raw = env::var(var).ok()?;
    match parse_bool(&raw) {
        Some(v) => Some(v),
        None => {
            warn!(var, value = %raw, "Ignoring invalid boolean");
            None
        }
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
