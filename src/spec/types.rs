use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Where a parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// Swagger 2 `in: formData`; OpenAPI 3 form bodies are mapped here as well.
    FormData,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::FormData => "formData",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OpenAPI 3 `style` serialization of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    /// Style assumed when the parameter declares none.
    pub fn default_for(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
            ParameterLocation::Query | ParameterLocation::Cookie | ParameterLocation::FormData => {
                ParameterStyle::Form
            }
        }
    }

    /// Separator between array items for the non-exploded form of this style.
    pub fn delimiter(&self) -> char {
        match self {
            ParameterStyle::SpaceDelimited => ' ',
            ParameterStyle::PipeDelimited => '|',
            ParameterStyle::Matrix
            | ParameterStyle::Label
            | ParameterStyle::Form
            | ParameterStyle::Simple
            | ParameterStyle::DeepObject => ',',
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "matrix" => Some(ParameterStyle::Matrix),
            "label" => Some(ParameterStyle::Label),
            "form" => Some(ParameterStyle::Form),
            "simple" => Some(ParameterStyle::Simple),
            "spaceDelimited" => Some(ParameterStyle::SpaceDelimited),
            "pipeDelimited" => Some(ParameterStyle::PipeDelimited),
            "deepObject" => Some(ParameterStyle::DeepObject),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        };
        write!(f, "{}", s)
    }
}

/// Swagger 2 `collectionFormat` of an array parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    #[default]
    Csv,
    Ssv,
    Tsv,
    Pipes,
    Multi,
}

impl CollectionFormat {
    /// `None` for `multi`, where every repeat of the key is one item.
    pub fn delimiter(&self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }
}

/// Declared metadata for one operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Value>,
    pub style: Option<ParameterStyle>,
    pub explode: Option<bool>,
    pub collection_format: Option<CollectionFormat>,
}

impl ParameterMeta {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            // Path parameters are always required in OpenAPI.
            required: location == ParameterLocation::Path,
            location,
            schema: None,
            style: None,
            explode: None,
            collection_format: None,
        }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Path)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Query)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Header)
    }

    pub fn cookie(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Cookie)
    }

    pub fn form(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::FormData)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn style(mut self, style: ParameterStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = Some(explode);
        self
    }

    pub fn collection_format(mut self, format: CollectionFormat) -> Self {
        self.collection_format = Some(format);
        self
    }

    /// The JSON schema `type` keyword, if declared.
    pub fn schema_type(&self) -> Option<&str> {
        schema_type(self.schema.as_ref())
    }

    pub fn items_schema(&self) -> Option<&Value> {
        self.schema.as_ref().and_then(|s| s.get("items"))
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.schema.as_ref().and_then(|s| s.get("default"))
    }

    pub fn effective_style(&self) -> ParameterStyle {
        self.style
            .unwrap_or_else(|| ParameterStyle::default_for(self.location))
    }

    /// `explode` defaults to true only for `form` style.
    pub fn effective_explode(&self) -> bool {
        self.explode
            .unwrap_or(self.effective_style() == ParameterStyle::Form)
    }

    pub fn is_array(&self) -> bool {
        self.schema_type() == Some("array")
    }

    pub fn is_object(&self) -> bool {
        self.schema_type() == Some("object")
    }
}

/// Declared request body of an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBodyMeta {
    pub schema: Option<Value>,
    pub required: bool,
    /// `x-body-name`: handler argument receiving the body (defaults to `body`).
    pub x_body_name: Option<String>,
}

impl RequestBodyMeta {
    pub fn new(schema: Value) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn body_name(mut self, name: impl Into<String>) -> Self {
        self.x_body_name = Some(name.into());
        self
    }

    pub fn arg_name(&self) -> &str {
        self.x_body_name.as_deref().unwrap_or("body")
    }
}

/// One alternative of an operation's `security` list: scheme name to required scopes.
pub type SecurityRequirement = HashMap<String, Vec<String>>;

pub(crate) fn schema_type(schema: Option<&Value>) -> Option<&str> {
    schema.and_then(|s| s.get("type")).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_styles_per_location() {
        assert_eq!(
            ParameterMeta::path("id").effective_style(),
            ParameterStyle::Simple
        );
        assert_eq!(
            ParameterMeta::query("tags").effective_style(),
            ParameterStyle::Form
        );
        assert!(ParameterMeta::query("tags").effective_explode());
        assert!(!ParameterMeta::header("x").effective_explode());
    }

    #[test]
    fn test_path_params_required_by_default() {
        assert!(ParameterMeta::path("id").required);
        assert!(!ParameterMeta::query("q").required);
    }

    #[test]
    fn test_style_parse_and_display() {
        let style = ParameterStyle::parse("pipeDelimited");
        assert_eq!(style, Some(ParameterStyle::PipeDelimited));
        assert_eq!(ParameterStyle::PipeDelimited.to_string(), "pipeDelimited");
        assert_eq!(ParameterStyle::parse("bogus"), None);
    }

    #[test]
    fn test_schema_helpers() {
        let p = ParameterMeta::query("ids")
            .schema(json!({"type": "array", "items": {"type": "integer"}, "default": [1]}));
        assert!(p.is_array());
        assert_eq!(p.items_schema(), Some(&json!({"type": "integer"})));
        assert_eq!(p.default_value(), Some(&json!([1])));
    }

    #[test]
    fn test_body_arg_name() {
        assert_eq!(RequestBodyMeta::new(json!({})).arg_name(), "body");
        assert_eq!(
            RequestBodyMeta::new(json!({})).body_name("pet").arg_name(),
            "pet"
        );
    }
}
