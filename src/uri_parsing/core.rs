use crate::lifecycle::{FormData, ParamVec};
use crate::spec::{schema_type, ParameterLocation, ParameterMeta, ParameterStyle};
use http::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{AlwaysMultiUriParser, FirstValueUriParser, OpenApiUriParser, Swagger2UriParser};

/// Raw values of one parameter name, in arrival order.
pub type Grouped<'a> = Vec<(&'a str, Vec<&'a str>)>;

/// Strategy decoding raw path, query, form, header and cookie strings into
/// JSON values typed by the declared parameter schemas.
///
/// Implementations differ in how repeated keys and delimiters are treated.
pub trait UriParser: Send + Sync + fmt::Debug {
    fn kind(&self) -> UriParserKind;

    fn param_defns(&self) -> &[ParameterMeta];

    /// Request body schema; its properties describe OpenAPI 3 form fields.
    fn body_schema(&self) -> Option<&Value>;

    /// Pick which of the repeated raw values feed the parameter.
    fn resolve_param_duplicates<'a>(
        &self,
        values: &[&'a str],
        param: Option<&ParameterMeta>,
    ) -> Vec<&'a str>;

    /// Split one raw value into array items.
    fn split(&self, value: &str, param: &ParameterMeta) -> Vec<String>;

    fn param_defn(&self, name: &str, location: ParameterLocation) -> Option<&ParameterMeta> {
        self.param_defns()
            .iter()
            .find(|p| p.location == location && p.name == name)
    }

    /// Decode the raw values of a single parameter.
    fn resolve_value(&self, param: Option<&ParameterMeta>, values: &[&str]) -> Value {
        let chosen = self.resolve_param_duplicates(values, param);
        let Some(param) = param else {
            return chosen
                .last()
                .map(|v| Value::String((*v).to_string()))
                .unwrap_or(Value::Null);
        };
        if param.is_array() {
            let items = param.items_schema();
            let values = chosen
                .iter()
                .flat_map(|raw| self.split(raw, param))
                .filter(|item| !item.is_empty())
                .map(|item| coerce_primitive(&item, items))
                .collect();
            return Value::Array(values);
        }
        match chosen.last() {
            Some(raw) if param.is_object() => decode_object(raw, param),
            Some(raw) => coerce_primitive(raw, param.schema.as_ref()),
            None => Value::Null,
        }
    }

    fn resolve_params(
        &self,
        location: ParameterLocation,
        grouped: &Grouped<'_>,
    ) -> Map<String, Value> {
        grouped
            .iter()
            .map(|(name, values)| {
                let param = self.param_defn(name, location);
                ((*name).to_string(), self.resolve_value(param, values))
            })
            .collect()
    }

    fn resolve_query(&self, query: &ParamVec) -> Map<String, Value> {
        self.resolve_params(ParameterLocation::Query, &group_pairs(query))
    }

    fn resolve_path(&self, path: &ParamVec) -> Map<String, Value> {
        path.iter()
            .map(|(name, raw)| {
                let param = self.param_defn(name, ParameterLocation::Path);
                let raw = match param {
                    Some(p) => strip_path_prefix(raw, p),
                    None => raw.as_str(),
                };
                (name.to_string(), self.resolve_value(param, &[raw]))
            })
            .collect()
    }

    /// Decode form fields, typing them from `formData` parameters or, for
    /// OpenAPI 3, from the request body schema's properties.
    fn resolve_form(&self, form: &FormData) -> Map<String, Value> {
        let mut grouped: Grouped<'_> = Vec::new();
        for (k, v) in form.fields() {
            push_grouped(&mut grouped, k, v);
        }
        grouped
            .iter()
            .map(|(name, values)| {
                let value = match self.param_defn(name, ParameterLocation::FormData) {
                    Some(param) => self.resolve_value(Some(param), values),
                    None => {
                        let synthetic = self.form_property(name);
                        self.resolve_value(synthetic.as_ref(), values)
                    }
                };
                ((*name).to_string(), value)
            })
            .collect()
    }

    /// Declared header parameters present on the request.
    fn resolve_headers(&self, headers: &HeaderMap) -> Map<String, Value> {
        self.param_defns()
            .iter()
            .filter(|p| p.location == ParameterLocation::Header)
            .filter_map(|p| {
                let values: Vec<&str> = headers
                    .get_all(p.name.as_str())
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .collect();
                if values.is_empty() {
                    return None;
                }
                // Repeated header lines are equivalent to one comma-joined line
                let joined = values.join(",");
                Some((p.name.clone(), self.resolve_value(Some(p), &[joined.as_str()])))
            })
            .collect()
    }

    /// Declared cookie parameters present on the request.
    fn resolve_cookies(&self, cookies: &HashMap<String, String>) -> Map<String, Value> {
        self.param_defns()
            .iter()
            .filter(|p| p.location == ParameterLocation::Cookie)
            .filter_map(|p| {
                let raw = cookies.get(&p.name)?;
                Some((p.name.clone(), self.resolve_value(Some(p), &[raw.as_str()])))
            })
            .collect()
    }

    fn form_property(&self, name: &str) -> Option<ParameterMeta> {
        let prop = self.body_schema()?.get("properties")?.get(name)?;
        Some(ParameterMeta::form(name).schema(prop.clone()))
    }
}

/// Which [`UriParser`] implementation an operation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UriParserKind {
    /// OpenAPI 3 `style`/`explode` semantics
    #[default]
    #[serde(rename = "openapi", alias = "openapi3")]
    OpenApi,
    /// Swagger 2 `collectionFormat` semantics
    Swagger2,
    /// First occurrence of a repeated key wins
    FirstValue,
    /// Every occurrence of a repeated array key is collected
    AlwaysMulti,
}

impl UriParserKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "openapi" | "openapi3" => Some(UriParserKind::OpenApi),
            "swagger2" => Some(UriParserKind::Swagger2),
            "first_value" => Some(UriParserKind::FirstValue),
            "always_multi" => Some(UriParserKind::AlwaysMulti),
            _ => None,
        }
    }

    pub fn build(
        &self,
        params: Vec<ParameterMeta>,
        body_schema: Option<Value>,
    ) -> Arc<dyn UriParser> {
        match self {
            UriParserKind::OpenApi => Arc::new(OpenApiUriParser::new(params, body_schema)),
            UriParserKind::Swagger2 => Arc::new(Swagger2UriParser::new(params, body_schema)),
            UriParserKind::FirstValue => Arc::new(FirstValueUriParser::new(params, body_schema)),
            UriParserKind::AlwaysMulti => {
                Arc::new(AlwaysMultiUriParser::new(params, body_schema))
            }
        }
    }
}

impl fmt::Display for UriParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UriParserKind::OpenApi => "openapi",
            UriParserKind::Swagger2 => "swagger2",
            UriParserKind::FirstValue => "first_value",
            UriParserKind::AlwaysMulti => "always_multi",
        };
        f.write_str(s)
    }
}

/// Parameter definitions shared by every parser implementation.
#[derive(Debug, Clone, Default)]
pub struct ParamDefs {
    pub params: Vec<ParameterMeta>,
    pub body_schema: Option<Value>,
}

pub fn group_pairs(pairs: &ParamVec) -> Grouped<'_> {
    let mut grouped: Grouped<'_> = Vec::new();
    for (k, v) in pairs {
        push_grouped(&mut grouped, k, v);
    }
    grouped
}

fn push_grouped<'a>(grouped: &mut Grouped<'a>, key: &'a str, value: &'a str) {
    match grouped.iter_mut().find(|(k, _)| *k == key) {
        Some((_, values)) => values.push(value),
        None => grouped.push((key, vec![value])),
    }
}

/// Convert a raw string to the JSON type named by `schema`.
///
/// Values that do not parse are kept as strings so validation can report them.
pub fn coerce_primitive(raw: &str, schema: Option<&Value>) -> Value {
    match schema_type(schema) {
        Some("integer") => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some("boolean") => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

/// Decode a single-string object value (`simple`/`form` styles, or a JSON literal).
pub fn decode_object(raw: &str, param: &ParameterMeta) -> Value {
    if raw.trim_start().starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return value;
        }
    }
    let props = param.schema.as_ref().and_then(|s| s.get("properties"));
    let mut map = Map::new();
    if param.effective_explode() {
        // R=100,G=200
        for pair in raw.split(',').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            map.insert(k.to_string(), coerce_primitive(v, props.and_then(|p| p.get(k))));
        }
    } else {
        // R,100,G,200
        let parts: Vec<&str> = raw.split(',').collect();
        for chunk in parts.chunks(2) {
            let k = chunk[0];
            let v = chunk.get(1).copied().unwrap_or("");
            if !k.is_empty() {
                map.insert(k.to_string(), coerce_primitive(v, props.and_then(|p| p.get(k))));
            }
        }
    }
    Value::Object(map)
}

/// Remove the `label` (`.`) or `matrix` (`;name=`) prefix from a path value.
fn strip_path_prefix<'a>(raw: &'a str, param: &ParameterMeta) -> &'a str {
    match param.effective_style() {
        ParameterStyle::Label => raw.strip_prefix('.').unwrap_or(raw),
        ParameterStyle::Matrix => {
            let prefix = format!(";{}=", param.name);
            raw.strip_prefix(prefix.as_str()).unwrap_or(raw)
        }
        _ => raw,
    }
}

/// Split honouring the OpenAPI style of the parameter.
pub(crate) fn split_by_style(value: &str, param: &ParameterMeta) -> Vec<String> {
    match param.effective_style() {
        ParameterStyle::Matrix if param.effective_explode() => {
            // a;ids=b;ids=c (first prefix already stripped)
            let repeat = format!(";{}=", param.name);
            value.split(repeat.as_str()).map(str::to_string).collect()
        }
        ParameterStyle::Label if param.effective_explode() => {
            value.split('.').map(str::to_string).collect()
        }
        style => value
            .split(style.delimiter())
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_primitive() {
        let int = json!({"type": "integer"});
        assert_eq!(coerce_primitive("42", Some(&int)), json!(42));
        assert_eq!(coerce_primitive("4x", Some(&int)), json!("4x"));
        let num = json!({"type": "number"});
        assert_eq!(coerce_primitive("1.5", Some(&num)), json!(1.5));
        let b = json!({"type": "boolean"});
        assert_eq!(coerce_primitive("true", Some(&b)), json!(true));
        assert_eq!(coerce_primitive("True", Some(&b)), json!("True"));
        assert_eq!(coerce_primitive("x", None), json!("x"));
    }

    #[test]
    fn test_decode_object_pairs() {
        let p = ParameterMeta::path("color")
            .schema(json!({"type": "object", "properties": {"R": {"type": "integer"}}}));
        assert_eq!(decode_object("R,100,G,200", &p), json!({"R": 100, "G": "200"}));
        let exploded = p.clone().explode(true);
        assert_eq!(decode_object("R=100,G=200", &exploded), json!({"R": 100, "G": "200"}));
    }

    #[test]
    fn test_decode_object_json_literal() {
        let p = ParameterMeta::query("filter").schema(json!({"type": "object"}));
        assert_eq!(decode_object("{\"a\":1}", &p), json!({"a": 1}));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(UriParserKind::parse("Swagger2"), Some(UriParserKind::Swagger2));
        assert_eq!(UriParserKind::parse("first-value"), Some(UriParserKind::FirstValue));
        assert_eq!(UriParserKind::parse("always_multi"), Some(UriParserKind::AlwaysMulti));
        assert_eq!(UriParserKind::parse("nope"), None);
        assert_eq!(UriParserKind::default().to_string(), "openapi");
    }

    #[test]
    fn test_group_pairs_keeps_order() {
        let mut q = ParamVec::new();
        q.push((Arc::from("b"), "1".into()));
        q.push((Arc::from("a"), "2".into()));
        q.push((Arc::from("b"), "3".into()));
        let grouped = group_pairs(&q);
        assert_eq!(grouped, vec![("b", vec!["1", "3"]), ("a", vec!["2"])]);
    }
}
