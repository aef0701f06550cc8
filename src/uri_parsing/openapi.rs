use super::core::{
    coerce_primitive, group_pairs, split_by_style, ParamDefs, UriParser, UriParserKind,
};
use crate::lifecycle::ParamVec;
use crate::spec::{ParameterLocation, ParameterMeta, ParameterStyle};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// OpenAPI 3 parser honouring `style` and `explode`.
///
/// Exploded `form`-family arrays collect every repeat of the key; all other
/// arrays take the last occurrence and split it on the style delimiter.
/// `deepObject` keys (`filter[color]=red`) and exploded `form` objects are
/// reassembled from their individual query keys.
#[derive(Debug, Clone, Default)]
pub struct OpenApiUriParser {
    defs: ParamDefs,
}

impl OpenApiUriParser {
    pub fn new(params: Vec<ParameterMeta>, body_schema: Option<Value>) -> Self {
        Self {
            defs: ParamDefs {
                params,
                body_schema,
            },
        }
    }

    fn is_multi(param: &ParameterMeta) -> bool {
        param.is_array()
            && param.effective_explode()
            && matches!(
                param.location,
                ParameterLocation::Query | ParameterLocation::Cookie | ParameterLocation::FormData
            )
            && matches!(
                param.effective_style(),
                ParameterStyle::Form
                    | ParameterStyle::SpaceDelimited
                    | ParameterStyle::PipeDelimited
            )
    }

    fn query_params(&self) -> impl Iterator<Item = &ParameterMeta> + '_ {
        self.defs
            .params
            .iter()
            .filter(|p| p.location == ParameterLocation::Query)
    }
}

/// `filter[color][shade]` becomes `("filter", ["color", "shade"])`.
fn deep_object_key(key: &str) -> Option<(&str, Vec<&str>)> {
    let open = key.find('[')?;
    let (base, mut rest) = key.split_at(open);
    let mut path = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        let close = stripped.find(']')?;
        path.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }
    if !rest.is_empty() || path.is_empty() {
        return None;
    }
    Some((base, path))
}

fn insert_nested(
    target: &mut Map<String, Value>,
    path: &[&str],
    value: Value,
    schema: Option<&Value>,
) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    let prop_schema = schema
        .and_then(|s| s.get("properties"))
        .and_then(|p| p.get(*head));
    if tail.is_empty() {
        let value = match value {
            Value::String(s) => coerce_primitive(&s, prop_schema),
            other => other,
        };
        target.insert((*head).to_string(), value);
        return;
    }
    let entry = target
        .entry((*head).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(child) = entry {
        insert_nested(child, tail, value, prop_schema);
    }
}

impl UriParser for OpenApiUriParser {
    fn kind(&self) -> UriParserKind {
        UriParserKind::OpenApi
    }

    fn param_defns(&self) -> &[ParameterMeta] {
        &self.defs.params
    }

    fn body_schema(&self) -> Option<&Value> {
        self.defs.body_schema.as_ref()
    }

    fn resolve_param_duplicates<'a>(
        &self,
        values: &[&'a str],
        param: Option<&ParameterMeta>,
    ) -> Vec<&'a str> {
        match param {
            Some(p) if Self::is_multi(p) => values.to_vec(),
            _ => values.last().copied().into_iter().collect(),
        }
    }

    fn split(&self, value: &str, param: &ParameterMeta) -> Vec<String> {
        if Self::is_multi(param) {
            return vec![value.to_string()];
        }
        split_by_style(value, param)
    }

    fn resolve_query(&self, query: &ParamVec) -> Map<String, Value> {
        let grouped = group_pairs(query);
        let mut out = Map::new();
        let mut consumed: HashSet<&str> = HashSet::new();

        for param in self
            .query_params()
            .filter(|p| p.effective_style() == ParameterStyle::DeepObject)
        {
            let mut obj = Map::new();
            for (key, values) in &grouped {
                let Some((base, path)) = deep_object_key(key) else {
                    continue;
                };
                if base != param.name {
                    continue;
                }
                if let Some(last) = values.last() {
                    let raw = Value::String((*last).to_string());
                    insert_nested(&mut obj, &path, raw, param.schema.as_ref());
                }
                consumed.insert(*key);
            }
            if !obj.is_empty() {
                out.insert(param.name.clone(), Value::Object(obj));
            }
        }

        for param in self.query_params().filter(|p| {
            p.is_object() && p.effective_style() == ParameterStyle::Form && p.effective_explode()
        }) {
            let Some(props) = param
                .schema
                .as_ref()
                .and_then(|s| s.get("properties"))
                .and_then(Value::as_object)
            else {
                continue;
            };
            let mut obj = Map::new();
            for (key, values) in &grouped {
                let Some(prop_schema) = props.get(*key) else {
                    continue;
                };
                if self.param_defn(key, ParameterLocation::Query).is_some() {
                    continue;
                }
                if let Some(last) = values.last() {
                    obj.insert((*key).to_string(), coerce_primitive(last, Some(prop_schema)));
                    consumed.insert(*key);
                }
            }
            if !obj.is_empty() {
                out.insert(param.name.clone(), Value::Object(obj));
            }
        }

        for (name, values) in &grouped {
            if consumed.contains(name) {
                continue;
            }
            let param = self.param_defn(name, ParameterLocation::Query);
            out.insert((*name).to_string(), self.resolve_value(param, values));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_object_key() {
        assert_eq!(deep_object_key("filter[color]"), Some(("filter", vec!["color"])));
        assert_eq!(
            deep_object_key("a[b][c]"),
            Some(("a", vec!["b", "c"]))
        );
        assert_eq!(deep_object_key("plain"), None);
        assert_eq!(deep_object_key("a[b"), None);
        assert_eq!(deep_object_key("a[b]x"), None);
    }

    #[test]
    fn test_resolve_duplicates_non_exploded_takes_last() {
        let p = ParameterMeta::query("ids")
            .schema(serde_json::json!({"type": "array"}))
            .explode(false);
        let parser = OpenApiUriParser::new(vec![p.clone()], None);
        assert_eq!(parser.resolve_param_duplicates(&["a,b", "c"], Some(&p)), vec!["c"]);
    }
}
