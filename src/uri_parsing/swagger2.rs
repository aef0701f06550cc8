use super::core::{ParamDefs, UriParser, UriParserKind};
use crate::spec::{CollectionFormat, ParameterMeta};
use serde_json::Value;

fn collection_format(param: &ParameterMeta) -> CollectionFormat {
    param.collection_format.unwrap_or_default()
}

fn split_collection(value: &str, param: &ParameterMeta) -> Vec<String> {
    match collection_format(param).delimiter() {
        Some(delim) => value.split(delim).map(str::to_string).collect(),
        None => vec![value.to_string()],
    }
}

fn last<'a>(values: &[&'a str]) -> Vec<&'a str> {
    values.last().copied().into_iter().collect()
}

macro_rules! param_defs_accessors {
    ($kind:expr) => {
        fn kind(&self) -> UriParserKind {
            $kind
        }

        fn param_defns(&self) -> &[ParameterMeta] {
            &self.defs.params
        }

        fn body_schema(&self) -> Option<&Value> {
            self.defs.body_schema.as_ref()
        }

        fn split(&self, value: &str, param: &ParameterMeta) -> Vec<String> {
            split_collection(value, param)
        }
    };
}

/// Swagger 2 parser driven by `collectionFormat`.
///
/// `multi` arrays collect every repeat of the key; other formats take the
/// last occurrence and split it (`csv` by default).
#[derive(Debug, Clone, Default)]
pub struct Swagger2UriParser {
    defs: ParamDefs,
}

impl Swagger2UriParser {
    pub fn new(params: Vec<ParameterMeta>, body_schema: Option<Value>) -> Self {
        Self {
            defs: ParamDefs {
                params,
                body_schema,
            },
        }
    }
}

impl UriParser for Swagger2UriParser {
    param_defs_accessors!(UriParserKind::Swagger2);

    fn resolve_param_duplicates<'a>(
        &self,
        values: &[&'a str],
        param: Option<&ParameterMeta>,
    ) -> Vec<&'a str> {
        match param {
            Some(p) if p.is_array() && collection_format(p) == CollectionFormat::Multi => {
                values.to_vec()
            }
            _ => last(values),
        }
    }
}

/// Takes the first occurrence of a repeated key and ignores the rest.
#[derive(Debug, Clone, Default)]
pub struct FirstValueUriParser {
    defs: ParamDefs,
}

impl FirstValueUriParser {
    pub fn new(params: Vec<ParameterMeta>, body_schema: Option<Value>) -> Self {
        Self {
            defs: ParamDefs {
                params,
                body_schema,
            },
        }
    }
}

impl UriParser for FirstValueUriParser {
    param_defs_accessors!(UriParserKind::FirstValue);

    fn resolve_param_duplicates<'a>(
        &self,
        values: &[&'a str],
        _param: Option<&ParameterMeta>,
    ) -> Vec<&'a str> {
        values.first().copied().into_iter().collect()
    }
}

/// Collects every occurrence of a repeated array key, splitting each one.
///
/// `?tags=a,b&tags=c` yields `["a", "b", "c"]` regardless of `collectionFormat`.
#[derive(Debug, Clone, Default)]
pub struct AlwaysMultiUriParser {
    defs: ParamDefs,
}

impl AlwaysMultiUriParser {
    pub fn new(params: Vec<ParameterMeta>, body_schema: Option<Value>) -> Self {
        Self {
            defs: ParamDefs {
                params,
                body_schema,
            },
        }
    }
}

impl UriParser for AlwaysMultiUriParser {
    param_defs_accessors!(UriParserKind::AlwaysMulti);

    fn resolve_param_duplicates<'a>(
        &self,
        values: &[&'a str],
        param: Option<&ParameterMeta>,
    ) -> Vec<&'a str> {
        match param {
            Some(p) if p.is_array() => values.to_vec(),
            _ => last(values),
        }
    }
}
