//! Route-rule and endpoint-name sanitization.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use ulid::Ulid;

#[allow(clippy::expect_used)]
static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("path parameter regex should be valid"));

/// Separator between an endpoint name and its random suffix.
pub const RANDOM_SUFFIX_SEPARATOR: char = '|';

/// Convert an OpenAPI path template into a route rule.
///
/// Parameter names have `-` replaced by `_`; parameters whose type is
/// `path` become catch-all segments written `{*name}`.
///
/// ```rust
/// use std::collections::HashMap;
/// use oasbridge::sanitize::route_path;
///
/// let mut types = HashMap::new();
/// types.insert("file-path".to_string(), "path");
/// assert_eq!(route_path("/pets/{pet-id}", &HashMap::new()), "/pets/{pet_id}");
/// assert_eq!(route_path("/files/{file-path}", &types), "/files/{*file_path}");
/// ```
pub fn route_path(path: &str, types: &HashMap<String, &'static str>) -> String {
    PATH_PARAM
        .replace_all(path, |caps: &regex::Captures<'_>| {
            let raw = &caps[1];
            let name = raw.replace('-', "_");
            match types.get(raw).copied() {
                Some("path") => format!("{{*{name}}}"),
                _ => format!("{{{name}}}"),
            }
        })
        .into_owned()
}

/// Endpoint name for an operation id, with an optional random suffix.
///
/// `.` becomes `_`. With `randomize = Some(n)`, `n` characters from
/// `[A-Z0-9]` are appended after `|` so repeated registrations stay unique.
pub fn endpoint_name(operation_id: &str, randomize: Option<usize>) -> String {
    let mut name = operation_id.replace('.', "_");
    if let Some(len) = randomize.filter(|n| *n > 0) {
        name.push(RANDOM_SUFFIX_SEPARATOR);
        name.push_str(&random_suffix(len));
    }
    name
}

fn random_suffix(len: usize) -> String {
    let mut suffix = String::with_capacity(len);
    while suffix.len() < len {
        // The last 16 characters of a ULID are its random component
        let id = Ulid::new().to_string();
        let random = &id[id.len() - 16..];
        let take = (len - suffix.len()).min(random.len());
        suffix.push_str(&random[..take]);
    }
    suffix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path_plain() {
        let types = HashMap::new();
        assert_eq!(route_path("/pets", &types), "/pets");
        assert_eq!(route_path("/a/{b}/c/{d-e}", &types), "/a/{b}/c/{d_e}");
    }

    #[test]
    fn test_route_path_catch_all() {
        let mut types = HashMap::new();
        types.insert("rest".to_string(), "path");
        types.insert("id".to_string(), "int");
        assert_eq!(route_path("/x/{id}/{rest}", &types), "/x/{id}/{*rest}");
    }

    #[test]
    fn test_endpoint_name() {
        assert_eq!(endpoint_name("api.pets.get", None), "api_pets_get");
        assert_eq!(endpoint_name("get", Some(0)), "get");
    }

    #[test]
    fn test_randomized_endpoint_name() {
        let name = endpoint_name("get_pet", Some(20));
        let (base, suffix) = name.split_once('|').unwrap();
        assert_eq!(base, "get_pet");
        assert_eq!(suffix.len(), 20);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_ne!(name, endpoint_name("get_pet", Some(20)));
    }
}
