//! Content-type constants and mimetype predicates shared by the bindings.

pub const DEFAULT_MIMETYPE: &str = "application/json";

pub const FORM_CONTENT_TYPES: [&str; 2] =
    ["application/x-www-form-urlencoded", "multipart/form-data"];

pub const PROBLEM_MIMETYPE: &str = "application/problem+json";

/// Split a `Content-Type` value into its lowercased mimetype and the raw parameters.
///
/// `"Application/JSON; charset=utf-8"` yields `("application/json", Some("charset=utf-8"))`.
pub fn split_content_type(content_type: &str) -> (String, Option<&str>) {
    let mut parts = content_type.splitn(2, ';');
    let mimetype = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let params = parts.next().map(str::trim).filter(|p| !p.is_empty());
    (mimetype, params)
}

/// Look up a single parameter (e.g. `boundary`) in a content-type value.
pub fn content_type_param<'a>(content_type: &'a str, key: &str) -> Option<&'a str> {
    content_type.split(';').skip(1).find_map(|part| {
        let (k, v) = part.trim().split_once('=')?;
        k.trim()
            .eq_ignore_ascii_case(key)
            .then(|| v.trim().trim_matches('"'))
    })
}

/// True for `application/json` and any `application/*+json` type.
pub fn is_json_mimetype(mimetype: &str) -> bool {
    let (mimetype, _) = split_content_type(mimetype);
    match mimetype.split_once('/') {
        Some((maintype, subtype)) => {
            maintype == "application" && (subtype == "json" || subtype.ends_with("+json"))
        }
        None => false,
    }
}

pub fn is_form_mimetype(mimetype: &str) -> bool {
    let (mimetype, _) = split_content_type(mimetype);
    FORM_CONTENT_TYPES.contains(&mimetype.as_str())
}

const CHARSET_MIMETYPES: [&str; 6] = [
    "application/ecmascript",
    "application/javascript",
    "application/sql",
    "application/xml",
    "application/xml-dtd",
    "application/xml-external-parsed-entity",
];

/// Full `Content-Type` for a mimetype, adding `charset` to textual types.
///
/// `text/*`, `*+xml` and a few `application/*` script/XML types get the
/// charset; a mimetype that already carries parameters is left alone.
pub fn get_content_type(mimetype: &str, charset: &str) -> String {
    if mimetype.contains(';') {
        return mimetype.to_string();
    }
    let textual = mimetype.starts_with("text/")
        || mimetype.ends_with("+xml")
        || CHARSET_MIMETYPES.contains(&mimetype);
    if textual {
        format!("{mimetype}; charset={charset}")
    } else {
        mimetype.to_string()
    }
}

/// True when every entry is a JSON mimetype (vacuously true for an empty list).
pub fn all_json<S: AsRef<str>>(mimetypes: &[S]) -> bool {
    mimetypes.iter().all(|m| is_json_mimetype(m.as_ref()))
}
