use crate::error::AdapterError;
use crate::http_facts::content_type_param;
use bytes::Bytes;
use serde_json::{Map, Value};

/// A file part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub field_name: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Decoded form body: ordered text fields (repeats kept) plus uploaded files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormData {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            files: Vec::new(),
        }
    }

    pub fn from_urlencoded(body: &[u8]) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(body).into_owned())
    }

    /// Parse a `multipart/form-data` body using the boundary in `content_type`.
    pub fn from_multipart(content_type: &str, body: &[u8]) -> Result<Self, AdapterError> {
        let boundary = content_type_param(content_type, "boundary")
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AdapterError::Multipart("missing boundary".into()))?;
        let delimiter = format!("--{boundary}").into_bytes();

        let mut form = FormData::default();
        let mut pos = find(body, &delimiter, 0)
            .ok_or_else(|| AdapterError::Multipart("opening boundary not found".into()))?;

        loop {
            pos += delimiter.len();
            if body[pos..].starts_with(b"--") {
                break;
            }
            if !body[pos..].starts_with(b"\r\n") {
                return Err(AdapterError::Multipart("expected CRLF after boundary".into()));
            }
            pos += 2;

            let headers_end = find(body, b"\r\n\r\n", pos)
                .ok_or_else(|| AdapterError::Multipart("unterminated part headers".into()))?;
            let headers = std::str::from_utf8(&body[pos..headers_end])
                .map_err(|_| AdapterError::Multipart("part headers are not UTF-8".into()))?;
            let data_start = headers_end + 4;

            let next = find(body, &delimiter, data_start)
                .ok_or_else(|| AdapterError::Multipart("closing boundary not found".into()))?;
            let data_end = if next >= 2 && &body[next - 2..next] == b"\r\n" {
                next - 2
            } else {
                next
            };
            form.push_part(headers, &body[data_start..data_end.max(data_start)])?;
            pos = next;
        }

        Ok(form)
    }

    fn push_part(&mut self, headers: &str, data: &[u8]) -> Result<(), AdapterError> {
        let mut disposition = None;
        let mut content_type = None;
        for line in headers.split("\r\n") {
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim();
                if name.eq_ignore_ascii_case("content-disposition") {
                    disposition = Some(value.trim());
                } else if name.eq_ignore_ascii_case("content-type") {
                    content_type = Some(value.trim().to_string());
                }
            }
        }
        let disposition = disposition
            .ok_or_else(|| AdapterError::Multipart("part without Content-Disposition".into()))?;
        let field_name = disposition_param(disposition, "name")
            .ok_or_else(|| AdapterError::Multipart("part without a name".into()))?;

        match disposition_param(disposition, "filename") {
            Some(filename) => self.files.push(UploadedFile {
                field_name,
                filename,
                content_type,
                data: Bytes::copy_from_slice(data),
            }),
            None => self
                .fields
                .push((field_name, String::from_utf8_lossy(data).into_owned())),
        }
        Ok(())
    }

    /// First value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field_name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// Flat JSON view: every field mapped to its first value.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (k, v) in &self.fields {
            if !map.contains_key(k) {
                map.insert(k.clone(), Value::String(v.clone()));
            }
        }
        Value::Object(map)
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn disposition_param(disposition: &str, key: &str) -> Option<String> {
    disposition.split(';').skip(1).find_map(|part| {
        let (k, v) = part.trim().split_once('=')?;
        if !k.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        let v = v.trim();
        let v = v
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(v);
        Some(v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CT: &str = "multipart/form-data; boundary=XyZ";

    #[test]
    fn test_urlencoded_keeps_repeats() {
        let form = FormData::from_urlencoded(b"a=1&b=2&a=3&name=J%C3%BCrgen+S");
        assert_eq!(form.get("a"), Some("1"));
        assert_eq!(form.get_all("a"), vec!["1", "3"]);
        assert_eq!(form.get("name"), Some("Jürgen S"));
        assert_eq!(form.to_json(), json!({"a": "1", "b": "2", "name": "Jürgen S"}));
    }

    #[test]
    fn test_multipart_fields_and_files() {
        let body = b"--XyZ\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\r\n\
hello\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
Content-Type: text/plain\r\n\r\n\
file body\r\n\
--XyZ--\r\n";
        let form = FormData::from_multipart(CT, body).unwrap();
        assert_eq!(form.get("title"), Some("hello"));
        let file = form.file("upload").unwrap();
        assert_eq!(file.filename, "a.txt");
        assert_eq!(file.content_type.as_deref(), Some("text/plain"));
        assert_eq!(&file.data[..], b"file body");
    }

    #[test]
    fn test_multipart_missing_boundary() {
        let err = FormData::from_multipart("multipart/form-data", b"--x--").unwrap_err();
        assert!(matches!(err, AdapterError::Multipart(_)));
    }

    #[test]
    fn test_multipart_truncated() {
        let body = b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nvalue";
        assert!(FormData::from_multipart(CT, body).is_err());
    }
}
