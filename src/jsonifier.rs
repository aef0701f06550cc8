//! JSON codec handed to the response normalizer.
//!
//! The codec is carried explicitly in [`ApiContext`](crate::api::ApiContext)
//! so two APIs in the same process can serialize differently.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// JSON encoder/decoder with a configurable indentation width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jsonifier {
    indent: usize,
}

impl Default for Jsonifier {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl Jsonifier {
    /// `indent == 0` produces compact output.
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Encode `value`, always terminated by a newline.
    pub fn to_vec<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(128);
        if self.indent == 0 {
            serde_json::to_writer(&mut out, value)?;
        } else {
            let indent = vec![b' '; self.indent];
            let formatter = PrettyFormatter::with_indent(&indent);
            let mut ser = Serializer::with_formatter(&mut out, formatter);
            value.serialize(&mut ser)?;
        }
        out.push(b'\n');
        Ok(out)
    }

    pub fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        let bytes = self.to_vec(value)?;
        // serde_json only ever writes UTF-8
        String::from_utf8(bytes).map_err(<serde_json::Error as serde::ser::Error>::custom)
    }

    pub fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> serde_json::Result<T> {
        serde_json::from_slice(data)
    }
}
