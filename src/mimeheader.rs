use std::fmt;

use crate::header::ToHeader;

/// Quote a header parameter value. Values that are not printable ascii,
/// including any holding a line break, are written as an encoded word.
fn quote_param(value: &str) -> String {
    let printable = value.chars().all(|c| c == ' ' || c.is_ascii_graphic());
    let value = if printable {
        value.to_string()
    } else {
        encoded_words::encode(value, None, encoded_words::EncodingFlag::Shortest, None)
    };
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Content-Type string, major/minor as the first and second elements
/// respectively.
pub type MimeContentType = (String, String);

/// Special header type for the Content-Type header.
///
/// Parameters are kept in insertion order so the rendered value is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeContentTypeHeader {
    /// The content type presented by this header
    pub content_type: MimeContentType,
    /// Parameters of this header, rendered quoted
    pub params: Vec<(String, String)>,
}

impl MimeContentTypeHeader {
    pub fn new(major: impl Into<String>, minor: impl Into<String>) -> Self {
        MimeContentTypeHeader {
            content_type: (major.into(), minor.into()),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

impl ToHeader for MimeContentTypeHeader {
    fn to_header(&self) -> String {
        let (ref major, ref minor) = self.content_type;
        let mut result = format!("{}/{}", major, minor);
        for (key, val) in self.params.iter() {
            result.push_str(&format!("; {}={}", key, quote_param(val)));
        }
        result
    }
}

/// Special header type for the Content-Transfer-Encoding header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MimeContentTransferEncoding {
    /// Plain 7-bit ascii lines.
    ///
    /// This encoding is defined in RFC 2045 Section 2.7
    SevenBit,
    /// Content transfered as BASE64
    ///
    /// This encoding is defined in RFC 2045 Section 6.8
    Base64,
}

impl fmt::Display for MimeContentTransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MimeContentTransferEncoding::SevenBit => f.write_str("7bit"),
            MimeContentTransferEncoding::Base64 => f.write_str("base64"),
        }
    }
}

impl ToHeader for MimeContentTransferEncoding {
    fn to_header(&self) -> String {
        self.to_string()
    }
}

/// The Content-Disposition header of an attachment part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeContentDisposition {
    pub filename: String,
}

impl ToHeader for MimeContentDisposition {
    fn to_header(&self) -> String {
        format!("attachment; filename={}", quote_param(&self.filename))
    }
}
