use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::header::{Header, HeaderMap};
use crate::mimeheader::MimeContentTypeHeader;
use crate::rfc5322::Rfc5322Builder;

pub(crate) const BOUNDARY_LENGTH: usize = 30;

/// One node of a MIME document: either a leaf with an encoded body, or a
/// `multipart/mixed` container whose children are rendered between
/// boundary lines.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MimePart {
    /// The headers for this part
    pub headers: HeaderMap,

    /// The content of this part, already transfer-encoded and CRLF-terminated.
    body: String,

    /// The sub-parts of a multipart container
    children: Vec<MimePart>,

    /// The boundary between children, `None` for leaf parts
    boundary: Option<String>,
}

impl MimePart {
    pub fn random_boundary() -> String {
        let mut rng = thread_rng();
        std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .take(BOUNDARY_LENGTH)
            .collect()
    }

    /// A leaf part with the given headers and encoded body.
    pub fn new(headers: HeaderMap, body: String) -> MimePart {
        MimePart {
            headers,
            body,
            children: Vec::new(),
            boundary: None,
        }
    }

    /// An empty `multipart/mixed` container.
    pub fn new_multipart(boundary: String) -> MimePart {
        let mut headers = HeaderMap::new();
        headers.insert(Header::new_with_value(
            "Content-Type",
            MimeContentTypeHeader::new("multipart", "mixed").param("boundary", boundary.as_str()),
        ));
        headers.insert(Header::new("MIME-Version", "1.0"));

        MimePart {
            headers,
            body: String::new(),
            children: Vec::new(),
            boundary: Some(boundary),
        }
    }

    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    pub fn children(&self) -> &[MimePart] {
        &self.children
    }

    pub fn push(&mut self, child: MimePart) {
        self.children.push(child);
    }

    pub fn as_string(&self) -> String {
        let mut builder = Rfc5322Builder::new();
        self.write_to(&mut builder);
        builder.into_result()
    }

    fn write_to(&self, builder: &mut Rfc5322Builder) {
        for header in self.headers.iter() {
            builder.emit_header(header);
        }
        builder.emit_raw("\r\n");
        builder.emit_raw(&self.body);

        if let Some(ref boundary) = self.boundary {
            for part in self.children.iter() {
                builder.emit_raw(&format!("--{}\r\n", boundary));
                part.write_to(builder);
            }
            builder.emit_raw(&format!("--{}--\r\n", boundary));
        }
    }
}
