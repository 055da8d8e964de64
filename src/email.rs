//! The message model: headers, one text body and ordered attachments.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;

use crate::address::{encode_address_header, parse_email_addr, split_addresses, AddressList};
use crate::attachment::Attachment;
use crate::error::{Error, Result};
use crate::header::{Header, HeaderMap};
use crate::message::MimePart;
use crate::mimeheader::{MimeContentTransferEncoding, MimeContentTypeHeader};
use crate::rfc5322::Rfc5322Builder;
use crate::EmailBuilder;

/// The subtype of the `text/*` body part.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BodyKind {
    Plain,
    Html,
}

impl Default for BodyKind {
    fn default() -> Self {
        BodyKind::Plain
    }
}

impl BodyKind {
    pub fn subtype(self) -> &'static str {
        match self {
            BodyKind::Plain => "plain",
            BodyKind::Html => "html",
        }
    }
}

impl FromStr for BodyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(BodyKind::Plain),
            "html" => Ok(BodyKind::Html),
            _ => Err(Error::InvalidMimeType(format!("text/{}", s))),
        }
    }
}

/// The declared character set of the body.
///
/// `us-ascii` bodies are sent as 7bit text. Every other charset is resolved
/// through its WHATWG label, the body is transcoded into it, and the bytes
/// are sent as base64.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Charset {
    UsAscii,
    Encoding(&'static Encoding),
}

impl Default for Charset {
    fn default() -> Self {
        Charset::UsAscii
    }
}

impl Charset {
    fn transfer_encoding(self) -> MimeContentTransferEncoding {
        match self {
            Charset::UsAscii => MimeContentTransferEncoding::SevenBit,
            Charset::Encoding(_) => MimeContentTransferEncoding::Base64,
        }
    }

    /// Transcode `text` into this charset.
    ///
    /// Fails if any character has no representation in the charset.
    pub fn encode<'a>(self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        match self {
            Charset::UsAscii if text.is_ascii() => Ok(Cow::Borrowed(text.as_bytes())),
            Charset::UsAscii => Err(Error::NonAsciiBody),
            Charset::Encoding(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    return Err(Error::UnencodableBody(self.to_string()));
                }
                Ok(bytes)
            }
        }
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        if label.eq_ignore_ascii_case("us-ascii") || label.eq_ignore_ascii_case("ascii") {
            return Ok(Charset::UsAscii);
        }
        // Labels encoding_rs cannot write, like utf-16, declare utf-8.
        Encoding::for_label(label.as_bytes())
            .map(|encoding| Charset::Encoding(encoding.output_encoding()))
            .ok_or_else(|| Error::UnknownCharset(s.to_string()))
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Charset::UsAscii => f.write_str("us-ascii"),
            Charset::Encoding(encoding) => f.write_str(&encoding.name().to_ascii_lowercase()),
        }
    }
}

/// A composed email, ready to be serialized or handed to
/// [`EmailClient::send`](crate::EmailClient::send).
///
/// Apart from appending attachments an `Email` does not change after it is
/// built. The multipart boundary is fixed at build time, so serializing the
/// same `Email` twice gives the same text.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Email {
    pub(crate) from: String,
    pub(crate) to: AddressList,
    pub(crate) cc: AddressList,
    pub(crate) subject: String,
    pub(crate) body: String,
    pub(crate) body_kind: BodyKind,
    pub(crate) charset: Charset,
    pub(crate) attachments: Vec<Attachment>,
    pub(crate) boundary: String,
}

impl Email {
    /// Creates a new email builder
    pub fn builder() -> EmailBuilder {
        EmailBuilder::new()
    }

    /// A plain-text, us-ascii email without cc or attachments.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<AddressList>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Email> {
        EmailBuilder::new()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body)
            .build()
    }

    /// Append an `application/octet-stream` attachment.
    pub fn add_attachment(&mut self, data: impl Into<Vec<u8>>, file_name: impl Into<String>) {
        self.attach(Attachment::new(data.into(), file_name));
    }

    /// Append an attachment of type `maintype/subtype`.
    pub fn add_attachment_with_type(
        &mut self,
        data: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
        maintype: &str,
        subtype: &str,
    ) -> Result<()> {
        let attachment = Attachment::with_type(data.into(), file_name, maintype, subtype)?;
        self.attach(attachment);
        Ok(())
    }

    /// Append the contents of the file at `path`, typed by its extension and
    /// named after its final path segment.
    pub fn add_attachment_from_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let attachment = Attachment::from_path(path)?;
        self.attach(attachment);
        Ok(())
    }

    /// Append an already built attachment.
    pub fn attach(&mut self, attachment: Attachment) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            file_name = attachment.file_name(),
            size = attachment.data().len(),
            "attachment added"
        );
        self.attachments.push(attachment);
    }

    /// The `From` header value.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// The `To` header value.
    pub fn to(&self) -> String {
        self.to.to_header_value()
    }

    /// The `Cc` header value, empty when there is none.
    pub fn cc(&self) -> String {
        self.cc.to_header_value()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn body_kind(&self) -> BodyKind {
        self.body_kind
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The bare sender address taken from the `From` header.
    pub fn sender(&self) -> &str {
        parse_email_addr(&self.from)
    }

    /// The bare recipient addresses from `To` then `Cc`.
    pub fn recipients(&self) -> Vec<String> {
        let mut recipients = split_addresses(&self.to());
        recipients.extend(split_addresses(&self.cc()));
        recipients
    }

    fn subject_header_value(&self) -> String {
        if self.subject.is_ascii() {
            self.subject.clone()
        } else {
            encoded_words::encode(
                &self.subject,
                None,
                encoded_words::EncodingFlag::Shortest,
                None,
            )
        }
    }

    fn body_part(&self) -> MimePart {
        let mut headers = HeaderMap::new();
        headers.insert(Header::new_with_value(
            "Content-Type",
            MimeContentTypeHeader::new("text", self.body_kind.subtype())
                .param("charset", self.charset.to_string()),
        ));
        headers.insert(Header::new("MIME-Version", "1.0"));
        headers.insert(Header::new_with_value(
            "Content-Transfer-Encoding",
            self.charset.transfer_encoding(),
        ));

        let mut body = Rfc5322Builder::new();
        match self.charset {
            Charset::UsAscii => body.emit_text(&self.body),
            // `EmailBuilder::build` has already checked the body encodes cleanly.
            Charset::Encoding(encoding) => body.emit_base64(&encoding.encode(&self.body).0),
        }
        MimePart::new(headers, body.into_result())
    }

    /// Assemble the full MIME tree: the body part, then every attachment in
    /// the order it was added.
    pub fn to_mime(&self) -> MimePart {
        let mut root = MimePart::new_multipart(self.boundary.clone());
        root.headers
            .insert(Header::new("Subject", self.subject_header_value()));
        root.headers
            .insert(Header::new("From", encode_address_header(&self.from)));
        root.headers
            .insert(Header::new("To", encode_address_header(&self.to())));
        if !self.cc.is_empty() {
            root.headers
                .insert(Header::new("Cc", encode_address_header(&self.cc())));
        }

        root.push(self.body_part());
        for attachment in self.attachments.iter() {
            root.push(attachment.to_part());
        }
        root
    }

    /// Render the transport-ready text of this email.
    pub fn as_string(&self) -> String {
        self.to_mime().as_string()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}
