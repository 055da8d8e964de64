use crate::address::AddressList;
use crate::attachment::Attachment;
use crate::email::{BodyKind, Charset, Email};
use crate::error::{Error, Result};
use crate::message::MimePart;

/// Builds an [`Email`].
///
/// `from`, `to`, `subject` and `body` are required; the body defaults to
/// `text/plain` in `us-ascii`, and `cc` to nothing.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct EmailBuilder {
    from: Option<String>,
    to: Option<AddressList>,
    cc: AddressList,
    subject: Option<String>,
    body: Option<String>,
    body_kind: BodyKind,
    charset: Option<String>,
    boundary: Option<String>,
    attachments: Vec<Attachment>,
}

impl EmailBuilder {
    pub fn new() -> Self {
        EmailBuilder::default()
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// One address string, or a sequence joined in order.
    pub fn to(mut self, to: impl Into<AddressList>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn cc(mut self, cc: impl Into<AddressList>) -> Self {
        self.cc = cc.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn body_kind(mut self, kind: BodyKind) -> Self {
        self.body_kind = kind;
        self
    }

    /// The body charset name, checked when the email is built.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Use a fixed multipart boundary instead of a random one.
    ///
    /// It must be 1 to 70 RFC 2046 boundary characters, not end in a space,
    /// and not appear as `--boundary` in a 7bit body; `build` checks this.
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn build(self) -> Result<Email> {
        let from = self.from.ok_or(Error::MissingField("from"))?;
        let to = self
            .to
            .filter(|to| !to.is_empty())
            .ok_or(Error::MissingField("to"))?;
        let subject = self.subject.ok_or(Error::MissingField("subject"))?;
        let body = self.body.ok_or(Error::MissingField("body"))?;

        check_header("From", &from)?;
        check_header("To", &to.to_header_value())?;
        check_header("Cc", &self.cc.to_header_value())?;
        check_header("Subject", &subject)?;

        let charset = match self.charset {
            Some(ref name) => name.parse()?,
            None => Charset::default(),
        };
        charset.encode(&body)?;

        // Only a 7bit body can contain a delimiter line; base64 never does.
        let clashes = |boundary: &str| {
            charset == Charset::UsAscii && body.contains(&format!("--{}", boundary))
        };
        let boundary = match self.boundary {
            Some(boundary) => {
                if !is_valid_boundary(&boundary) || clashes(&boundary) {
                    return Err(Error::InvalidBoundary(boundary));
                }
                boundary
            }
            None => loop {
                let boundary = MimePart::random_boundary();
                if !clashes(&boundary) {
                    break boundary;
                }
            },
        };

        Ok(Email {
            from,
            to,
            cc: self.cc,
            subject,
            body,
            body_kind: self.body_kind,
            charset,
            attachments: self.attachments,
            boundary,
        })
    }
}

/// Header values are written on one logical line, so they may not carry
/// their own line breaks.
fn check_header(name: &'static str, value: &str) -> Result<()> {
    if value.contains(|c: char| c == '\r' || c == '\n') {
        return Err(Error::InvalidHeader {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// RFC 2046 section 5.1.1 `boundary`.
fn is_valid_boundary(boundary: &str) -> bool {
    const SPECIALS: &str = "'()+_,-./:=? ";
    (1..=70).contains(&boundary.len())
        && !boundary.ends_with(' ')
        && boundary
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
}
