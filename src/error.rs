//! Error and result type for building and sending emails.

use std::io;

use lettre::address::AddressError;
use lettre::transport::smtp;

use crate::client::Refusals;

/// The errors that may occur while building or sending an email.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field was never set on the builder.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// A header value contains a line break.
    #[error("header `{name}` contains a line break")]
    InvalidHeader { name: &'static str, value: String },
    /// The body charset label is not recognized.
    #[error("unknown charset `{0}`")]
    UnknownCharset(String),
    /// The body contains non-ascii text but was declared `us-ascii`.
    #[error("body contains non-ascii characters but the charset is us-ascii")]
    NonAsciiBody,
    /// The body contains characters the declared charset cannot represent.
    #[error("body cannot be encoded as {0}")]
    UnencodableBody(String),
    /// A fixed multipart boundary is malformed or occurs in the body.
    #[error("invalid multipart boundary `{0}`")]
    InvalidBoundary(String),
    /// The maintype/subtype pair does not form a valid MIME type.
    #[error("invalid mime type `{0}`")]
    InvalidMimeType(String),
    /// The attachment path has no final file name segment.
    #[error("path `{0}` has no file name")]
    MissingFileName(String),
    /// Reading an attachment from disk failed.
    #[error("could not read `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// An envelope address could not be handed to the transport.
    #[error("invalid address `{address}`")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },
    /// An ESMTP option string is malformed.
    #[error("invalid ESMTP option `{0}`")]
    InvalidOption(String),
    /// Neither the options nor the message headers name any recipient.
    #[error("no recipients")]
    NoRecipients,
    /// The server could not be reached or the secure upgrade failed.
    #[error("connection to {host}:{port} failed")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: smtp::Error,
    },
    /// The server rejected the login.
    #[error("authentication failed")]
    Authentication(#[source] smtp::Error),
    /// The SMTP transaction failed after authenticating.
    #[error("smtp error")]
    Smtp(#[from] smtp::Error),
    /// The server refused every recipient, so nothing was sent.
    #[error("all {} recipients were refused", .0.len())]
    RecipientsRefused(Refusals),
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
