//! Compose email messages and send them over SMTP.
//!
//! ```no_run
//! use simple_email::{Email, EmailClient};
//!
//! # fn main() -> Result<(), simple_email::Error> {
//! // Credentials come from the caller, never from this crate.
//! let client = EmailClient::new("me@example.com", "secret", "smtp.office365.com", 587);
//!
//! let mut msg = Email::builder()
//!     .from(client.login())
//!     .to("an_email_address@domain.com")
//!     .cc("another_email_address@domain.com")
//!     .subject("Sample Subject Line")
//!     .body("Here's the body of the e-mail.")
//!     .build()?;
//!
//! msg.add_attachment(b"Test bytes".to_vec(), "test_file.csv");
//! msg.add_attachment_from_path("/some/path/file.ext")?;
//!
//! let refused = client.send(&msg)?;
//! for (recipient, refusal) in refused {
//!     println!("{} refused: {} {}", recipient, refusal.code, refusal.message);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces
)]

mod address;
mod attachment;
mod client;
mod email;
mod email_builder;
mod error;
mod header;
mod message;
mod mimeheader;
mod rfc5322;

pub use self::address::*;
pub use self::attachment::Attachment;
pub use self::client::*;
pub use self::email::*;
pub use self::email_builder::*;
pub use self::error::{Error, Result};
pub use self::header::*;
pub use self::message::MimePart;
pub use self::mimeheader::*;
