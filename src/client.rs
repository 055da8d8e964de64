//! Sending an [`Email`] over SMTP.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use lazy_static::lazy_static;
use lettre::transport::smtp::authentication::{Credentials, DEFAULT_MECHANISMS};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::{Data, Mail, Rcpt};
use lettre::transport::smtp::extension::{
    ClientId, MailBodyParameter, MailParameter, RcptParameter,
};
use lettre::transport::smtp::Error as SmtpError;
use lettre::Address;
use regex::Regex;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::address::parse_email_addr;
use crate::email::Email;
use crate::error::{Error, Result};

/// Timeout applied to connecting and to every read and write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

lazy_static! {
    static ref ESMTP_KEYWORD: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$").unwrap();
}

/// How the connection is secured before authenticating.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
pub enum Security {
    /// Connect in plaintext, then upgrade with STARTTLS. Fails if the server
    /// does not offer it.
    StartTls,
    /// TLS from the first byte, usually on port 465.
    Tls,
    /// No encryption at all. Only meant for local relays and tests.
    None,
}

impl Default for Security {
    fn default() -> Self {
        Security::StartTls
    }
}

/// Connection settings for an [`EmailClient`].
#[derive(PartialEq, Eq, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
pub struct ClientConfig {
    pub login: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    #[cfg_attr(feature = "serde", serde(default))]
    pub security: Security,
    #[cfg_attr(feature = "serde", serde(default = "default_timeout_secs"))]
    pub timeout_secs: u64,
}

#[cfg(feature = "serde")]
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("login", &self.login)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// A recipient the server would not accept.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Refusal {
    /// The SMTP reply code, e.g. `550`
    pub code: u16,
    /// The text the server sent with the code
    pub message: String,
}

/// Refused recipients, keyed by address. Recipients not in the map were
/// accepted.
pub type Refusals = BTreeMap<String, Refusal>;

/// Per-send overrides.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct SendOptions {
    /// Envelope sender, instead of the `From` header
    pub from_addr: Option<String>,
    /// Envelope recipients, instead of the `To` and `Cc` headers
    pub to_addrs: Option<Vec<String>>,
    /// ESMTP parameters for `MAIL FROM`, e.g. `BODY=8BITMIME`
    pub mail_options: Vec<String>,
    /// ESMTP parameters for every `RCPT TO`, e.g. `NOTIFY=FAILURE`
    pub rcpt_options: Vec<String>,
}

impl SendOptions {
    pub fn new() -> Self {
        SendOptions::default()
    }

    pub fn from_addr(mut self, from_addr: impl Into<String>) -> Self {
        self.from_addr = Some(from_addr.into());
        self
    }

    pub fn to_addrs<S: Into<String>>(mut self, to_addrs: impl IntoIterator<Item = S>) -> Self {
        self.to_addrs = Some(to_addrs.into_iter().map(Into::into).collect());
        self
    }

    pub fn mail_option(mut self, option: impl Into<String>) -> Self {
        self.mail_options.push(option.into());
        self
    }

    pub fn rcpt_option(mut self, option: impl Into<String>) -> Self {
        self.rcpt_options.push(option.into());
        self
    }
}

/// Split `KEYWORD` or `KEYWORD=value`, checking the keyword's syntax.
fn split_option(option: &str) -> Result<(String, Option<String>)> {
    let option = option.trim();
    let (keyword, value) = match option.split_once('=') {
        Some((keyword, value)) if !value.is_empty() => (keyword, Some(value.to_string())),
        Some(_) => return Err(Error::InvalidOption(option.to_string())),
        None => (option, None),
    };
    if !ESMTP_KEYWORD.is_match(keyword) {
        return Err(Error::InvalidOption(option.to_string()));
    }
    Ok((keyword.to_string(), value))
}

fn parse_mail_option(option: &str) -> Result<MailParameter> {
    let (keyword, value) = split_option(option)?;
    let upper = keyword.to_ascii_uppercase();
    let known = match (upper.as_str(), value.as_deref()) {
        ("SMTPUTF8", None) => Some(MailParameter::SmtpUtfEight),
        ("BODY", Some(body)) if body.eq_ignore_ascii_case("8BITMIME") => {
            Some(MailParameter::Body(MailBodyParameter::EightBitMime))
        }
        ("BODY", Some(body)) if body.eq_ignore_ascii_case("7BIT") => {
            Some(MailParameter::Body(MailBodyParameter::SevenBit))
        }
        ("SIZE", Some(size)) => Some(MailParameter::Size(
            size.parse()
                .map_err(|_| Error::InvalidOption(option.to_string()))?,
        )),
        _ => None,
    };
    Ok(known.unwrap_or(MailParameter::Other { keyword, value }))
}

fn parse_rcpt_option(option: &str) -> Result<RcptParameter> {
    let (keyword, value) = split_option(option)?;
    Ok(RcptParameter::Other { keyword, value })
}

fn to_address(address: &str) -> Result<Address> {
    address.parse().map_err(|source| Error::InvalidAddress {
        address: address.to_string(),
        source,
    })
}

/// The envelope of one transaction.
#[derive(Debug)]
struct Envelope {
    reverse_path: Option<Address>,
    forward_paths: Vec<(String, Address)>,
}

impl Envelope {
    /// Resolve sender and recipients from the overrides, falling back to the
    /// message headers.
    fn resolve(email: &Email, options: &SendOptions) -> Result<Envelope> {
        let sender = match options.from_addr {
            Some(ref from) => parse_email_addr(from),
            None => email.sender(),
        };
        let recipients = match options.to_addrs {
            Some(ref addrs) => addrs
                .iter()
                .map(|addr| parse_email_addr(addr).to_string())
                .filter(|addr| !addr.is_empty())
                .collect(),
            None => email.recipients(),
        };
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }

        let reverse_path = if sender.is_empty() {
            None
        } else {
            Some(to_address(sender)?)
        };
        let forward_paths = recipients
            .into_iter()
            .map(|recipient| to_address(&recipient).map(|address| (recipient, address)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Envelope {
            reverse_path,
            forward_paths,
        })
    }
}

/// An open connection, closed when dropped whatever happened on it.
struct Session {
    conn: SmtpConnection,
}

impl Session {
    fn transaction(
        &mut self,
        envelope: Envelope,
        mail_parameters: Vec<MailParameter>,
        rcpt_parameters: Vec<RcptParameter>,
        message: &[u8],
    ) -> Result<Refusals> {
        self.conn
            .command(Mail::new(envelope.reverse_path, mail_parameters))?;

        let mut refusals = Refusals::new();
        let mut accepted = 0;
        for (recipient, address) in envelope.forward_paths {
            match self
                .conn
                .command(Rcpt::new(address, rcpt_parameters.clone()))
            {
                Ok(_) => accepted += 1,
                Err(err) => {
                    let code = match err.status() {
                        Some(code) => u16::from(code),
                        None => return Err(err.into()),
                    };
                    let message = err.source().map(|s| s.to_string()).unwrap_or_default();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%recipient, code, %message, "recipient refused");
                    refusals.insert(recipient, Refusal { code, message });
                }
            }
        }
        if accepted == 0 {
            return Err(Error::RecipientsRefused(refusals));
        }

        self.conn.command(Data)?;
        self.conn.message(message)?;
        Ok(refusals)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Sends QUIT unless already sent, then shuts the socket down.
        self.conn.abort();
        #[cfg(feature = "tracing")]
        tracing::debug!("connection closed");
    }
}

/// Holds SMTP credentials and sends emails, one connection per send.
///
/// ```no_run
/// use simple_email::{Email, EmailClient};
///
/// # fn main() -> Result<(), simple_email::Error> {
/// let client = EmailClient::new("me@example.com", "secret", "smtp.example.com", 587);
/// let email = Email::new(client.login(), "you@example.com", "Hello", "Hi there.")?;
/// let refused = client.send(&email)?;
/// assert!(refused.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EmailClient {
    login: String,
    password: String,
    host: String,
    port: u16,
    security: Security,
    timeout: Option<Duration>,
}

impl EmailClient {
    /// A client that upgrades with STARTTLS and authenticates as `login`.
    ///
    /// Nothing is sent until [`send`](EmailClient::send) is called.
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> EmailClient {
        EmailClient {
            login: login.into(),
            password: password.into(),
            host: host.into(),
            port,
            security: Security::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn from_config(config: ClientConfig) -> EmailClient {
        EmailClient::new(config.login, config.password, config.host, config.port)
            .with_security(config.security)
            .with_timeout(Some(Duration::from_secs(config.timeout_secs)))
    }

    pub fn with_security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn security(&self) -> Security {
        self.security
    }

    /// Send `email` to the recipients in its `To` and `Cc` headers.
    pub fn send(&self, email: &Email) -> Result<Refusals> {
        self.send_with(email, &SendOptions::default())
    }

    /// Send `email` in a single transaction on a fresh connection.
    ///
    /// Returns the recipients the server refused; an empty map means every
    /// recipient was accepted. If all of them are refused nothing is sent
    /// and [`Error::RecipientsRefused`] is returned instead.
    pub fn send_with(&self, email: &Email, options: &SendOptions) -> Result<Refusals> {
        let envelope = Envelope::resolve(email, options)?;
        let mail_parameters = options
            .mail_options
            .iter()
            .map(|option| parse_mail_option(option))
            .collect::<Result<Vec<_>>>()?;
        let rcpt_parameters = options
            .rcpt_options
            .iter()
            .map(|option| parse_rcpt_option(option))
            .collect::<Result<Vec<_>>>()?;
        let message = email.as_string();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            host = %self.host,
            port = self.port,
            recipients = envelope.forward_paths.len(),
            "sending email"
        );

        let mut session = self.connect()?;
        let credentials = Credentials::new(self.login.clone(), self.password.clone());
        session
            .conn
            .auth(DEFAULT_MECHANISMS, &credentials)
            .map_err(Error::Authentication)?;

        session.transaction(
            envelope,
            mail_parameters,
            rcpt_parameters,
            message.as_bytes(),
        )
    }

    fn connect(&self) -> Result<Session> {
        let connection_error = |source: SmtpError| Error::Connection {
            host: self.host.clone(),
            port: self.port,
            source,
        };
        let hello_name = ClientId::default();
        let server = (self.host.as_str(), self.port);

        let conn = match self.security {
            Security::Tls => {
                let tls = TlsParameters::new(self.host.clone()).map_err(connection_error)?;
                SmtpConnection::connect(server, self.timeout, &hello_name, Some(&tls), None)
            }
            Security::StartTls | Security::None => {
                SmtpConnection::connect(server, self.timeout, &hello_name, None, None)
            }
        }
        .map_err(connection_error)?;
        let mut session = Session { conn };

        if self.security == Security::StartTls {
            let tls = TlsParameters::new(self.host.clone()).map_err(connection_error)?;
            session
                .conn
                .starttls(&tls, &hello_name)
                .map_err(connection_error)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(host = %self.host, port = self.port, "connected");
        Ok(session)
    }
}

impl fmt::Debug for EmailClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EmailClient")
            .field("login", &self.login)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::builder()
            .from("Jane Doe <jane@example.com>")
            .to("a@x.com, b@y.com")
            .cc("")
            .subject("s")
            .body("b")
            .build()
            .unwrap()
    }

    fn recipients(envelope: &Envelope) -> Vec<&str> {
        envelope
            .forward_paths
            .iter()
            .map(|(recipient, _)| recipient.as_str())
            .collect()
    }

    #[test]
    fn test_resolve_from_headers() {
        let envelope = Envelope::resolve(&email(), &SendOptions::new()).unwrap();
        assert_eq!(recipients(&envelope), vec!["a@x.com", "b@y.com"]);
        assert_eq!(
            envelope.reverse_path.map(|a| a.to_string()),
            Some("jane@example.com".to_string())
        );
    }

    #[test]
    fn test_resolve_overrides() {
        let options = SendOptions::new()
            .from_addr("bounce@example.com")
            .to_addrs(vec!["Other <other@z.com>", ""]);
        let envelope = Envelope::resolve(&email(), &options).unwrap();
        assert_eq!(recipients(&envelope), vec!["other@z.com"]);
        assert_eq!(
            envelope.reverse_path.map(|a| a.to_string()),
            Some("bounce@example.com".to_string())
        );
    }

    #[test]
    fn test_resolve_null_sender() {
        let options = SendOptions::new().from_addr("");
        let envelope = Envelope::resolve(&email(), &options).unwrap();
        assert!(envelope.reverse_path.is_none());
    }

    #[test]
    fn test_resolve_errors() {
        let options = SendOptions::new().to_addrs(Vec::<String>::new());
        assert!(matches!(
            Envelope::resolve(&email(), &options),
            Err(Error::NoRecipients)
        ));

        let options = SendOptions::new().to_addrs(vec!["not an address"]);
        match Envelope::resolve(&email(), &options) {
            Err(Error::InvalidAddress { address, .. }) => assert_eq!(address, "not an address"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mail_options() {
        struct OptionTest<'s> {
            input: &'s str,
            expected: MailParameter,
        }

        let tests = vec![
            OptionTest {
                input: "SMTPUTF8",
                expected: MailParameter::SmtpUtfEight,
            },
            OptionTest {
                input: "body=8bitmime",
                expected: MailParameter::Body(MailBodyParameter::EightBitMime),
            },
            OptionTest {
                input: "BODY=7BIT",
                expected: MailParameter::Body(MailBodyParameter::SevenBit),
            },
            OptionTest {
                input: "SIZE=1024",
                expected: MailParameter::Size(1024),
            },
            OptionTest {
                input: "RET=HDRS",
                expected: MailParameter::Other {
                    keyword: "RET".to_string(),
                    value: Some("HDRS".to_string()),
                },
            },
            OptionTest {
                input: "X-FLAG",
                expected: MailParameter::Other {
                    keyword: "X-FLAG".to_string(),
                    value: None,
                },
            },
        ];

        for test in tests.into_iter() {
            assert_eq!(parse_mail_option(test.input).unwrap(), test.expected);
        }
    }

    #[test]
    fn test_invalid_options() {
        for option in &["", "=x", "BAD KEY", "SIZE=big", "NOTIFY=", "-X"] {
            assert!(
                matches!(parse_mail_option(option), Err(Error::InvalidOption(_))),
                "{:?} should be rejected",
                option
            );
        }
        assert_eq!(
            parse_rcpt_option("NOTIFY=SUCCESS,FAILURE").unwrap(),
            RcptParameter::Other {
                keyword: "NOTIFY".to_string(),
                value: Some("SUCCESS,FAILURE".to_string()),
            }
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let client = EmailClient::new("me@example.com", "hunter2", "smtp.example.com", 587);
        let debug = format!("{:?}", client);
        assert!(debug.contains("smtp.example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_from_config() {
        let client = EmailClient::from_config(ClientConfig {
            login: "me@example.com".to_string(),
            password: "secret".to_string(),
            host: "smtp.office365.com".to_string(),
            port: 587,
            security: Security::default(),
            timeout_secs: 5,
        });
        assert_eq!(client.login(), "me@example.com");
        assert_eq!(client.host(), "smtp.office365.com");
        assert_eq!(client.port(), 587);
        assert_eq!(client.security(), Security::StartTls);
        assert_eq!(client.timeout, Some(Duration::from_secs(5)));
    }
}
