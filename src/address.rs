use std::fmt;

/// Reduce a header-style address to the bare mailbox.
///
/// `"Jane Doe <jane@example.com>"` becomes `"jane@example.com"`. Input
/// without an opening angle bracket is returned trimmed.
pub fn parse_email_addr(email: &str) -> &str {
    match email.split_once('<') {
        Some((_, rest)) => rest.split('>').next().unwrap_or(rest).trim(),
        None => email.trim(),
    }
}

/// Split a comma-separated header value into bare addresses, dropping empty
/// entries.
pub fn split_addresses(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_email_addr(entry).to_string())
        .filter(|addr| !addr.is_empty())
        .collect()
}

/// Make an address header value 7-bit clean.
///
/// Each comma-separated entry with a non-ascii display name, like
/// `Jürgen <j@x.com>`, has the name written as an RFC 2047 encoded word.
/// The `<addr>` part and ascii entries are kept as given.
pub fn encode_address_header(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }
    value
        .split(',')
        .map(|entry| encode_mailbox(entry.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn encode_mailbox(entry: &str) -> String {
    let (name, addr) = match entry.find('<') {
        Some(pos) => entry.split_at(pos),
        None => return entry.to_string(),
    };
    let name = name.trim();
    if name.is_ascii() {
        return entry.to_string();
    }
    let name = name
        .strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name);
    let encoded = encoded_words::encode(name, None, encoded_words::EncodingFlag::Shortest, None);
    format!("{} {}", encoded, addr.trim())
}

/// The addresses of a `To` or `Cc` line, in the order they were given.
///
/// Built from a single string (used as-is) or from a sequence of strings
/// (joined with `", "`).
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct AddressList(Vec<String>);

impl AddressList {
    pub fn new() -> Self {
        AddressList::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|addr| addr.trim().is_empty())
    }

    /// The header value for this list.
    pub fn to_header_value(&self) -> String {
        self.0.join(", ")
    }
}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

impl<'a> From<&'a str> for AddressList {
    fn from(addr: &'a str) -> Self {
        AddressList(vec![addr.to_string()])
    }
}

impl From<String> for AddressList {
    fn from(addr: String) -> Self {
        AddressList(vec![addr])
    }
}

impl<S: Into<String>> From<Vec<S>> for AddressList {
    fn from(addrs: Vec<S>) -> Self {
        AddressList(addrs.into_iter().map(Into::into).collect())
    }
}

impl<'a, S: AsRef<str>> From<&'a [S]> for AddressList {
    fn from(addrs: &'a [S]) -> Self {
        AddressList(addrs.iter().map(|a| a.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for AddressList {
    fn from(addrs: [S; N]) -> Self {
        AddressList(addrs.iter().map(|a| a.as_ref().to_string()).collect())
    }
}
