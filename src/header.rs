use std::fmt;
use std::slice;

/// Anything that can be written as the value of a header field.
pub trait ToHeader {
    fn to_header(&self) -> String;
}

impl ToHeader for String {
    fn to_header(&self) -> String {
        self.clone()
    }
}

impl<'a> ToHeader for &'a str {
    fn to_header(&self) -> String {
        (*self).to_string()
    }
}

/// A single `Name: value` field.
///
/// The value is stored unfolded; folding happens when the part is written.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Header {
    pub name: String,
    value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Header {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Builds a header from a typed value, e.g. a `MimeContentTypeHeader`.
    pub fn new_with_value<T: ToHeader>(name: impl Into<String>, value: T) -> Header {
        Header::new(name, value.to_header())
    }

    pub fn get_value(&self) -> &str {
        &self.value
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}: {}", self.name, self.value)
    }
}

/// Header fields of one MIME part, in the order they are written.
///
/// Lookups ignore ASCII case. A part carries a handful of fields, so
/// lookups scan the list.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct HeaderMap {
    fields: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> HeaderMap {
        HeaderMap::default()
    }

    /// Appends `header`, keeping earlier fields with the same name.
    pub fn insert(&mut self, header: Header) {
        self.fields.push(header);
    }

    /// Sets `header` in place of every field with the same name. The first
    /// such field's position is kept; an unseen name goes last.
    pub fn replace(&mut self, header: Header) {
        match self.fields.iter().position(|h| h.is_named(&header.name)) {
            Some(pos) => {
                let rest = self.fields.split_off(pos + 1);
                self.fields
                    .extend(rest.into_iter().filter(|h| !h.is_named(&header.name)));
                self.fields[pos] = header;
            }
            None => self.fields.push(header),
        }
    }

    pub fn iter(&self) -> slice::Iter<'_, Header> {
        self.fields.iter()
    }

    /// The most recently inserted field called `name`.
    pub fn get(&self, name: &str) -> Option<&Header> {
        self.fields.iter().rev().find(|h| h.is_named(name))
    }

    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.get(name).map(Header::get_value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = &'a Header;
    type IntoIter = slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
