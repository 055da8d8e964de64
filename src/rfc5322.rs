//! Module with helpers for writing RFC 5322 messages.

use crate::header::Header;

/// Lines are folded once they reach this many characters.
pub const MIME_LINE_LENGTH: usize = 78;

/// Base64 bodies are wrapped at this width, per RFC 2045 Section 6.8.
pub const BASE64_LINE_LENGTH: usize = 76;

/// Accumulates the text of a message, one emitted piece at a time.
#[derive(Debug, Default)]
pub struct Rfc5322Builder {
    result: String,
}

impl Rfc5322Builder {
    pub fn new() -> Rfc5322Builder {
        Rfc5322Builder::default()
    }

    pub fn into_result(self) -> String {
        self.result
    }

    pub fn emit_raw(&mut self, s: &str) {
        self.result.push_str(s);
    }

    /// Emit a header line, folded, followed by CRLF.
    pub fn emit_header(&mut self, header: &Header) {
        self.emit_folded(&header.to_string());
        self.emit_raw("\r\n");
    }

    /// Emit `data` base64 encoded, one CRLF-terminated line per 76 characters.
    pub fn emit_base64(&mut self, data: &[u8]) {
        let encoded = base64::encode(data);
        // base64 output is ascii, so byte offsets are char boundaries
        let mut start = 0;
        while start < encoded.len() {
            let end = usize::min(start + BASE64_LINE_LENGTH, encoded.len());
            self.emit_raw(&encoded[start..end]);
            self.emit_raw("\r\n");
            start = end;
        }
    }

    /// Emit `s` with every line ending normalized to CRLF.
    pub fn emit_text(&mut self, s: &str) {
        for line in s.lines() {
            self.emit_raw(line);
            self.emit_raw("\r\n");
        }
    }

    /// Emit `s`, breaking at spaces to keep lines within `MIME_LINE_LENGTH`.
    ///
    /// Each break replaces one space with CRLF and a tab. Breaks only come
    /// before a word, so a continuation line is never just whitespace; a
    /// word or run of spaces longer than the limit is left whole.
    pub fn emit_folded(&mut self, s: &str) {
        let mut words = s.split(' ');
        let mut line_len = match words.next() {
            Some(first) => {
                self.emit_raw(first);
                first.len()
            }
            None => return,
        };

        for word in words {
            if !word.is_empty() && line_len + 1 + word.len() > MIME_LINE_LENGTH {
                self.emit_raw("\r\n\t");
                line_len = 0;
            } else {
                self.emit_raw(" ");
            }
            line_len += 1 + word.len();
            self.emit_raw(word);
        }
    }
}
