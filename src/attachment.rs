use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::header::{Header, HeaderMap};
use crate::message::MimePart;
use crate::mimeheader::{
    MimeContentDisposition, MimeContentTransferEncoding, MimeContentType, MimeContentTypeHeader,
};
use crate::rfc5322::Rfc5322Builder;

/// A binary attachment with its display name and MIME type.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Attachment {
    data: Vec<u8>,
    file_name: String,
    content_type: MimeContentType,
}

impl Attachment {
    /// An `application/octet-stream` attachment.
    pub fn new(data: Vec<u8>, file_name: impl Into<String>) -> Attachment {
        Attachment {
            data,
            file_name: file_name.into(),
            content_type: ("application".to_string(), "octet-stream".to_string()),
        }
    }

    /// An attachment of type `maintype/subtype`.
    ///
    /// Fails if the pair does not parse as a MIME type.
    pub fn with_type(
        data: Vec<u8>,
        file_name: impl Into<String>,
        maintype: &str,
        subtype: &str,
    ) -> Result<Attachment> {
        let essence = format!("{}/{}", maintype, subtype);
        if maintype.trim().is_empty() || subtype.trim().is_empty() {
            return Err(Error::InvalidMimeType(essence));
        }
        let parsed: mime::Mime = essence
            .parse()
            .map_err(|_| Error::InvalidMimeType(essence.clone()))?;
        // Parameters belong in our own header rendering, not in the type.
        if parsed.params().next().is_some() {
            return Err(Error::InvalidMimeType(essence));
        }

        Ok(Attachment {
            data,
            file_name: file_name.into(),
            content_type: (
                parsed.type_().as_str().to_string(),
                parsed.subtype().as_str().to_string(),
            ),
        })
    }

    /// Read `path` fully and guess its type from the extension.
    ///
    /// Unknown extensions fall back to `application/octet-stream`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Attachment> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::MissingFileName(path.display().to_string()))?;

        let guess = mime_guess::from_path(path).first_or_octet_stream();

        let data = fs::read(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;

        Attachment::with_type(
            data,
            file_name,
            guess.type_().as_str(),
            guess.subtype().as_str(),
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn maintype(&self) -> &str {
        &self.content_type.0
    }

    pub fn subtype(&self) -> &str {
        &self.content_type.1
    }

    pub(crate) fn to_part(&self) -> MimePart {
        let (ref major, ref minor) = self.content_type;
        let mut headers = HeaderMap::new();
        headers.insert(Header::new_with_value(
            "Content-Type",
            MimeContentTypeHeader::new(major.as_str(), minor.as_str()),
        ));
        headers.insert(Header::new("MIME-Version", "1.0"));
        headers.insert(Header::new_with_value(
            "Content-Transfer-Encoding",
            MimeContentTransferEncoding::Base64,
        ));
        headers.insert(Header::new_with_value(
            "Content-Disposition",
            MimeContentDisposition {
                filename: self.file_name.clone(),
            },
        ));

        let mut body = Rfc5322Builder::new();
        body.emit_base64(&self.data);
        MimePart::new(headers, body.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_type() {
        let attachment = Attachment::new(b"Test bytes".to_vec(), "test_file.csv");
        assert_eq!(attachment.maintype(), "application");
        assert_eq!(attachment.subtype(), "octet-stream");
        assert_eq!(attachment.file_name(), "test_file.csv");
    }

    #[test]
    fn test_invalid_type() {
        struct TypeTest<'s> {
            maintype: &'s str,
            subtype: &'s str,
            valid: bool,
        }

        let tests = vec![
            TypeTest {
                maintype: "image",
                subtype: "png",
                valid: true,
            },
            TypeTest {
                maintype: "application",
                subtype: "vnd.ms-excel",
                valid: true,
            },
            TypeTest {
                maintype: "",
                subtype: "png",
                valid: false,
            },
            TypeTest {
                maintype: "image",
                subtype: "",
                valid: false,
            },
            TypeTest {
                maintype: "text",
                subtype: "plain; charset=utf-8",
                valid: false,
            },
        ];

        for test in tests.into_iter() {
            let result = Attachment::with_type(vec![], "f", test.maintype, test.subtype);
            assert_eq!(result.is_ok(), test.valid, "{}/{}", test.maintype, test.subtype);
        }
    }

    #[test]
    fn test_from_path_guesses_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"a,b\n1,2\n").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.maintype(), "text");
        assert_eq!(attachment.subtype(), "csv");
        assert_eq!(attachment.file_name(), "report.csv");
        assert_eq!(attachment.data(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_from_path_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.zzqx");
        fs::write(&path, [0u8, 1, 2]).unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.maintype(), "application");
        assert_eq!(attachment.subtype(), "octet-stream");
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Attachment::from_path(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_from_path_without_file_name() {
        let err = Attachment::from_path("/").unwrap_err();
        assert!(matches!(err, Error::MissingFileName(_)));
    }

    #[test]
    fn test_part_headers() {
        let part = Attachment::new(b"Test bytes".to_vec(), "test_file.csv").to_part();
        assert_eq!(
            part.as_string(),
            "Content-Type: application/octet-stream\r\n\
             MIME-Version: 1.0\r\n\
             Content-Transfer-Encoding: base64\r\n\
             Content-Disposition: attachment; filename=\"test_file.csv\"\r\n\
             \r\n\
             VGVzdCBieXRlcw==\r\n"
        );
    }
}
