//! Client-side file-type allow-list.
//!
//! Admission accepts a file when either its extension or its declared MIME
//! type matches the allow-list. The server does not enforce this; the queue
//! does, so every rendition of the client behaves identically.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Extension → canonical MIME type for every accepted format.
static MIME_BY_EXTENSION: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("pdf", "application/pdf"),
        ("doc", "application/msword"),
        (
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        ("txt", "text/plain"),
        ("rtf", "application/rtf"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("webp", "image/webp"),
    ])
});

/// Lowercased extension of a filename, if any.
fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Canonical MIME type for an accepted file, or `None` if the file is not
/// on the allow-list.
///
/// The extension wins when recognized; otherwise a declared MIME type that
/// matches one of the accepted formats is honored (browsers and shells
/// disagree about extensions more often than about MIME sniffing).
pub fn accepted_mime(filename: &str, declared_mime: Option<&str>) -> Option<&'static str> {
    if let Some(ext) = extension(filename) {
        if let Some(mime) = MIME_BY_EXTENSION.get(ext.as_str()) {
            return Some(mime);
        }
    }
    let declared = declared_mime?.split(';').next()?.trim().to_ascii_lowercase();
    MIME_BY_EXTENSION
        .values()
        .find(|mime| **mime == declared)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions() {
        assert_eq!(accepted_mime("cv.pdf", None), Some("application/pdf"));
        assert_eq!(accepted_mime("cv.PDF", None), Some("application/pdf"));
        assert_eq!(accepted_mime("photo.jpeg", None), Some("image/jpeg"));
        assert_eq!(accepted_mime("notes.txt", None), Some("text/plain"));
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert_eq!(accepted_mime("malware.exe", None), None);
        assert_eq!(accepted_mime("archive.zip", None), None);
        assert_eq!(accepted_mime("noextension", None), None);
        assert_eq!(accepted_mime("trailingdot.", None), None);
    }

    #[test]
    fn falls_back_to_declared_mime() {
        assert_eq!(
            accepted_mime("resume", Some("application/pdf")),
            Some("application/pdf")
        );
        assert_eq!(
            accepted_mime("resume", Some("application/pdf; charset=binary")),
            Some("application/pdf")
        );
        assert_eq!(accepted_mime("resume", Some("application/zip")), None);
    }

    #[test]
    fn extension_wins_over_declared_mime() {
        assert_eq!(
            accepted_mime("cv.docx", Some("application/octet-stream")),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
    }
}
