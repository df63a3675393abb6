//! Concurrent attachment reads and media-type detection.

use crate::{FilesError, FilesResult, PLACEHOLDER_FILENAME, PLACEHOLDER_PAYLOAD};
use invrec_types::{MimeType, NonEmptyText};
use std::path::{Path, PathBuf};

/// One uploaded file, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Trimmed and never blank.
    filename: String,
    mime_type: MimeType,
    bytes: Vec<u8>,
    placeholder: bool,
}

impl Attachment {
    /// Creates an attachment from a caller-supplied `(filename, mimeType, bytes)` tuple.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidFilename`] for a blank filename and
    /// [`FilesError::InvalidMimeType`] for a malformed media type.
    pub fn new(filename: &str, mime_type: &str, bytes: Vec<u8>) -> FilesResult<Self> {
        let filename = checked_filename(filename)?;
        let mime_type = MimeType::parse(mime_type)?;
        Ok(Self {
            filename,
            mime_type,
            bytes,
            placeholder: false,
        })
    }

    /// Creates an attachment, sniffing the media type from the bytes and filename.
    pub fn detected(filename: &str, bytes: Vec<u8>) -> FilesResult<Self> {
        let filename = checked_filename(filename)?;
        let mime_type = detect_mime_type(&bytes, &filename);
        Ok(Self {
            filename,
            mime_type,
            bytes,
            placeholder: false,
        })
    }

    /// The fixed attachment synthesised when the caller supplied none.
    pub fn placeholder() -> Self {
        Self {
            filename: PLACEHOLDER_FILENAME.to_owned(),
            mime_type: MimeType::pdf(),
            bytes: PLACEHOLDER_PAYLOAD.to_vec(),
            placeholder: true,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type.as_str()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether this is the synthesised placeholder rather than a caller file.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Where an attachment's bytes come from.
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    /// A file on disk, with an optional caller-declared media type.
    Path {
        path: PathBuf,
        mime_type: Option<String>,
    },
    /// Bytes the caller already holds.
    Memory(Attachment),
}

impl AttachmentSource {
    /// A file on disk whose media type will be detected.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path {
            path: path.into(),
            mime_type: None,
        }
    }

    async fn acquire(self) -> FilesResult<Attachment> {
        match self {
            AttachmentSource::Memory(attachment) => Ok(attachment),
            AttachmentSource::Path { path, mime_type } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| FilesError::Read {
                        path: path.clone(),
                        source,
                    })?;
                let filename = filename_of(&path)?;
                tracing::debug!(
                    filename = %filename,
                    size = bytes.len(),
                    "read attachment"
                );
                match mime_type {
                    Some(mime) => Attachment::new(&filename, &mime, bytes),
                    None => Attachment::detected(&filename, bytes),
                }
            }
        }
    }
}

fn checked_filename(filename: &str) -> FilesResult<String> {
    NonEmptyText::new(filename)
        .map(NonEmptyText::into_inner)
        .map_err(|_| FilesError::InvalidFilename(filename.to_owned()))
}

fn filename_of(path: &Path) -> FilesResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| FilesError::InvalidFilename(path.display().to_string()))
}

/// Reads every source concurrently and returns the attachments in source order.
///
/// All reads are awaited before any result is inspected, so no read is left in flight when
/// this returns.
///
/// # Errors
///
/// Returns the first failure in source order if any read fails.
pub async fn acquire_all(sources: Vec<AttachmentSource>) -> FilesResult<Vec<Attachment>> {
    let handles: Vec<_> = sources
        .into_iter()
        .map(|source| tokio::spawn(source.acquire()))
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await);
    }

    let mut attachments = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let attachment = outcome.map_err(|e| FilesError::Task(e.to_string()))??;
        attachments.push(attachment);
    }

    tracing::debug!(count = attachments.len(), "acquired attachments");
    Ok(attachments)
}

/// Best-effort media type for a payload.
///
/// Content sniffing wins over the filename extension; unknown content falls back to
/// `application/octet-stream`.
pub fn detect_mime_type(bytes: &[u8], filename: &str) -> MimeType {
    if let Some(mime) = infer::get(bytes).and_then(|kind| MimeType::parse(kind.mime_type()).ok()) {
        return mime;
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let by_extension = match extension.as_deref() {
        Some("txt") => Some("text/plain"),
        Some("csv") => Some("text/csv"),
        Some("json") => Some("application/json"),
        Some("xml") => Some("application/xml"),
        Some("html" | "htm") => Some("text/html"),
        Some("pdf") => Some("application/pdf"),
        _ => None,
    };

    by_extension
        .and_then(|m| MimeType::parse(m).ok())
        .unwrap_or_else(MimeType::octet_stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_blank_filename() {
        let result = Attachment::new("  ", "application/pdf", vec![1, 2, 3]);
        assert!(matches!(result, Err(FilesError::InvalidFilename(_))));
    }

    #[test]
    fn test_new_rejects_bad_mime_type() {
        let result = Attachment::new("scan.pdf", "pdf", vec![1, 2, 3]);
        assert!(matches!(result, Err(FilesError::InvalidMimeType(_))));
    }

    #[test]
    fn test_placeholder_is_fixed() {
        let placeholder = Attachment::placeholder();

        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.filename(), PLACEHOLDER_FILENAME);
        assert_eq!(placeholder.mime_type(), MimeType::PDF);
        assert!(placeholder.bytes().starts_with(b"%PDF-"));
    }

    #[test]
    fn test_detect_png_by_magic_bytes() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime_type(&png_header, "scan.bin").as_str(), "image/png");
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(detect_mime_type(b"a,b,c\n", "items.CSV").as_str(), "text/csv");
    }

    #[test]
    fn test_detect_falls_back_to_octet_stream() {
        assert_eq!(
            detect_mime_type(b"\x00\x01", "blob").as_str(),
            MimeType::OCTET_STREAM
        );
    }

    #[tokio::test]
    async fn test_acquire_all_preserves_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.txt");
        let second = temp.path().join("second.txt");
        fs::write(&first, b"first").unwrap();
        fs::write(&second, b"second").unwrap();

        let attachments = acquire_all(vec![
            AttachmentSource::path(&first),
            AttachmentSource::Memory(
                Attachment::new("inline.json", "application/json", b"{}".to_vec()).unwrap(),
            ),
            AttachmentSource::path(&second),
        ])
        .await
        .unwrap();

        let names: Vec<_> = attachments.iter().map(Attachment::filename).collect();
        assert_eq!(names, vec!["first.txt", "inline.json", "second.txt"]);
        assert_eq!(attachments[0].bytes(), b"first");
        assert_eq!(attachments[0].mime_type(), "text/plain");
    }

    #[tokio::test]
    async fn test_acquire_all_honours_declared_mime_type() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.dat");
        fs::write(&path, b"opaque").unwrap();

        let attachments = acquire_all(vec![AttachmentSource::Path {
            path,
            mime_type: Some("application/vnd.invoice+json".into()),
        }])
        .await
        .unwrap();

        assert_eq!(attachments[0].mime_type(), "application/vnd.invoice+json");
    }

    #[tokio::test]
    async fn test_acquire_all_fails_if_any_read_fails() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present.txt");
        fs::write(&present, b"here").unwrap();
        let missing = temp.path().join("missing.txt");

        let err = acquire_all(vec![
            AttachmentSource::path(&present),
            AttachmentSource::path(&missing),
        ])
        .await
        .expect_err("missing file should fail the acquisition");

        match err {
            FilesError::Read { path, .. } => assert_eq!(path, missing),
            other => panic!("expected Read error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_acquire_all_empty() {
        let attachments = acquire_all(Vec::new()).await.unwrap();
        assert!(attachments.is_empty());
    }
}
