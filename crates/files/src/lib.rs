//! Attachment acquisition.
//!
//! This crate turns caller-selected files into in-memory [`Attachment`]s ready to be embedded
//! in an invoice bundle.
//!
//! ## Acquisition model
//!
//! - Each selected file is read on its own task, so reads proceed concurrently.
//! - [`acquire_all`] waits for *every* read to finish before returning. A bundle is never
//!   assembled from a partial attachment set.
//! - Any single failed read fails the whole acquisition with the first error in selection
//!   order.
//! - The media type is taken from the caller when given, otherwise sniffed from the content
//!   (magic bytes), then from the file extension, then `application/octet-stream`.
//!
//! ## Example Usage
//!
//! ```no_run
//! use invrec_files::{acquire_all, AttachmentSource};
//!
//! # async fn run() -> Result<(), invrec_files::FilesError> {
//! let attachments = acquire_all(vec![
//!     AttachmentSource::path("scans/receipt.pdf"),
//!     AttachmentSource::path("scans/prescription.jpg"),
//! ])
//! .await?;
//! assert_eq!(attachments.len(), 2);
//! # Ok(())
//! # }
//! ```

mod acquire;
mod constants;

pub use acquire::{acquire_all, detect_mime_type, Attachment, AttachmentSource};
pub use constants::{PLACEHOLDER_FILENAME, PLACEHOLDER_PAYLOAD};

use std::path::PathBuf;

/// Errors that can occur while acquiring attachments
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The file could not be opened or read
    #[error("failed to read attachment {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The filename is empty or could not be derived from the path
    #[error("invalid attachment filename: {0}")]
    InvalidFilename(String),

    /// The caller supplied a malformed media type
    #[error("invalid attachment media type: {0}")]
    InvalidMimeType(#[from] invrec_types::TextError),

    /// The read task panicked or was cancelled
    #[error("attachment read task failed: {0}")]
    Task(String),
}

/// Result type for attachment acquisition.
pub type FilesResult<T> = Result<T, FilesError>;
