use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by the document operations.
///
/// Every failure of a single document maps to one of these; batch processing
/// reports it and moves on to the next document.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no valid pages to remove from {path} (document has {page_count} pages)")]
    NoValidPages { path: PathBuf, page_count: u32 },

    #[error("invalid page input {token:?}: expected numbers separated by commas")]
    InvalidPageInput { token: String },

    #[error("{path} is password-protected")]
    PasswordRequired { path: PathBuf },

    #[error("failed to unlock {path}: {source}")]
    UnlockFailed {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("PDF operation on {path} failed: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("image operation on {path} failed: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to run {program}: {source}")]
    EncoderSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Encoder { program: String, status: ExitStatus },

    #[error("refusing to overwrite source file {path}")]
    OutputIsSource { path: PathBuf },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn pdf(path: impl Into<PathBuf>, source: lopdf::Error) -> Self {
        Error::Pdf {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the document needs a password we do not have.
    pub fn is_password_required(&self) -> bool {
        matches!(self, Error::PasswordRequired { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
