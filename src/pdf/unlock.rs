use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::Result;
use crate::paths::ensure_distinct;
use crate::pdf::PdfDocument;

/// Decrypt `source` with `password` and save a plaintext copy to `output`.
///
/// A wrong password or unreadable file fails with
/// [`Error::UnlockFailed`](crate::error::Error::UnlockFailed) and writes nothing.
#[instrument(skip_all, fields(source = %source.as_ref().display()))]
pub fn unlock<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    output: Q,
    password: &str,
) -> Result<PathBuf> {
    let output = output.as_ref();
    ensure_distinct(source.as_ref(), output)?;

    let mut doc = PdfDocument::open_with_password(&source, password)?;
    doc.strip_encryption();
    doc.save(output)?;

    info!(output = %output.display(), "document unlocked");
    Ok(output.to_path_buf())
}
