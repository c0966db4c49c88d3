use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::Result;
use crate::paths::ensure_distinct;
use crate::pdf::PdfDocument;

/// Re-save `source` with unused objects pruned and every stream
/// Flate-compressed.
///
/// Protected documents need `password`, and are written out decrypted.
/// The result is written even when it ends up larger than the input.
#[instrument(skip_all, fields(source = %source.as_ref().display()))]
pub fn compress_pdf<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    output: Q,
    password: Option<&str>,
) -> Result<PathBuf> {
    let output = output.as_ref();
    ensure_distinct(source.as_ref(), output)?;

    let mut doc = match password {
        Some(password) => {
            let mut doc = PdfDocument::open_with_password(&source, password)?;
            doc.strip_encryption();
            doc
        }
        None => PdfDocument::open(&source)?,
    };

    let removed = doc.compress();
    doc.save(output)?;

    let before = std::fs::metadata(source.as_ref()).map(|m| m.len()).ok();
    let after = std::fs::metadata(output).map(|m| m.len()).ok();
    info!(removed, ?before, ?after, output = %output.display(), "PDF compressed");

    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pdf::testing::{encrypted_pdf, load_labels, sample_pdf, write_pdf};

    #[test]
    fn keeps_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "doc.pdf", sample_pdf(4));
        let output = dir.path().join("doc_compressed.pdf");

        compress_pdf(&source, &output, None).unwrap();
        assert_eq!(load_labels(&output), load_labels(&source));
    }

    #[test]
    fn protected_without_password_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "locked.pdf", encrypted_pdf(2, "secret"));
        let output = dir.path().join("out.pdf");

        let err = compress_pdf(&source, &output, None).unwrap_err();
        assert!(err.is_password_required());
        assert!(!output.exists());
    }

    #[test]
    fn protected_with_password_is_decrypted() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "locked.pdf", encrypted_pdf(2, "secret"));
        let output = dir.path().join("out.pdf");

        compress_pdf(&source, &output, Some("secret")).unwrap();
        assert_eq!(load_labels(&output), vec!["Page 1", "Page 2"]);
    }

    #[test]
    fn wrong_password_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "locked.pdf", encrypted_pdf(2, "secret"));
        let output = dir.path().join("out.pdf");

        let err = compress_pdf(&source, &output, Some("nope")).unwrap_err();
        assert!(matches!(err, Error::UnlockFailed { .. }));
        assert!(!output.exists());
    }
}
