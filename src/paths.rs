use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// `<dir>/<stem><suffix>.<extension>`, next to the source file.
pub fn with_suffix(source: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    source.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

/// `<dir>/<prefix><file name>`
pub fn with_prefix(source: &Path, prefix: &str) -> PathBuf {
    let name = source
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("output.pdf");
    source.with_file_name(format!("{}{}", prefix, name))
}

/// The source's file name placed inside `dir`.
pub fn in_directory(source: &Path, dir: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) => dir.join(name),
        None => dir.join("output.pdf"),
    }
}

/// Fail with [`Error::OutputIsSource`] if writing `output` would clobber `source`.
pub fn ensure_distinct(source: &Path, output: &Path) -> Result<()> {
    if source == output {
        return Err(Error::OutputIsSource {
            path: source.to_path_buf(),
        });
    }
    // Only an existing output can alias the source through links or `..`
    if let (Ok(a), Ok(b)) = (source.canonicalize(), output.canonicalize()) {
        if a == b {
            return Err(Error::OutputIsSource {
                path: source.to_path_buf(),
            });
        }
    }
    Ok(())
}
