use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::page_selection::PageRequest;
use crate::paths::{ensure_distinct, in_directory, with_suffix};
use crate::pdf::remove::remove_from;
use crate::pdf::unlock::unlock;
use crate::pdf::{OpenAttempt, PdfDocument};

/// Where page-removal results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Same file name, inside this directory
    Directory(PathBuf),
    /// Next to the source, with this suffix appended to the file stem
    Suffix(String),
}

impl Destination {
    pub fn output_for(&self, source: &Path) -> PathBuf {
        match self {
            Destination::Directory(dir) => in_directory(source, dir),
            Destination::Suffix(suffix) => with_suffix(source, suffix, "pdf"),
        }
    }
}

/// Per-document input the caller supplies while a batch runs.
///
/// Returning `None` means the user declined, and the document is skipped.
pub trait BatchInputs {
    /// Free-text page list for `source`.
    fn pages(&mut self, source: &Path) -> Option<String>;

    /// Password for `source`, asked only once it is known to be protected.
    fn password(&mut self, source: &Path) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoPagesGiven,
    NoPassword,
}

#[derive(Debug)]
pub enum Outcome {
    Written(PathBuf),
    Skipped(SkipReason),
    Failed(Error),
}

impl From<Result<PathBuf>> for Outcome {
    fn from(result: Result<PathBuf>) -> Self {
        match result {
            Ok(path) => Outcome::Written(path),
            Err(err) => Outcome::Failed(err),
        }
    }
}

#[derive(Debug)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Written(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}

/// Removes pages from a set of documents, one at a time.
#[derive(Debug, Clone)]
pub struct PageRemovalBatch {
    pub destination: Destination,
    /// File name prefix of temporary decrypted copies
    pub unlocked_prefix: String,
}

impl PageRemovalBatch {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            unlocked_prefix: "unlocked_".to_string(),
        }
    }

    /// Process every source in order. A failing document never stops the
    /// ones after it.
    pub fn run<I: BatchInputs>(&self, sources: &[PathBuf], inputs: &mut I) -> BatchReport {
        let mut report = BatchReport::default();
        for source in sources {
            let outcome = self.process(source, inputs);
            match &outcome {
                Outcome::Written(path) => info!(source = %source.display(), output = %path.display(), "done"),
                Outcome::Skipped(reason) => warn!(source = %source.display(), ?reason, "skipped"),
                Outcome::Failed(err) => warn!(source = %source.display(), error = %err, "failed"),
            }
            report.documents.push(DocumentReport {
                source: source.clone(),
                outcome,
            });
        }
        report
    }

    #[instrument(skip_all, fields(source = %source.display()))]
    fn process<I: BatchInputs>(&self, source: &Path, inputs: &mut I) -> Outcome {
        let text = match inputs.pages(source) {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Outcome::Skipped(SkipReason::NoPagesGiven),
        };
        let request = match PageRequest::parse(&text) {
            Ok(request) => request,
            Err(err) => return Outcome::Failed(err),
        };

        let output = self.destination.output_for(source);
        if let Err(err) = ensure_distinct(source, &output) {
            return Outcome::Failed(err);
        }

        match PdfDocument::try_open(source) {
            OpenAttempt::Unprotected(doc) => remove_from(doc, &output, &request)
                .map(|removal| removal.output)
                .into(),
            OpenAttempt::PasswordRequired => match inputs.password(source) {
                Some(password) if !password.is_empty() => self
                    .remove_protected(source, &output, &password, &request)
                    .into(),
                _ => Outcome::Skipped(SkipReason::NoPassword),
            },
            OpenAttempt::Failed(err) => Outcome::Failed(err),
        }
    }

    /// Unlock into a temporary copy next to `output`, remove pages from it,
    /// and delete the copy whatever happened.
    fn remove_protected(
        &self,
        source: &Path,
        output: &Path,
        password: &str,
        request: &PageRequest,
    ) -> Result<PathBuf> {
        let dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let prefix = format!("{}{}", self.unlocked_prefix, stem);
        let temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".pdf")
            .tempfile_in(dir)?;

        let result = unlock(source, temp.path(), password)
            .and_then(PdfDocument::open)
            .and_then(|doc| remove_from(doc, output, request))
            .map(|removal| removal.output);

        let temp_path = temp.path().to_path_buf();
        if let Err(err) = temp.close() {
            warn!(path = %temp_path.display(), error = %err, "failed to delete decrypted copy");
        }
        result
    }
}

/// Expand directories into the PDF files below them, sorted by path.
/// Other paths pass through unchanged.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("pdf"))
}
