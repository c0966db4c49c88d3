use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::page_selection::{PageRequest, PageSelection};
use crate::paths::ensure_distinct;
use crate::pdf::PdfDocument;

/// Remove the requested pages from `source` and write the result to `output`.
///
/// Requested numbers outside the document are ignored. Fails with
/// [`Error::NoValidPages`] without writing anything if none are left.
#[instrument(skip_all, fields(source = %source.as_ref().display()))]
pub fn remove_pages<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    output: Q,
    request: &PageRequest,
) -> Result<PathBuf> {
    let doc = PdfDocument::open(&source)?;
    remove_from(doc, output.as_ref(), request).map(|removal| removal.output)
}

/// What [`remove_from`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub output: PathBuf,
    /// Removed pages as 1-based numbers of the source document, ascending
    pub removed: Vec<u32>,
    pub remaining: u32,
}

/// Same as [`remove_pages`], for a document that is already open.
pub fn remove_from(mut doc: PdfDocument, output: &Path, request: &PageRequest) -> Result<Removal> {
    ensure_distinct(doc.path(), output)?;

    let page_count = doc.page_count();
    let selection = PageSelection::normalize(request, page_count).ok_or_else(|| {
        Error::NoValidPages {
            path: doc.path().to_path_buf(),
            page_count,
        }
    })?;

    delete_selection(&mut doc, &selection);
    doc.save(output)?;

    let removal = Removal {
        output: output.to_path_buf(),
        removed: selection.page_numbers(),
        remaining: selection.remaining(),
    };
    info!(
        removed = ?removal.removed,
        remaining = removal.remaining,
        output = %output.display(),
        "pages removed"
    );
    Ok(removal)
}

/// Delete every selected page, highest index first.
pub fn delete_selection(doc: &mut PdfDocument, selection: &PageSelection) {
    for index in selection.descending() {
        doc.delete_page(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{load_labels, page_labels, sample_pdf, write_pdf};

    #[test]
    fn removes_duplicates_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "five.pdf", sample_pdf(5));
        let output = dir.path().join("five_modified.pdf");

        let request = PageRequest::from_numbers([2, 2, 5]);
        let written = remove_pages(&source, &output, &request).unwrap();

        assert_eq!(written, output);
        assert_eq!(load_labels(&output), vec!["Page 1", "Page 3", "Page 4"]);
        // Source untouched
        assert_eq!(load_labels(&source).len(), 5);
    }

    #[test]
    fn removal_reports_pages_and_remaining() {
        let doc = PdfDocument::from_document(sample_pdf(5), "five.pdf");
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");

        let removal = remove_from(doc, &output, &PageRequest::from_numbers([4, 2, 9])).unwrap();
        assert_eq!(removal.output, output);
        assert_eq!(removal.removed, vec![2, 4]);
        assert_eq!(removal.remaining, 3);
        assert_eq!(load_labels(&output).len(), 3);
    }

    #[test]
    fn only_invalid_pages_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "five.pdf", sample_pdf(5));
        let output = dir.path().join("out.pdf");

        let request = PageRequest::from_numbers([0, 99]);
        let err = remove_pages(&source, &output, &request).unwrap_err();

        assert!(matches!(err, Error::NoValidPages { page_count: 5, .. }));
        assert!(!output.exists());
        assert_eq!(load_labels(&source).len(), 5);
    }

    #[test]
    fn mixed_valid_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "five.pdf", sample_pdf(5));
        let output = dir.path().join("out.pdf");

        let request = PageRequest::parse("0, 1, 6, -2, 5").unwrap();
        remove_pages(&source, &output, &request).unwrap();
        assert_eq!(load_labels(&output), vec!["Page 2", "Page 3", "Page 4"]);
    }

    #[test]
    fn refuses_in_place_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "five.pdf", sample_pdf(5));

        let request = PageRequest::from_numbers([1]);
        let err = remove_pages(&source, &source, &request).unwrap_err();
        assert!(matches!(err, Error::OutputIsSource { .. }));
        assert_eq!(load_labels(&source).len(), 5);
    }

    #[test]
    fn removed_pages_match_valid_intersection() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "six.pdf", sample_pdf(6));

        let requests: &[&[i64]] = &[&[1], &[6, 6], &[3, 1, 9, 0], &[2, 3, 4, 5]];
        for (i, numbers) in requests.iter().enumerate() {
            let output = dir.path().join(format!("out{}.pdf", i));
            remove_pages(&source, &output, &PageRequest::from_numbers(numbers.iter().copied()))
                .unwrap();

            let expected: Vec<String> = (1..=6i64)
                .filter(|n| !numbers.contains(n))
                .map(|n| format!("Page {}", n))
                .collect();
            assert_eq!(load_labels(&output), expected, "request {numbers:?}");
        }
    }

    #[test]
    fn descending_matches_snapshot_deletion() {
        let request = PageRequest::from_numbers([2, 4]);

        // One page at a time, highest index first
        let mut descending = PdfDocument::from_document(sample_pdf(5), "a.pdf");
        let selection = PageSelection::normalize(&request, 5).unwrap();
        delete_selection(&mut descending, &selection);

        // Ascending over page numbers resolved once, before any deletion
        let mut snapshot = sample_pdf(5);
        snapshot.delete_pages(&[2, 4]);

        assert_eq!(page_labels(descending.document()), page_labels(&snapshot));
        assert_eq!(
            page_labels(descending.document()),
            vec!["Page 1", "Page 3", "Page 5"]
        );
    }

    #[test]
    fn ascending_without_adjustment_shifts_pages() {
        // The bug descending order avoids: deleting index 1 first moves the
        // original index 3 down to 2.
        let mut naive = PdfDocument::from_document(sample_pdf(5), "a.pdf");
        naive.delete_page(1);
        naive.delete_page(3);
        assert_eq!(
            page_labels(naive.document()),
            vec!["Page 1", "Page 3", "Page 4"]
        );
    }
}
