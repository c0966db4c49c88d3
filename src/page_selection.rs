use std::collections::BTreeSet;

use tracing::warn;

use crate::error::{Error, Result};

/// One comma-separated token of a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    Single(PageRef),
    Range(PageRef, PageRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRef {
    Number(i64),
    End,
}

impl PageRef {
    fn resolve(self, total_pages: u32) -> i64 {
        match self {
            PageRef::Number(n) => n,
            PageRef::End => i64::from(total_pages),
        }
    }
}

impl PageToken {
    /// Parse a token like "5", "-3", "2-4", "9-6" or "7-end"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(invalid(s));
        }

        // A leading dash is a negative number, not a range
        let first_len = s.chars().next().map_or(0, char::len_utf8);
        match s[first_len..].find('-') {
            Some(pos) => {
                let dash_pos = pos + first_len;
                let start = parse_page_ref(&s[..dash_pos])?;
                let end = parse_page_ref(&s[dash_pos + 1..])?;
                Ok(PageToken::Range(start, end))
            }
            None => Ok(PageToken::Single(parse_page_ref(s)?)),
        }
    }

    /// Expand this token into the page numbers it names, unvalidated
    fn expand(&self, total_pages: u32) -> Vec<i64> {
        match *self {
            PageToken::Single(page) => vec![page.resolve(total_pages)],
            PageToken::Range(start, end) => {
                let (start, end) = (start.resolve(total_pages), end.resolve(total_pages));
                let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                // Clamp so a typo like "1-999999999" stays cheap; values outside
                // the document are discarded by normalization anyway.
                let lo = lo.max(0);
                let hi = hi.min(i64::from(total_pages) + 1);
                (lo..=hi).collect()
            }
        }
    }
}

fn parse_page_ref(s: &str) -> Result<PageRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(PageRef::End)
    } else {
        s.parse::<i64>().map(PageRef::Number).map_err(|_| invalid(s))
    }
}

fn invalid(token: &str) -> Error {
    Error::InvalidPageInput {
        token: token.to_string(),
    }
}

/// A parsed page request: what the user typed, before it has been checked
/// against any document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    tokens: Vec<PageToken>,
}

impl PageRequest {
    /// Parse a comma-separated list like "2, 5, 7-9, end"
    pub fn parse(s: &str) -> Result<Self> {
        let tokens = s
            .split(',')
            .map(PageToken::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(PageRequest { tokens })
    }

    /// Build a request from plain 1-based page numbers
    #[cfg(test)]
    pub fn from_numbers<I: IntoIterator<Item = i64>>(numbers: I) -> Self {
        PageRequest {
            tokens: numbers
                .into_iter()
                .map(|n| PageToken::Single(PageRef::Number(n)))
                .collect(),
        }
    }

    /// Every requested 1-based page number, in request order, duplicates kept
    pub fn numbers(&self, total_pages: u32) -> Vec<i64> {
        self.tokens
            .iter()
            .flat_map(|t| t.expand(total_pages))
            .collect()
    }
}

/// The set of zero-based page indices to remove from one document.
///
/// Built once per document from a [`PageRequest`]: numbers outside
/// `[1, page_count]` are dropped and duplicates collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    indices: BTreeSet<u32>,
    page_count: u32,
}

impl PageSelection {
    /// Normalize `request` against a document of `page_count` pages.
    ///
    /// Returns `None` when nothing valid is left.
    pub fn normalize(request: &PageRequest, page_count: u32) -> Option<Self> {
        let mut indices = BTreeSet::new();
        let mut dropped = Vec::new();

        for n in request.numbers(page_count) {
            if n >= 1 && n <= i64::from(page_count) {
                indices.insert((n - 1) as u32);
            } else {
                dropped.push(n);
            }
        }

        if !dropped.is_empty() {
            dropped.sort_unstable();
            dropped.dedup();
            warn!(?dropped, page_count, "ignoring page numbers outside the document");
        }

        if indices.is_empty() {
            None
        } else {
            Some(PageSelection {
                indices,
                page_count,
            })
        }
    }

    /// Zero-based indices, highest first. Deleting in this order keeps the
    /// indices of pages not yet deleted stable.
    pub fn descending(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().rev().copied()
    }

    /// Removed pages as 1-based numbers, ascending
    pub fn page_numbers(&self) -> Vec<u32> {
        self.indices.iter().map(|i| i + 1).collect()
    }

    /// Pages left once the selection is removed
    pub fn remaining(&self) -> u32 {
        self.page_count - self.indices.len() as u32
    }
}
