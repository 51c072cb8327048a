//! Page specification parsing
//!
//! Two dialects coexist:
//!
//! - **Lenient** (`parse`, `parse_selection`): used by split, delete and
//!   extract. Malformed tokens are skipped, ranges are clamped into the
//!   document, single pages outside the document are dropped. The result is
//!   ascending and deduplicated; an empty result means "no pages specified".
//! - **Strict** (`parse_order`): used by reorder. The caller's order is
//!   authoritative, so nothing is clamped or deduplicated and any violation is
//!   an error.

use std::collections::BTreeSet;

use crate::error::{PdfCutterError, Result};
use crate::validation::check_order;

/// Which pages an operation should act on (all indices 1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSpecification {
    AllPages,
    Range { start: i64, end: i64 },
    ExplicitSet { pages: BTreeSet<i64> },
    ExplicitOrder { pages: Vec<i64> },
}

impl PageSpecification {
    /// Build the specification for the split form (`all`, `range`, `specific`).
    ///
    /// Missing range bounds default to the first and last page.
    pub fn from_split_form(
        split_type: &str,
        start_page: Option<&str>,
        end_page: Option<&str>,
        specific_pages: Option<&str>,
        total_pages: u32,
    ) -> Result<Self> {
        match split_type.trim() {
            "" | "all" => Ok(PageSpecification::AllPages),
            "range" => {
                let start = parse_bound(start_page, "start_page")?.unwrap_or(1);
                let end = parse_bound(end_page, "end_page")?.unwrap_or(i64::from(total_pages));
                Ok(PageSpecification::Range { start, end })
            }
            "specific" => Ok(PageSpecification::ExplicitSet {
                pages: parse_tokens(specific_pages.unwrap_or(""), total_pages)
                    .into_iter()
                    .map(i64::from)
                    .collect(),
            }),
            other => Err(PdfCutterError::InvalidSpecification(format!(
                "Unknown split type '{}'. Must be 'all', 'range', or 'specific'",
                other
            ))),
        }
    }

    /// An unordered selection of already-parsed pages
    pub fn from_pages(pages: &[u32]) -> Self {
        PageSpecification::ExplicitSet {
            pages: pages.iter().map(|&page| i64::from(page)).collect(),
        }
    }

    /// Resolve into concrete page numbers for a document of `total_pages`.
    ///
    /// `AllPages`, `Range` and `ExplicitSet` resolve leniently and ascending;
    /// `ExplicitOrder` is checked strictly and keeps its order.
    pub fn resolve(&self, total_pages: u32) -> Result<Vec<u32>> {
        match self {
            PageSpecification::AllPages => Ok((1..=total_pages).collect()),
            PageSpecification::Range { start, end } => Ok(clamp_range(*start, *end, total_pages)),
            PageSpecification::ExplicitSet { pages } => Ok(pages
                .iter()
                .filter_map(|&page| in_document(page, total_pages))
                .collect()),
            PageSpecification::ExplicitOrder { pages } => check_order(pages, total_pages),
        }
    }
}

/// Parse a range string like "1-3, 5, 8-10" into sorted unique page numbers.
///
/// Best effort: returns whatever tokens resolve inside the document.
pub fn parse(spec_text: &str, total_pages: u32) -> Vec<u32> {
    parse_tokens(spec_text, total_pages).into_iter().collect()
}

/// Parse a selection for delete/extract.
///
/// Accepts either the range grammar of [`parse`] or a JSON array of page
/// numbers, as posted by the browser page grid. JSON values are treated like
/// single-page tokens.
pub fn parse_selection(input: &str, total_pages: u32) -> Vec<u32> {
    let trimmed = input.trim();
    if !trimmed.starts_with('[') {
        return parse(trimmed, total_pages);
    }

    match serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
        Ok(values) => values
            .iter()
            .filter_map(json_page_number)
            .filter_map(|page| in_document(page, total_pages))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Parse the JSON array sent for reorder and validate it against the document.
pub fn parse_order(spec_json: &str, total_pages: u32) -> Result<Vec<u32>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(spec_json.trim()).map_err(|e| {
        PdfCutterError::InvalidSpecification(format!(
            "Page order must be a JSON array of page numbers: {}",
            e
        ))
    })?;

    let mut order = Vec::with_capacity(values.len());
    for value in &values {
        let page = json_page_number(value).ok_or_else(|| {
            PdfCutterError::InvalidSpecification(format!(
                "Page order contains a non-integer value: {}",
                value
            ))
        })?;
        order.push(page);
    }

    check_order(&order, total_pages)
}

fn parse_tokens(spec_text: &str, total_pages: u32) -> BTreeSet<u32> {
    let mut pages = BTreeSet::new();
    if total_pages == 0 {
        return pages;
    }

    for part in spec_text.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            // Range like "1-3"; a negative number lands here too and is skipped
            if let (Ok(start), Ok(end)) = (start.trim().parse::<i64>(), end.trim().parse::<i64>()) {
                pages.extend(clamp_range(start, end, total_pages));
            }
        } else if let Ok(page) = part.parse::<i64>() {
            pages.extend(in_document(page, total_pages));
        }
    }

    pages
}

/// `start` is clamped into the document, then `end` into `[start, total]`
fn clamp_range(start: i64, end: i64, total_pages: u32) -> Vec<u32> {
    if total_pages == 0 {
        return Vec::new();
    }
    let total = i64::from(total_pages);
    let start = start.min(total).max(1);
    let end = end.min(total).max(start);
    // Both bounds now lie in [1, total_pages]
    (start as u32..=end as u32).collect()
}

fn in_document(page: i64, total_pages: u32) -> Option<u32> {
    if page >= 1 && page <= i64::from(total_pages) {
        Some(page as u32)
    } else {
        None
    }
}

fn json_page_number(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_bound(raw: Option<&str>, field: &str) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<i64>().map(Some).map_err(|_| {
            PdfCutterError::InvalidSpecification(format!(
                "{} must be a whole number, got '{}'",
                field, text
            ))
        }),
    }
}
