//! Page selection validation
//!
//! Every check returns the first failure as a typed [`PdfCutterError`]; the
//! operations chain them with `?` so nothing is written before all pass.

use std::collections::BTreeSet;

use crate::error::{PdfCutterError, Result};
use crate::limits::Limits;

#[derive(Debug, Clone, Copy)]
pub struct PageSelectionValidator {
    limits: Limits,
}

impl PageSelectionValidator {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Per-document page ceiling; runs before any page specification is parsed
    pub fn check_page_count(&self, total_pages: u32) -> Result<()> {
        if total_pages > self.limits.max_pages_per_pdf {
            return Err(PdfCutterError::LimitExceeded(format!(
                "Document has {} pages; the maximum is {}",
                total_pages, self.limits.max_pages_per_pdf
            )));
        }
        Ok(())
    }

    /// Merge accepts between two and `max_files_per_request` inputs
    pub fn check_file_count(&self, count: usize) -> Result<()> {
        if count < 2 {
            return Err(PdfCutterError::LimitExceeded(format!(
                "Select at least 2 files to merge (got {})",
                count
            )));
        }
        if count > self.limits.max_files_per_request {
            return Err(PdfCutterError::LimitExceeded(format!(
                "At most {} files can be merged at once (got {})",
                self.limits.max_files_per_request, count
            )));
        }
        Ok(())
    }

    /// Running page total for a merge, checked as each input is opened
    pub fn merge_budget(&self) -> MergeBudget {
        MergeBudget {
            max_pages: self.limits.max_pages_per_pdf,
            total_pages: 0,
        }
    }
}

/// A resolved selection must name at least one page
pub fn require_pages(pages: &[u32]) -> Result<()> {
    if pages.is_empty() {
        return Err(PdfCutterError::InvalidSpecification(
            "No valid pages specified".into(),
        ));
    }
    Ok(())
}

/// Pages left after removing `selection`; fails when nothing would remain
pub fn check_deletion(selection: &[u32], total_pages: u32) -> Result<Vec<u32>> {
    require_pages(selection)?;

    if selection.len() >= total_pages as usize {
        return Err(PdfCutterError::EmptyResult(
            "Cannot delete every page of the document".into(),
        ));
    }

    let removed: BTreeSet<u32> = selection.iter().copied().collect();
    let remaining: Vec<u32> = (1..=total_pages).filter(|p| !removed.contains(p)).collect();
    if remaining.is_empty() {
        return Err(PdfCutterError::EmptyResult(
            "Cannot delete every page of the document".into(),
        ));
    }

    Ok(remaining)
}

/// Strict check for a caller-supplied page order.
///
/// The order must have exactly one entry per page and every entry must name
/// an existing page. Repeated or missing pages are accepted.
pub fn check_order(order: &[i64], total_pages: u32) -> Result<Vec<u32>> {
    if order.len() != total_pages as usize {
        return Err(PdfCutterError::OutOfRange(format!(
            "Page order has {} entries but the document has {} pages",
            order.len(),
            total_pages
        )));
    }

    order
        .iter()
        .map(|&page| {
            if page >= 1 && page <= i64::from(total_pages) {
                Ok(page as u32)
            } else {
                Err(PdfCutterError::OutOfRange(format!(
                    "Page {} is outside the document (1-{})",
                    page, total_pages
                )))
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct MergeBudget {
    max_pages: u32,
    total_pages: u32,
}

impl MergeBudget {
    /// Account for one more input; fails once the running total passes the ceiling
    pub fn add(&mut self, file: &str, pages: u32) -> Result<()> {
        self.total_pages = self.total_pages.saturating_add(pages);
        if self.total_pages > self.max_pages {
            return Err(PdfCutterError::LimitExceeded(format!(
                "Merged document would exceed {} pages (reached {} at '{}')",
                self.max_pages, self.total_pages, file
            )));
        }
        Ok(())
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }
}
