//! Operator-tunable ceilings enforced by every operation

use serde::Serialize;

pub const DEFAULT_MAX_PAGES_PER_PDF: u32 = 100;
pub const DEFAULT_MAX_FILES_PER_REQUEST: usize = 10;

/// Reported to clients so they can warn before uploading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    /// Page ceiling per document; for merge, the ceiling on the combined total
    pub max_pages_per_pdf: u32,
    /// Maximum number of input files in one merge request
    pub max_files_per_request: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_pages_per_pdf: DEFAULT_MAX_PAGES_PER_PDF,
            max_files_per_request: DEFAULT_MAX_FILES_PER_REQUEST,
        }
    }
}

impl Limits {
    pub fn new(max_pages_per_pdf: u32, max_files_per_request: usize) -> Self {
        Self {
            max_pages_per_pdf,
            max_files_per_request,
        }
    }
}
