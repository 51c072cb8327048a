//! Human-readable names for produced documents
//!
//! Uploaded filenames are untrusted, so they are reduced to a safe ASCII
//! form before being reused as the base of an output name.

const FALLBACK_BASE: &str = "document";

/// Display name of the merge result
pub const MERGED_NAME: &str = "merged_document.pdf";

/// Reduce an uploaded filename to ASCII letters, digits, `.`, `_` and `-`.
///
/// Whitespace runs become a single `_`, path separators become `_`, every
/// other character is dropped, and leading dots/underscores are stripped so
/// the result can never name a hidden file or walk up a directory.
pub fn secure_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    let mut pending_space = false;

    for ch in filename.chars() {
        if ch.is_whitespace() || ch == '/' || ch == '\\' {
            pending_space = true;
            continue;
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            if pending_space && !out.is_empty() {
                out.push('_');
            }
            pending_space = false;
            out.push(ch);
        }
    }

    out.trim_start_matches(&['.', '_'][..]).to_string()
}

/// Whether a filename carries a `.pdf` extension (case-insensitive)
pub fn is_pdf_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Sanitized filename with its final extension removed
pub fn base_name(filename: &str) -> String {
    let safe = secure_filename(filename);
    let stem = match safe.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => safe.as_str(),
    };
    if stem.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        stem.to_string()
    }
}

pub fn page_name(base: &str, page: u32) -> String {
    format!("{}_page_{}.pdf", base, page)
}

pub fn deleted_name(base: &str) -> String {
    format!("{}_deleted.pdf", base)
}

pub fn extracted_name(base: &str) -> String {
    format!("{}_extracted.pdf", base)
}

pub fn reordered_name(base: &str) -> String {
    format!("{}_reordered.pdf", base)
}

pub fn archive_name(base: &str) -> String {
    format!("{}_pages.zip", base)
}
