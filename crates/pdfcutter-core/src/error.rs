use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdfCutterError {
    #[error("Invalid page specification: {0}")]
    InvalidSpecification(String),

    #[error("Page order rejected: {0}")]
    OutOfRange(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Could not read '{file}': {reason}")]
    SourceDocument { file: String, reason: String },

    #[error("Failed to write PDF: {0}")]
    Serialization(String),
}

impl PdfCutterError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PdfCutterError::InvalidSpecification(_) => "INVALID_SPECIFICATION",
            PdfCutterError::OutOfRange(_) => "OUT_OF_RANGE",
            PdfCutterError::LimitExceeded(_) => "LIMIT_EXCEEDED",
            PdfCutterError::EmptyResult(_) => "EMPTY_RESULT",
            PdfCutterError::SourceDocument { .. } => "SOURCE_DOCUMENT",
            PdfCutterError::Serialization(_) => "SERIALIZATION",
        }
    }

    pub(crate) fn source_document(file: &str, reason: impl ToString) -> Self {
        PdfCutterError::SourceDocument {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfCutterError>;
