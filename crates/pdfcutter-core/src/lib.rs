//! Page selection and page manipulation for uploaded PDFs
//!
//! This crate parses user page specifications, validates them against the
//! configured limits, and applies split / merge / delete / extract / reorder
//! to documents opened through a [`PdfCodec`].
//!
//! The bundled codec is [`LopdfCodec`]; operations are generic so tests and
//! other backends can supply their own.
//!
//! ```no_run
//! use pdfcutter_core::{InputFile, LopdfCodec, Limits, PageEditor, PageSpecification};
//!
//! # fn run(bytes: Vec<u8>) -> Result<(), pdfcutter_core::PdfCutterError> {
//! let editor = PageEditor::new(LopdfCodec, Limits::default());
//! let doc = editor.open(&InputFile::new("report.pdf", bytes))?;
//! let pages = editor.split(&doc, &PageSpecification::AllPages)?;
//! assert_eq!(pages[0].display_name, "report_page_1.pdf");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod limits;
pub mod naming;
pub mod operations;
pub mod page_spec;
pub mod validation;

pub use codec::{LopdfCodec, OutputBuilder, PageSource, PdfCodec};
pub use error::{PdfCutterError, Result};
pub use limits::Limits;
pub use operations::{DocumentInfo, InputFile, LoadedDocument, OutputFile, PageEditor, SplitPage};
pub use page_spec::{parse, parse_order, parse_selection, PageSpecification};
pub use validation::PageSelectionValidator;
