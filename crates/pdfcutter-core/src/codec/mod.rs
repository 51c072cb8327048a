//! Document access capability
//!
//! The operations never touch PDF bytes directly. A codec opens uploads into
//! immutable page sources and copies pages into append-only builders, which
//! are serialized exactly once.

pub mod lopdf_backend;

use crate::error::Result;

pub use lopdf_backend::{LopdfBuilder, LopdfCodec, LopdfSource};

/// A loaded, read-only source document
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// PDF header version, when the codec knows it
    fn pdf_version(&self) -> Option<String> {
        None
    }

    fn is_encrypted(&self) -> bool {
        false
    }
}

/// An output document under construction
pub trait OutputBuilder {
    type Source: PageSource;

    /// Copy 1-based `page` of `source` to the end of this document
    fn append_page(&mut self, source: &Self::Source, page: u32) -> Result<()>;

    fn page_count(&self) -> u32;

    /// Serialize the finished document
    fn finish(self) -> Result<Vec<u8>>;
}

pub trait PdfCodec {
    type Source: PageSource;
    type Builder: OutputBuilder<Source = Self::Source>;

    /// Parse an upload; `name` identifies it in error messages
    fn open(&self, name: &str, bytes: &[u8]) -> Result<Self::Source>;

    fn builder(&self) -> Self::Builder;
}
