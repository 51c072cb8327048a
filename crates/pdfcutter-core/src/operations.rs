//! Page-level document operations
//!
//! Each operation is a single-shot transform over one request's inputs.
//! All validation runs before the first output is serialized, and a failure
//! anywhere yields an error instead of a partial document.

use tracing::debug;

use crate::codec::{OutputBuilder, PageSource, PdfCodec};
use crate::error::{PdfCutterError, Result};
use crate::limits::Limits;
use crate::naming;
use crate::page_spec::PageSpecification;
use crate::validation::{self, PageSelectionValidator};

/// An uploaded file as received from the request layer
#[derive(Debug, Clone)]
pub struct InputFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// A source document opened for the duration of one request
pub struct LoadedDocument<S> {
    filename: String,
    base_name: String,
    total_pages: u32,
    source: S,
}

impl<S: PageSource> LoadedDocument<S> {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Sanitized filename without extension, used for output names
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// One produced document
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub display_name: String,
    pub page_count: u32,
    pub bytes: Vec<u8>,
}

/// One page of a split
#[derive(Debug, Clone)]
pub struct SplitPage {
    pub display_name: String,
    pub page_number: u32,
    pub bytes: Vec<u8>,
}

/// Summary of an opened document, for clients that render a page grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub filename: String,
    pub total_pages: u32,
    pub version: Option<String>,
    pub encrypted: bool,
}

pub struct PageEditor<C> {
    codec: C,
    validator: PageSelectionValidator,
}

impl<C: PdfCodec> PageEditor<C> {
    pub fn new(codec: C, limits: Limits) -> Self {
        Self {
            codec,
            validator: PageSelectionValidator::new(limits),
        }
    }

    pub fn limits(&self) -> &Limits {
        self.validator.limits()
    }

    /// Open a single upload, enforcing the per-document page ceiling
    pub fn open(&self, file: &InputFile) -> Result<LoadedDocument<C::Source>> {
        let doc = self.load(file)?;
        self.validator.check_page_count(doc.total_pages)?;
        Ok(doc)
    }

    pub fn inspect(&self, file: &InputFile) -> Result<DocumentInfo> {
        let doc = self.open(file)?;
        Ok(DocumentInfo {
            filename: doc.filename.clone(),
            total_pages: doc.total_pages,
            version: doc.source.pdf_version(),
            encrypted: doc.source.is_encrypted(),
        })
    }

    /// One single-page document per selected page, in ascending page order
    pub fn split(
        &self,
        doc: &LoadedDocument<C::Source>,
        spec: &PageSpecification,
    ) -> Result<Vec<SplitPage>> {
        let pages = ascending(spec.resolve(doc.total_pages)?);
        validation::require_pages(&pages)?;

        debug!(file = %doc.filename, pages = pages.len(), "splitting document");

        pages
            .into_iter()
            .map(|page| {
                let bytes = self.build(doc, &[page])?.bytes;
                Ok(SplitPage {
                    display_name: naming::page_name(&doc.base_name, page),
                    page_number: page,
                    bytes,
                })
            })
            .collect()
    }

    /// Concatenate every page of every input, in input order.
    ///
    /// Inputs are opened one at a time and the combined page count is checked
    /// after each; crossing the ceiling aborts the whole merge.
    pub fn merge(&self, files: &[InputFile]) -> Result<OutputFile> {
        self.validator.check_file_count(files.len())?;

        let mut budget = self.validator.merge_budget();
        let mut builder = self.codec.builder();

        for file in files {
            let doc = self.load(file)?;
            budget.add(&doc.filename, doc.total_pages)?;
            for page in 1..=doc.total_pages {
                builder.append_page(&doc.source, page)?;
            }
        }

        debug!(
            files = files.len(),
            pages = budget.total_pages(),
            "merging documents"
        );

        let page_count = builder.page_count();
        Ok(OutputFile {
            display_name: naming::MERGED_NAME.to_string(),
            page_count,
            bytes: builder.finish()?,
        })
    }

    /// Everything except the selected pages, in original order
    pub fn delete(
        &self,
        doc: &LoadedDocument<C::Source>,
        spec: &PageSpecification,
    ) -> Result<OutputFile> {
        let selection = ascending(spec.resolve(doc.total_pages)?);
        let remaining = validation::check_deletion(&selection, doc.total_pages)?;

        debug!(file = %doc.filename, deleted = selection.len(), "deleting pages");

        let mut output = self.build(doc, &remaining)?;
        output.display_name = naming::deleted_name(&doc.base_name);
        Ok(output)
    }

    /// Exactly the selected pages, always in ascending order
    pub fn extract(
        &self,
        doc: &LoadedDocument<C::Source>,
        spec: &PageSpecification,
    ) -> Result<OutputFile> {
        let selection = ascending(spec.resolve(doc.total_pages)?);
        if selection.is_empty() {
            return Err(PdfCutterError::EmptyResult(
                "No pages selected for extraction".into(),
            ));
        }

        debug!(file = %doc.filename, extracted = selection.len(), "extracting pages");

        let mut output = self.build(doc, &selection)?;
        output.display_name = naming::extracted_name(&doc.base_name);
        Ok(output)
    }

    /// Pages in exactly the caller's order; one entry per source page
    pub fn reorder(&self, doc: &LoadedDocument<C::Source>, order: &[u32]) -> Result<OutputFile> {
        let order: Vec<i64> = order.iter().map(|&p| i64::from(p)).collect();
        let order = validation::check_order(&order, doc.total_pages)?;

        debug!(file = %doc.filename, pages = order.len(), "reordering pages");

        let mut output = self.build(doc, &order)?;
        output.display_name = naming::reordered_name(&doc.base_name);
        Ok(output)
    }

    fn load(&self, file: &InputFile) -> Result<LoadedDocument<C::Source>> {
        let source = self.codec.open(&file.filename, &file.bytes)?;
        let total_pages = source.page_count();
        if total_pages == 0 {
            return Err(PdfCutterError::source_document(
                &file.filename,
                "document has no pages",
            ));
        }

        Ok(LoadedDocument {
            filename: file.filename.clone(),
            base_name: naming::base_name(&file.filename),
            total_pages,
            source,
        })
    }

    fn build(&self, doc: &LoadedDocument<C::Source>, pages: &[u32]) -> Result<OutputFile> {
        let mut builder = self.codec.builder();
        for &page in pages {
            builder.append_page(&doc.source, page)?;
        }
        let page_count = builder.page_count();
        Ok(OutputFile {
            display_name: doc.base_name.clone(),
            page_count,
            bytes: builder.finish()?,
        })
    }
}

fn ascending(mut pages: Vec<u32>) -> Vec<u32> {
    pages.sort_unstable();
    pages.dedup();
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Codec over newline-separated page labels; "corrupt" fails to open
    struct LabelCodec;

    struct LabelSource {
        labels: Vec<String>,
    }

    struct LabelBuilder {
        labels: Vec<String>,
    }

    impl PageSource for LabelSource {
        fn page_count(&self) -> u32 {
            self.labels.len() as u32
        }
    }

    impl OutputBuilder for LabelBuilder {
        type Source = LabelSource;

        fn append_page(&mut self, source: &LabelSource, page: u32) -> Result<()> {
            let label = (page as usize)
                .checked_sub(1)
                .and_then(|i| source.labels.get(i))
                .ok_or_else(|| PdfCutterError::OutOfRange(format!("no page {}", page)))?;
            self.labels.push(label.clone());
            Ok(())
        }

        fn page_count(&self) -> u32 {
            self.labels.len() as u32
        }

        fn finish(self) -> Result<Vec<u8>> {
            Ok(self.labels.join("\n").into_bytes())
        }
    }

    impl PdfCodec for LabelCodec {
        type Source = LabelSource;
        type Builder = LabelBuilder;

        fn open(&self, name: &str, bytes: &[u8]) -> Result<LabelSource> {
            let text = String::from_utf8_lossy(bytes);
            if text == "corrupt" {
                return Err(PdfCutterError::source_document(name, "bad xref"));
            }
            let labels = text
                .split('\n')
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            Ok(LabelSource { labels })
        }

        fn builder(&self) -> LabelBuilder {
            LabelBuilder { labels: Vec::new() }
        }
    }

    fn editor() -> PageEditor<LabelCodec> {
        PageEditor::new(LabelCodec, Limits::new(20, 5))
    }

    fn pages(prefix: &str, count: u32) -> Vec<u8> {
        (1..=count)
            .map(|i| format!("{}{}", prefix, i))
            .collect::<Vec<_>>()
            .join("\n")
            .into_bytes()
    }

    fn labels(bytes: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(bytes)
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    fn set(pages: &[i64]) -> PageSpecification {
        PageSpecification::ExplicitSet {
            pages: pages.iter().copied().collect(),
        }
    }

    #[test]
    fn test_open_rejects_documents_over_limit() {
        let file = InputFile::new("big.pdf", pages("p", 21));
        assert!(matches!(
            editor().open(&file),
            Err(PdfCutterError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_open_rejects_empty_document() {
        let file = InputFile::new("empty.pdf", Vec::<u8>::new());
        assert!(matches!(
            editor().open(&file),
            Err(PdfCutterError::SourceDocument { .. })
        ));
    }

    #[test]
    fn test_inspect() {
        let info = editor().inspect(&InputFile::new("a.pdf", pages("p", 7))).unwrap();
        assert_eq!(info.total_pages, 7);
        assert_eq!(info.filename, "a.pdf");
    }

    #[test]
    fn test_split_all_pages_names_and_order() {
        let editor = editor();
        let doc = editor
            .open(&InputFile::new("report.pdf", pages("p", 3)))
            .unwrap();
        let out = editor.split(&doc, &PageSpecification::AllPages).unwrap();

        let names: Vec<_> = out.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["report_page_1.pdf", "report_page_2.pdf", "report_page_3.pdf"]
        );
        let numbers: Vec<_> = out.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(labels(&out[1].bytes), vec!["p2"]);
    }

    #[test]
    fn test_split_order_is_ascending() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 6))).unwrap();
        let order = PageSpecification::ExplicitOrder {
            pages: vec![5, 2, 4, 1, 3, 6],
        };
        let out = editor.split(&doc, &order).unwrap();
        let numbers: Vec<_> = out.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_split_empty_selection_fails() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 3))).unwrap();
        assert!(matches!(
            editor.split(&doc, &set(&[9])),
            Err(PdfCutterError::InvalidSpecification(_))
        ));
    }

    #[test]
    fn test_merge_preserves_input_order() {
        let files = vec![
            InputFile::new("b.pdf", pages("b", 2)),
            InputFile::new("a.pdf", pages("a", 1)),
            InputFile::new("c.pdf", pages("c", 2)),
        ];
        let out = editor().merge(&files).unwrap();
        assert_eq!(out.display_name, "merged_document.pdf");
        assert_eq!(out.page_count, 5);
        assert_eq!(labels(&out.bytes), vec!["b1", "b2", "a1", "c1", "c2"]);
    }

    #[test]
    fn test_merge_requires_two_files() {
        let files = vec![InputFile::new("a.pdf", pages("a", 1))];
        assert!(matches!(
            editor().merge(&files),
            Err(PdfCutterError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_merge_rejects_too_many_files() {
        let files: Vec<_> = (0..6)
            .map(|i| InputFile::new(format!("{}.pdf", i), pages("x", 1)))
            .collect();
        assert!(matches!(
            editor().merge(&files),
            Err(PdfCutterError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_merge_aborts_when_third_file_crosses_limit() {
        let files = vec![
            InputFile::new("1.pdf", pages("a", 8)),
            InputFile::new("2.pdf", pages("b", 8)),
            InputFile::new("3.pdf", pages("c", 8)),
            InputFile::new("4.pdf", pages("d", 1)),
            InputFile::new("5.pdf", pages("e", 1)),
        ];
        let err = editor().merge(&files).unwrap_err();
        assert!(matches!(err, PdfCutterError::LimitExceeded(_)));
        assert!(err.to_string().contains("3.pdf"));
    }

    #[test]
    fn test_merge_names_corrupt_file() {
        let files = vec![
            InputFile::new("good.pdf", pages("a", 2)),
            InputFile::new("broken.pdf", "corrupt"),
        ];
        match editor().merge(&files) {
            Err(PdfCutterError::SourceDocument { file, .. }) => assert_eq!(file, "broken.pdf"),
            other => panic!("expected source error, got {:?}", other.map(|o| o.page_count)),
        }
    }

    #[test]
    fn test_delete_keeps_remaining_in_order() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 5))).unwrap();
        let out = editor.delete(&doc, &set(&[4, 2])).unwrap();
        assert_eq!(out.display_name, "a_deleted.pdf");
        assert_eq!(labels(&out.bytes), vec!["p1", "p3", "p5"]);
    }

    #[test]
    fn test_delete_all_pages_fails() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 10))).unwrap();
        let all: Vec<i64> = (1..=10).collect();
        assert!(matches!(
            editor.delete(&doc, &set(&all)),
            Err(PdfCutterError::EmptyResult(_))
        ));
    }

    #[test]
    fn test_delete_empty_selection_fails() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 3))).unwrap();
        assert!(matches!(
            editor.delete(&doc, &set(&[])),
            Err(PdfCutterError::InvalidSpecification(_))
        ));
    }

    #[test]
    fn test_extract_normalizes_to_ascending() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 5))).unwrap();
        let order = PageSpecification::ExplicitOrder {
            pages: vec![5, 3, 1, 2, 4],
        };
        let out = editor.extract(&doc, &order).unwrap();
        assert_eq!(labels(&out.bytes), vec!["p1", "p2", "p3", "p4", "p5"]);

        let out = editor.extract(&doc, &set(&[4, 2])).unwrap();
        assert_eq!(out.display_name, "a_extracted.pdf");
        assert_eq!(labels(&out.bytes), vec!["p2", "p4"]);
    }

    #[test]
    fn test_extract_all_equals_original() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 4))).unwrap();
        let out = editor.extract(&doc, &PageSpecification::AllPages).unwrap();
        assert_eq!(out.bytes, pages("p", 4));
    }

    #[test]
    fn test_extract_empty_selection_fails() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 3))).unwrap();
        assert!(matches!(
            editor.extract(&doc, &set(&[0, 8])),
            Err(PdfCutterError::EmptyResult(_))
        ));
    }

    #[test]
    fn test_delete_and_extract_are_complementary() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 6))).unwrap();
        let selection = set(&[2, 3, 6]);

        let deleted = labels(&editor.delete(&doc, &selection).unwrap().bytes);
        let extracted = labels(&editor.extract(&doc, &selection).unwrap().bytes);

        let mut union: Vec<_> = deleted.iter().chain(extracted.iter()).cloned().collect();
        union.sort();
        assert_eq!(union, labels(&pages("p", 6)));
        assert!(deleted.iter().all(|p| !extracted.contains(p)));
    }

    #[test]
    fn test_reorder_follows_caller_order() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 4))).unwrap();
        let out = editor.reorder(&doc, &[4, 1, 3, 2]).unwrap();
        assert_eq!(out.display_name, "a_reordered.pdf");
        assert_eq!(labels(&out.bytes), vec!["p4", "p1", "p3", "p2"]);
    }

    #[test]
    fn test_reorder_rejects_length_mismatch() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 5))).unwrap();
        let err = editor.reorder(&doc, &[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, PdfCutterError::OutOfRange(_)));
    }

    #[test]
    fn test_reorder_rejects_out_of_range_page() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 3))).unwrap();
        assert!(matches!(
            editor.reorder(&doc, &[1, 2, 4]),
            Err(PdfCutterError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_merge_of_split_reconstructs_original() {
        let editor = editor();
        let doc = editor.open(&InputFile::new("a.pdf", pages("p", 4))).unwrap();
        let parts: Vec<InputFile> = editor
            .split(&doc, &PageSpecification::AllPages)
            .unwrap()
            .into_iter()
            .map(|p| InputFile::new(p.display_name, p.bytes))
            .collect();
        let merged = editor.merge(&parts).unwrap();
        assert_eq!(merged.bytes, pages("p", 4));
    }
}
