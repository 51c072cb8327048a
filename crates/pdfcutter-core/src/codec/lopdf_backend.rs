//! lopdf-backed codec
//!
//! Pages are copied by "construction by whitelist": only the page dictionary
//! and the objects reachable from it are imported into the output, with
//! object IDs remapped into the destination's ID space. Objects shared by
//! several copied pages (fonts, images) are imported once per source.
//!
//! References into the source page tree (link destinations, annotation
//! `/P` entries) are never followed. A reference to a page is pointed at
//! that page's copy in the output, or nulled when the page is not copied.

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use uuid::Uuid;

use super::{OutputBuilder, PageSource, PdfCodec};
use crate::error::{PdfCutterError, Result};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic /Parent chains in damaged files
const MAX_TREE_DEPTH: usize = 64;

const OUTPUT_VERSION: &str = "1.7";

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCodec;

impl PdfCodec for LopdfCodec {
    type Source = LopdfSource;
    type Builder = LopdfBuilder;

    fn open(&self, name: &str, bytes: &[u8]) -> Result<LopdfSource> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(PdfCutterError::source_document(
                name,
                "not a PDF file (missing %PDF- header)",
            ));
        }

        let doc =
            Document::load_mem(bytes).map_err(|e| PdfCutterError::source_document(name, e))?;

        if doc.is_encrypted() {
            return Err(PdfCutterError::source_document(
                name,
                "encrypted documents are not supported",
            ));
        }

        let pages = doc.get_pages();
        tracing::debug!(file = name, pages = pages.len(), "opened source document");

        Ok(LopdfSource {
            key: Uuid::new_v4(),
            name: name.to_string(),
            doc,
            pages,
        })
    }

    fn builder(&self) -> LopdfBuilder {
        LopdfBuilder::new()
    }
}

/// A parsed upload and its page number → page object map
#[derive(Debug)]
pub struct LopdfSource {
    /// Distinguishes sources inside a builder's import table
    key: Uuid,
    name: String,
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfSource {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `id` is a node of the page tree rather than page content
    fn tree_node(&self, id: ObjectId) -> Option<TreeNode> {
        if self.pages.values().any(|&page_id| page_id == id) {
            return Some(TreeNode::Page);
        }
        let node = self.doc.get_dictionary(id).ok()?;
        match node.get(b"Type").and_then(Object::as_name).ok()? {
            b"Page" => Some(TreeNode::Page),
            b"Pages" => Some(TreeNode::Interior),
            _ => None,
        }
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages.get(&page).copied().ok_or_else(|| {
            PdfCutterError::OutOfRange(format!(
                "Page {} does not exist in '{}' ({} pages)",
                page,
                self.name,
                self.pages.len()
            ))
        })
    }

    /// Walk up the page tree for an attribute the page does not set itself
    fn inherited_attribute(&self, page: &Dictionary, key: &[u8]) -> Option<Object> {
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(id) = parent {
            if depth >= MAX_TREE_DEPTH {
                break;
            }
            let node = self.doc.get_dictionary(id).ok()?;
            if let Ok(value) = node.get(key) {
                return Some(value.clone());
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }

        None
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn pdf_version(&self) -> Option<String> {
        Some(self.doc.version.clone())
    }

    fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }
}

enum TreeNode {
    Page,
    Interior,
}

#[derive(Debug)]
pub struct LopdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// (source key, source object) → destination object
    imported: HashMap<(Uuid, ObjectId), ObjectId>,
    /// (source key, source page) → destination id of that page's first copy.
    /// Reserved on first reference; stays empty if the page is never appended.
    page_slots: HashMap<(Uuid, ObjectId), ObjectId>,
}

impl LopdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version(OUTPUT_VERSION);
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            imported: HashMap::new(),
            page_slots: HashMap::new(),
        }
    }

    fn page_slot(&mut self, source: &LopdfSource, page_id: ObjectId) -> ObjectId {
        let doc = &mut self.doc;
        *self
            .page_slots
            .entry((source.key, page_id))
            .or_insert_with(|| doc.new_object_id())
    }

    fn import_object(&mut self, source: &LopdfSource, id: ObjectId) -> ObjectId {
        if let Some(&mapped) = self.imported.get(&(source.key, id)) {
            return mapped;
        }

        // Register before recursing so reference cycles terminate
        let new_id = self.doc.new_object_id();
        self.imported.insert((source.key, id), new_id);

        // Dangling references become null, as PDF readers treat them
        let object = source.doc.get_object(id).cloned().unwrap_or(Object::Null);
        let object = self.remap_object(source, object);
        self.doc.objects.insert(new_id, object);

        new_id
    }

    /// Recursively import every object referenced from `obj`
    fn remap_object(&mut self, source: &LopdfSource, obj: Object) -> Object {
        match obj {
            Object::Reference(id) => match source.tree_node(id) {
                Some(TreeNode::Page) => Object::Reference(self.page_slot(source, id)),
                Some(TreeNode::Interior) => Object::Null,
                None => Object::Reference(self.import_object(source, id)),
            },
            Object::Array(arr) => Object::Array(
                arr.into_iter()
                    .map(|o| self.remap_object(source, o))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.remap_dictionary(source, dict)),
            Object::Stream(mut stream) => {
                stream.dict = self.remap_dictionary(source, stream.dict);
                Object::Stream(stream)
            }
            other => other,
        }
    }

    fn remap_dictionary(&mut self, source: &LopdfSource, mut dict: Dictionary) -> Dictionary {
        for (_, value) in dict.iter_mut() {
            let taken = std::mem::replace(value, Object::Null);
            *value = self.remap_object(source, taken);
        }
        dict
    }
}

impl Default for LopdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuilder for LopdfBuilder {
    type Source = LopdfSource;

    fn append_page(&mut self, source: &LopdfSource, page: u32) -> Result<()> {
        let page_id = source.page_id(page)?;
        let mut page_dict = source
            .doc
            .get_dictionary(page_id)
            .map_err(|e| PdfCutterError::source_document(&source.name, e))?
            .clone();

        for key in INHERITABLE {
            if !page_dict.has(key) {
                if let Some(value) = source.inherited_attribute(&page_dict, key) {
                    page_dict.set(key, value);
                }
            }
        }
        // The source page tree must not be dragged along
        page_dict.remove(b"Parent");

        // Each append gets its own page object, so a page may appear twice.
        // References to the page (e.g. annotation /P) go to its first copy.
        let slot = self.page_slot(source, page_id);
        let new_id = if self.doc.objects.contains_key(&slot) {
            self.doc.new_object_id()
        } else {
            slot
        };

        let mut page_dict = self.remap_dictionary(source, page_dict);
        page_dict.set("Parent", Object::Reference(self.pages_id));
        self.doc.objects.insert(new_id, Object::Dictionary(page_dict));
        self.kids.push(new_id);

        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.kids.len() as u32
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(PdfCutterError::EmptyResult(
                "Output document has no pages".into(),
            ));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.kids.len() as i64)),
            (
                "Kids",
                Object::Array(self.kids.iter().map(|&id| Object::Reference(id)).collect()),
            ),
        ]);
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]);
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        // Links to pages that were never appended must not dangle
        let unfilled: HashSet<ObjectId> = self
            .page_slots
            .values()
            .filter(|id| !self.doc.objects.contains_key(id))
            .copied()
            .collect();
        if !unfilled.is_empty() {
            for object in self.doc.objects.values_mut() {
                null_references(object, &unfilled);
            }
        }

        // Drop objects only reachable from pages that were not copied
        self.doc.prune_objects();
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfCutterError::Serialization(e.to_string()))?;

        Ok(buffer)
    }
}

fn null_references(object: &mut Object, targets: &HashSet<ObjectId>) {
    if let Object::Reference(id) = *object {
        if targets.contains(&id) {
            *object = Object::Null;
        }
        return;
    }

    match object {
        Object::Array(items) => {
            for item in items.iter_mut() {
                null_references(item, targets);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                null_references(value, targets);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                null_references(value, targets);
            }
        }
        _ => {}
    }
}
