//! Labelled PDF fixtures for end-to-end tests
//!
//! Every page draws "<prefix>-Page-<n>" and inherits its MediaBox and font
//! resources from the page tree, the way real-world producers lay them out.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

pub fn create_test_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
    create_linked_pdf(num_pages, prefix, &[])
}

/// A labelled PDF where each `(from, to)` adds a Link on page `from`
/// jumping to page `to`
pub fn create_linked_pdf(num_pages: u32, prefix: &str, links: &[(u32, u32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let tree_id = doc.new_object_id();
    let page_ids: Vec<ObjectId> = (0..num_pages).map(|_| doc.new_object_id()).collect();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Courier".to_vec())),
    ]));

    for (n, &page_id) in (1u32..).zip(&page_ids) {
        let text = format!("BT /F1 18 Tf 72 720 Td ({}-Page-{}) Tj ET", prefix, n);
        let contents = doc.add_object(Stream::new(Dictionary::new(), text.into_bytes()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(tree_id));
        page.set("Contents", Object::Reference(contents));

        let annots: Vec<Object> = links
            .iter()
            .filter(|&&(from, _)| from == n)
            .map(|&(_, to)| {
                let mut link = Dictionary::new();
                link.set("Type", Object::Name(b"Annot".to_vec()));
                link.set("Subtype", Object::Name(b"Link".to_vec()));
                link.set("P", Object::Reference(page_id));
                link.set(
                    "Dest",
                    Object::Array(vec![
                        Object::Reference(page_ids[to as usize - 1]),
                        Object::Name(b"Fit".to_vec()),
                    ]),
                );
                Object::Reference(doc.add_object(link))
            })
            .collect();
        if !annots.is_empty() {
            page.set("Annots", Object::Array(annots));
        }

        doc.objects.insert(page_id, Object::Dictionary(page));
    }

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut tree = Dictionary::new();
    tree.set("Type", Object::Name(b"Pages".to_vec()));
    tree.set("Count", Object::Integer(i64::from(num_pages)));
    tree.set(
        "Kids",
        Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
    );
    tree.set(
        "MediaBox",
        Object::Array([0, 0, 595, 842].into_iter().map(Object::Integer).collect()),
    );
    tree.set("Resources", Object::Dictionary(resources));
    doc.objects.insert(tree_id, Object::Dictionary(tree));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(tree_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// The "<prefix>-Page-<n>" label of every page, in page order
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| label_in(&String::from_utf8_lossy(&doc.get_page_content(id).unwrap())))
        .collect()
}

/// Every page label found in any stream of the file, reachable or not
pub fn labels_anywhere(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.objects
        .values()
        .filter_map(|object| match object {
            Object::Stream(stream) => Some(
                stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone()),
            ),
            _ => None,
        })
        .map(|content| String::from_utf8_lossy(&content).into_owned())
        .filter(|text| text.contains("-Page-"))
        .map(|text| label_in(&text))
        .collect()
}

pub fn expected_labels(prefix: &str, pages: impl IntoIterator<Item = u32>) -> Vec<String> {
    pages
        .into_iter()
        .map(|p| format!("{}-Page-{}", prefix, p))
        .collect()
}

fn label_in(content: &str) -> String {
    let start = content.find('(').unwrap() + 1;
    let end = content[start..].find(')').unwrap() + start;
    content[start..end].to_string()
}
