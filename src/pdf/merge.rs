//! Concatenate PDF documents.
//!
//! Each source is renumbered into a disjoint object-id range, its pages are
//! flattened (inheritable attributes copied onto the page itself) and then
//! re-parented under one fresh page tree. Named destinations are carried
//! into the new catalog, renamed on collision; the rest of each source
//! catalog, its page tree and its outlines are discarded.

use super::dests::NamedDestinations;
use super::document::{inherited_attribute, PdfDocument};
use crate::error::{Md2PdfError, MergeError, PdfError};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::PathBuf;
use tracing::debug;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Stateless PDF concatenation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfMerger;

impl PdfMerger {
    /// Concatenate `sources` in order. The result has exactly the sum of the
    /// sources' pages, in source order then per-source page order.
    pub fn merge(sources: Vec<PdfDocument>) -> Result<PdfDocument, MergeError> {
        if sources.is_empty() {
            return Err(MergeError::NoSources);
        }

        let mut merged = Document::with_version("1.5");
        let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
        let mut next_id = 1;
        let mut destinations = NamedDestinations::default();

        for (index, source) in sources.into_iter().enumerate() {
            let mut doc = source.into_inner();
            doc.renumber_objects_with(next_id);
            next_id = doc.max_id + 1;
            destinations.absorb(&mut doc, index);

            let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
            if page_ids.is_empty() {
                return Err(MergeError::Source {
                    index,
                    source: PdfError::Malformed("document has no pages".into()),
                });
            }
            for page_id in page_ids {
                let page = flattened_page(&doc, page_id)
                    .map_err(|source| MergeError::Source { index, source })?;
                pages.push((page_id, page));
            }

            for (id, object) in doc.objects {
                match object.type_name().unwrap_or("") {
                    "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                    _ => {
                        merged.objects.insert(id, object);
                    }
                }
            }
        }

        merged.max_id = next_id - 1;
        let pages_id = merged.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        for (id, mut page) in pages {
            page.set("Parent", Object::Reference(pages_id));
            merged.objects.insert(id, Object::Dictionary(page));
            kids.push(Object::Reference(id));
        }
        let count = kids.len() as i64;
        merged.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );

        let mut catalog = Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let named = destinations.len();
        destinations.write_into(&mut catalog);
        let catalog_id = merged.add_object(catalog);
        merged.trailer.set("Root", Object::Reference(catalog_id));

        debug!("Merged document has {count} pages, {named} named destinations");
        Ok(PdfDocument::from_lopdf(merged))
    }

    /// Load PDFs from disk and [`merge`](Self::merge) them.
    ///
    /// Errors name the file that could not be used.
    pub fn merge_files(paths: &[PathBuf]) -> Result<PdfDocument, Md2PdfError> {
        if paths.is_empty() {
            return Err(Md2PdfError::Internal(MergeError::NoSources.to_string()));
        }
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let doc = PdfDocument::load(path).map_err(|e| Md2PdfError::MergeFailed {
                path: path.clone(),
                detail: e.to_string(),
            })?;
            sources.push(doc);
        }
        Self::merge(sources).map_err(|e| {
            let path = match &e {
                MergeError::Source { index, .. } => paths[*index].clone(),
                MergeError::NoSources => PathBuf::new(),
            };
            Md2PdfError::MergeFailed {
                path,
                detail: e.to_string(),
            }
        })
    }
}

/// A copy of the page dictionary carrying every attribute it inherits.
fn flattened_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary, PdfError> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfError::Malformed(format!("page {page_id:?}: {e}")))?
        .clone();
    for key in INHERITABLE_KEYS {
        if !page.has(key) {
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                page.set(key, value);
            }
        }
    }
    Ok(page)
}
