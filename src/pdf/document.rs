//! Owned PDF documents and page views over `lopdf`.

use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// Page-tree depth after which attribute inheritance gives up.
///
/// Guards against `Parent` cycles in malformed files.
pub(crate) const MAX_TREE_DEPTH: usize = 32;

/// A page's `/MediaBox`, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl MediaBox {
    /// US Letter, the PDF default when no media box is declared.
    pub const LETTER: MediaBox = MediaBox {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }
}

/// One page of a [`PdfDocument`]: its object id and resolved media box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPage {
    pub id: ObjectId,
    pub media_box: MediaBox,
}

/// An ordered sequence of pages backed by a `lopdf::Document`.
///
/// Owned by exactly one pipeline stage at a time and passed on by value.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    inner: Document,
}

impl PdfDocument {
    pub fn from_lopdf(inner: Document) -> Self {
        Self { inner }
    }

    pub fn load(path: &Path) -> Result<Self, PdfError> {
        Document::load(path)
            .map(Self::from_lopdf)
            .map_err(|e| PdfError::Load(format!("{}: {e}", path.display())))
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self, PdfError> {
        Document::load_mem(bytes)
            .map(Self::from_lopdf)
            .map_err(|e| PdfError::Load(e.to_string()))
    }

    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Pages in document order, with media boxes resolved through the page
    /// tree. Pages without any media box are treated as US Letter.
    pub fn pages(&self) -> Result<Vec<PdfPage>, PdfError> {
        self.inner
            .get_pages()
            .into_values()
            .map(|id| {
                self.inner.get_dictionary(id).map_err(|e| {
                    PdfError::Malformed(format!("page {id:?} is not a dictionary: {e}"))
                })?;
                let media_box = self.media_box(id).unwrap_or(MediaBox::LETTER);
                Ok(PdfPage { id, media_box })
            })
            .collect()
    }

    /// Decoded content of one page, all content streams concatenated.
    pub fn page_content(&self, page: &PdfPage) -> Result<Vec<u8>, PdfError> {
        self.inner
            .get_page_content(page.id)
            .map_err(|e| PdfError::Malformed(format!("page {:?} content: {e}", page.id)))
    }

    /// Serialise to PDF bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        let mut out = Vec::new();
        self.inner
            .save_to(&mut out)
            .map_err(|e| PdfError::Save(e.to_string()))?;
        Ok(out)
    }

    pub fn inner(&self) -> &Document {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    pub fn into_inner(self) -> Document {
        self.inner
    }

    fn media_box(&self, page_id: ObjectId) -> Option<MediaBox> {
        let value = inherited_attribute(&self.inner, page_id, b"MediaBox")?;
        let array = resolve(&self.inner, &value).as_array().ok()?;
        let numbers: Vec<f32> = array
            .iter()
            .filter_map(|o| as_number(resolve(&self.inner, o)))
            .collect();
        match numbers.as_slice() {
            &[x0, y0, x1, y1] => Some(MediaBox { x0, y0, x1, y1 }),
            _ => None,
        }
    }
}

/// Look up a page attribute, walking `/Parent` links for inheritable keys
/// (`Resources`, `MediaBox`, `CropBox`, `Rotate`).
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current: &Dictionary = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory fixtures shared by the pdf module tests.

    use lopdf::content::{Content, Operation};
    use lopdf::{Dictionary, Document, Object, Stream};

    /// Build a PDF whose pages each draw one label, with the given media box
    /// width and height in points.
    pub fn sample_pdf(labels: &[&str], width: i64, height: i64) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Times-Roman".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
        )]));

        let mut kids = Vec::new();
        for label in labels {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 18.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*label)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().unwrap_or_default(),
            ));
            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]));
            kids.push(Object::Reference(page_id));
        }

        // Resources and MediaBox live on the Pages node so pages inherit them.
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
                ("Resources", Object::Reference(resources_id)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), width.into(), height.into()]),
                ),
            ])),
        );

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    /// Every string shown with `Tj` on a page, in content order.
    pub fn shown_strings(doc: &Document, page_id: lopdf::ObjectId) -> Vec<String> {
        let bytes = doc.get_page_content(page_id).unwrap_or_default();
        let content = Content::decode(&bytes).unwrap_or(Content { operations: vec![] });
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first())
            .filter_map(|o| match o {
                Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }
}
