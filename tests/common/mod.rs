//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use edgequake_md2pdf::{PageOptions, PdfRenderer, RenderError};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// HTML containing this marker makes [`FakeRenderer`] fail.
pub const FAIL_MARKER: &str = "FAIL_RENDER";

/// HTML containing this marker makes [`FakeRenderer`] return bytes that are
/// not a PDF.
pub const GARBAGE_MARKER: &str = "GARBAGE_RENDER";

/// A PDF with one page per label; each page shows its label with `Tj`.
pub fn pdf_with_pages(labels: &[&str]) -> Document {
    pdf_with_contents(labels, |doc, label| {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let bytes = content.encode().unwrap();
        Object::Reference(doc.add_object(Stream::new(Dictionary::new(), bytes)))
    })
}

/// A PDF whose pages carry a `/Contents` value no viewer could draw.
pub fn pdf_with_broken_contents(pages: usize) -> Document {
    let labels = vec!["broken"; pages];
    pdf_with_contents(&labels, |_, _| Object::Integer(42))
}

fn pdf_with_contents(
    labels: &[&str],
    mut make_contents: impl FnMut(&mut Document, &str) -> Object,
) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Courier".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for label in labels {
        let contents = make_contents(&mut doc, label);
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", contents),
        ]));
        kids.push(Object::Reference(page_id));
    }

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
                Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]),
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

pub fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Strings shown with `Tj` on a page, in drawing order.
pub fn shown_strings(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let bytes = doc.get_page_content(page_id).unwrap();
    Content::decode(&bytes)
        .unwrap()
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

/// `shown_strings` for every page of the PDF at `path`.
pub fn strings_per_page(path: &Path) -> Vec<Vec<String>> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| shown_strings(&doc, id))
        .collect()
}

/// Stands in for Chromium: prints a one-page PDF showing the document's
/// first `<h1>` text.
#[derive(Default)]
pub struct FakeRenderer {
    pub calls: AtomicUsize,
    /// Set once the first render completes.
    pub cancel_after_first: Option<Arc<AtomicBool>>,
}

impl FakeRenderer {
    pub fn cancelling(flag: Arc<AtomicBool>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            cancel_after_first: Some(flag),
        }
    }
}

impl PdfRenderer for FakeRenderer {
    async fn render(
        &self,
        html: &str,
        _source_dir: Option<&Path>,
        _options: &PageOptions,
    ) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref flag) = self.cancel_after_first {
            flag.store(true, Ordering::SeqCst);
        }
        if html.contains(FAIL_MARKER) {
            return Err(RenderError::Browser("page crashed".into()));
        }
        if html.contains(GARBAGE_MARKER) {
            return Ok(b"<html>printed the error page</html>".to_vec());
        }
        let title = first_heading(html).unwrap_or("untitled");
        Ok(to_bytes(pdf_with_pages(&[title])))
    }
}

fn first_heading(html: &str) -> Option<&str> {
    let start = html.find("<h1")?;
    let open_end = start + html[start..].find('>')? + 1;
    let close = open_end + html[open_end..].find("</h1>")?;
    Some(&html[open_end..close])
}
