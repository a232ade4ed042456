//! Draw text on top of existing PDF pages.
//!
//! The page's original content is wrapped in a `q … Q` pair before the new
//! stream is appended, so whatever graphics state the original content left
//! behind (CTM, colour, clipping) cannot move or hide the overlay.

use super::document::{inherited_attribute, resolve, PdfPage};
use super::fonts::StandardFont;
use crate::error::PdfError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Resource name the overlay font is registered under on every page.
pub const OVERLAY_FONT_RESOURCE: &str = "FMd2PdfFooter";

/// Writes single lines of text onto pages of one document.
///
/// The font dictionary is added to the document once by [`attach`] and then
/// referenced from each page that receives text.
///
/// [`attach`]: PdfPageOverlay::attach
#[derive(Debug, Clone, Copy)]
pub struct PdfPageOverlay {
    font_id: ObjectId,
    font: StandardFont,
    font_size: f32,
}

impl PdfPageOverlay {
    pub fn attach(doc: &mut Document, font: StandardFont, font_size: f32) -> Self {
        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(font.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        Self {
            font_id,
            font,
            font_size,
        }
    }

    pub fn font(&self) -> StandardFont {
        self.font
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Width of `text` in points at the overlay's font and size.
    pub fn text_width(&self, text: &str) -> f32 {
        self.font.text_width(text, self.font_size)
    }

    /// Draw `text` with its baseline starting at (`x`, `y`) in page space.
    pub fn draw_text(
        &self,
        doc: &mut Document,
        page: &PdfPage,
        text: &str,
        x: f32,
        y: f32,
    ) -> Result<(), PdfError> {
        let resources = self.resources_with_font(doc, page.id);
        let existing = existing_contents(doc, page.id)?;

        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = doc.add_object(Stream::new(
            Dictionary::new(),
            self.overlay_stream(text, x, y)?,
        ));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));

        let dict = doc
            .get_dictionary_mut(page.id)
            .map_err(|e| PdfError::Malformed(format!("page {:?}: {e}", page.id)))?;
        dict.set("Resources", Object::Dictionary(resources));
        dict.set("Contents", Object::Array(contents));
        Ok(())
    }

    /// `Q` closing the original content, then the text object.
    fn overlay_stream(&self, text: &str, x: f32, y: f32) -> Result<Vec<u8>, PdfError> {
        let content = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(OVERLAY_FONT_RESOURCE.as_bytes().to_vec()),
                        self.font_size.into(),
                    ],
                ),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(self.font.encode(text), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PdfError::Malformed(format!("overlay content: {e}")))?;
        // Preceding streams may end mid-line.
        let mut bytes = b"\n".to_vec();
        bytes.extend(encoded);
        Ok(bytes)
    }

    /// The page's effective resources, inlined, with the overlay font added.
    fn resources_with_font(&self, doc: &Document, page_id: ObjectId) -> Dictionary {
        let mut resources = inherited_attribute(doc, page_id, b"Resources")
            .and_then(|value| resolve(doc, &value).as_dict().ok().cloned())
            .unwrap_or_default();

        let mut fonts = resources
            .get(b"Font")
            .ok()
            .and_then(|value| resolve(doc, value).as_dict().ok().cloned())
            .unwrap_or_default();
        fonts.set(OVERLAY_FONT_RESOURCE, Object::Reference(self.font_id));
        resources.set("Font", Object::Dictionary(fonts));
        resources
    }
}

/// The page's content streams as a list of references, in drawing order.
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, PdfError> {
    let dict = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfError::Malformed(format!("page {page_id:?}: {e}")))?;
    let contents = match dict.get(b"Contents") {
        Ok(value) => value,
        Err(_) => return Ok(Vec::new()),
    };
    match contents {
        Object::Array(items) => Ok(items.clone()),
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => Ok(items.clone()),
            _ => Ok(vec![Object::Reference(*id)]),
        },
        other => Err(PdfError::Malformed(format!(
            "page {page_id:?} has unusable /Contents: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::test_support::{sample_pdf, shown_strings};
    use crate::pdf::PdfDocument;

    #[test]
    fn overlay_text_follows_original_content() {
        let mut doc = PdfDocument::from_lopdf(sample_pdf(&["body"], 612, 792));
        let page = doc.pages().unwrap()[0];

        let overlay = PdfPageOverlay::attach(doc.inner_mut(), StandardFont::Helvetica, 9.0);
        overlay
            .draw_text(doc.inner_mut(), &page, "footer", 10.0, 22.0)
            .unwrap();

        assert_eq!(shown_strings(doc.inner(), page.id), vec!["body", "footer"]);
    }

    #[test]
    fn original_graphics_state_is_isolated() {
        let mut doc = PdfDocument::from_lopdf(sample_pdf(&["body"], 612, 792));
        let page = doc.pages().unwrap()[0];
        let overlay = PdfPageOverlay::attach(doc.inner_mut(), StandardFont::Helvetica, 9.0);
        overlay
            .draw_text(doc.inner_mut(), &page, "footer", 10.0, 22.0)
            .unwrap();

        let bytes = doc.page_content(&page).unwrap();
        let ops = Content::decode(&bytes).unwrap().operations;
        assert_eq!(ops.first().map(|o| o.operator.as_str()), Some("q"));
        let q_close = ops.iter().position(|o| o.operator == "Q").unwrap();
        let body = ops.iter().position(|o| o.operator == "Tj").unwrap();
        assert!(body < q_close, "original content must sit inside q … Q");
    }

    #[test]
    fn inherited_fonts_are_kept_alongside_overlay_font() {
        let mut doc = PdfDocument::from_lopdf(sample_pdf(&["body"], 612, 792));
        let page = doc.pages().unwrap()[0];
        let overlay = PdfPageOverlay::attach(doc.inner_mut(), StandardFont::Courier, 9.0);
        overlay
            .draw_text(doc.inner_mut(), &page, "x", 0.0, 0.0)
            .unwrap();

        let dict = doc.inner().get_dictionary(page.id).unwrap();
        let fonts = dict
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(OVERLAY_FONT_RESOURCE.as_bytes()));
    }

    #[test]
    fn text_width_uses_font_metrics() {
        let mut raw = sample_pdf(&["a"], 612, 792);
        let overlay = PdfPageOverlay::attach(&mut raw, StandardFont::Courier, 10.0);
        assert!((overlay.text_width("abc") - 18.0).abs() < 1e-4);
    }
}
