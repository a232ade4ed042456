//! Stamp a running "Page N of M" footer onto every page.

use super::document::PdfDocument;
use super::overlay::PdfPageOverlay;
use crate::config::FooterSpec;
use crate::error::RenumberError;
use tracing::debug;

/// Distance in points the footer baseline sits below `bottom_margin`.
pub const FOOTER_BASELINE_OFFSET: f32 = 8.0;

/// Applies [`FooterSpec`] lines to a whole document.
#[derive(Debug, Default, Clone, Copy)]
pub struct FooterRenumberer;

impl FooterRenumberer {
    /// Number every page of `doc`, in page order.
    ///
    /// Page `i` (0-based) shows `start_page + i` out of the document's total
    /// page count, centred horizontally on that page's own media box.
    pub fn renumber(doc: PdfDocument, spec: &FooterSpec) -> Result<PdfDocument, RenumberError> {
        let mut doc = doc;
        let pages = doc.pages().map_err(|e| RenumberError::Document {
            detail: e.to_string(),
        })?;
        let total = pages.len();
        let overlay = PdfPageOverlay::attach(doc.inner_mut(), spec.font, spec.font_size);

        for (i, page) in pages.iter().enumerate() {
            let line = spec.line(spec.start_page + i, total);
            let width = overlay.text_width(&line);
            let x = page.media_box.x0 + (page.media_box.width() - width) / 2.0;
            let y = page.media_box.y0 + spec.bottom_margin - FOOTER_BASELINE_OFFSET;
            overlay
                .draw_text(doc.inner_mut(), page, &line, x, y)
                .map_err(|e| RenumberError::Overlay {
                    page: i + 1,
                    detail: e.to_string(),
                })?;
        }

        debug!("Numbered {total} pages");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::test_support::{sample_pdf, shown_strings};
    use crate::pdf::StandardFont;
    use lopdf::content::Content;
    use lopdf::Object;

    fn spec(text: &str) -> FooterSpec {
        FooterSpec {
            text: text.into(),
            ..FooterSpec::default()
        }
    }

    fn footers(doc: &PdfDocument) -> Vec<String> {
        doc.pages()
            .unwrap()
            .iter()
            .filter_map(|p| shown_strings(doc.inner(), p.id).pop())
            .collect()
    }

    #[test]
    fn every_page_gets_its_number() {
        let doc = PdfDocument::from_lopdf(sample_pdf(&["a", "b", "c"], 612, 792));
        let numbered = FooterRenumberer::renumber(doc, &spec("Docs")).unwrap();
        assert_eq!(numbered.page_count(), 3);
        assert_eq!(
            footers(&numbered),
            vec![
                "Docs - Page 1 of 3",
                "Docs - Page 2 of 3",
                "Docs - Page 3 of 3"
            ]
        );
    }

    #[test]
    fn start_page_offsets_numbers_not_total() {
        let doc = PdfDocument::from_lopdf(sample_pdf(&["a", "b"], 612, 792));
        let footer = FooterSpec {
            start_page: 5,
            ..spec("X")
        };
        let numbered = FooterRenumberer::renumber(doc, &footer).unwrap();
        assert_eq!(footers(&numbered), vec!["X - Page 5 of 2", "X - Page 6 of 2"]);
    }

    #[test]
    fn footer_is_centred_at_fixed_offset() {
        let doc = PdfDocument::from_lopdf(sample_pdf(&["a"], 600, 800));
        let footer = spec("T");
        let numbered = FooterRenumberer::renumber(doc, &footer).unwrap();
        let page = numbered.pages().unwrap()[0];

        let ops = Content::decode(&numbered.page_content(&page).unwrap())
            .unwrap()
            .operations;
        let td = ops.iter().rev().find(|o| o.operator == "Td").unwrap();
        let coords: Vec<f32> = td
            .operands
            .iter()
            .map(|o| match o {
                Object::Real(r) => *r as f32,
                Object::Integer(i) => *i as f32,
                other => panic!("unexpected operand {other:?}"),
            })
            .collect();

        let width = StandardFont::Helvetica.text_width("T - Page 1 of 1", footer.font_size);
        assert!((coords[0] - (600.0 - width) / 2.0).abs() < 0.01);
        assert!((coords[1] - (footer.bottom_margin - FOOTER_BASELINE_OFFSET)).abs() < 0.01);
    }

    #[test]
    fn renumbering_twice_keeps_page_count() {
        let doc = PdfDocument::from_lopdf(sample_pdf(&["a", "b"], 612, 792));
        let once = FooterRenumberer::renumber(doc, &spec("A")).unwrap();
        let twice = FooterRenumberer::renumber(once, &spec("A")).unwrap();
        assert_eq!(twice.page_count(), 2);
        assert_eq!(footers(&twice), vec!["A - Page 1 of 2", "A - Page 2 of 2"]);
    }

    #[test]
    fn output_is_deterministic() {
        let a = FooterRenumberer::renumber(
            PdfDocument::from_lopdf(sample_pdf(&["a"], 612, 792)),
            &spec("D"),
        );
        let b = FooterRenumberer::renumber(
            PdfDocument::from_lopdf(sample_pdf(&["a"], 612, 792)),
            &spec("D"),
        );
        assert_eq!(
            a.unwrap().to_bytes().unwrap(),
            b.unwrap().to_bytes().unwrap()
        );
    }
}
