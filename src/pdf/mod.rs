//! # PDF Output
//!
//! The overlay for one row is written as a standalone one-page PDF by
//! [`PdfWriter`], then stamped onto the template page by [`compose`].
//!
//! The writer emits the raw bytes itself; the subset needed for a page of
//! text in standard fonts is small.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, content, page
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- points to the root object
//! %%EOF
//! ```

pub mod canvas;
pub mod compose;

pub use canvas::{OverlayPage, PageCanvas, PageSize};
pub use compose::TemplateDocument;

use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

const PRODUCER: &str = concat!("formletter ", env!("CARGO_PKG_VERSION"));

/// Serializes an overlay page to PDF bytes.
#[derive(Debug, Default)]
pub struct PdfWriter;

/// Objects in write order; object `n` is at index `n - 1`.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self { objects: Vec::new() }
    }

    /// Reserve an object id to be filled in later.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn add(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len()
    }

    fn set(&mut self, id: usize, data: Vec<u8>) {
        self.objects[id - 1] = data;
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `page` as a single-page PDF.
    ///
    /// The media box starts at the origin; placing the page on a template
    /// with a shifted media box is left to [`compose`].
    pub fn write(&self, page: &OverlayPage) -> Vec<u8> {
        let mut builder = PdfBuilder::new();
        let catalog_id = builder.reserve();
        let pages_id = builder.reserve();

        let font_ids: Vec<usize> = page
            .fonts
            .iter()
            .map(|font| {
                builder.add(
                    format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                        font.pdf_name()
                    )
                    .into_bytes(),
                )
            })
            .collect();

        let compressed = compress_to_vec_zlib(&page.content, 6);
        let mut content = Vec::with_capacity(compressed.len() + 64);
        let _ = write!(
            content,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed.len()
        );
        content.extend_from_slice(&compressed);
        content.extend_from_slice(b"\nendstream");
        let content_id = builder.add(content);

        let font_resources = font_ids
            .iter()
            .enumerate()
            .map(|(i, id)| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ");
        let size = page.size;
        let page_id = builder.add(
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                pages_id,
                size.width,
                size.height,
                content_id,
                font_resources
            )
            .into_bytes(),
        );

        builder.set(
            catalog_id,
            format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes(),
        );
        builder.set(
            pages_id,
            format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", page_id).into_bytes(),
        );

        let info_id = builder.add(format!("<< /Producer ({}) >>", PRODUCER).into_bytes());

        serialize(&builder, catalog_id, info_id)
    }
}

fn serialize(builder: &PdfBuilder, root_id: usize, info_id: usize) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::new();
    let mut offsets = Vec::with_capacity(builder.objects.len());

    output.extend_from_slice(b"%PDF-1.7\n");
    output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    for (i, data) in builder.objects.iter().enumerate() {
        offsets.push(output.len());
        let _ = write!(output, "{} 0 obj\n", i + 1);
        output.extend_from_slice(data);
        output.extend_from_slice(b"\nendobj\n\n");
    }

    let size = builder.objects.len() + 1;
    let xref_offset = output.len();
    let _ = write!(output, "xref\n0 {}\n", size);
    let _ = write!(output, "0000000000 65535 f \n");
    for offset in &offsets {
        let _ = write!(output, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        output,
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
        size, root_id, info_id, xref_offset
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;
    use crate::render::Canvas;

    fn overlay(fonts: &[StandardFont]) -> OverlayPage {
        let mut canvas = PageCanvas::new(PageSize::LETTER);
        for font in fonts {
            canvas.set_font(*font, 12.0);
            canvas.draw_text(72.0, 720.0, "A");
        }
        canvas.finish()
    }

    #[test]
    fn test_empty_overlay_produces_valid_pdf() {
        let bytes = PdfWriter::new().write(&overlay(&[]));
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
    }

    #[test]
    fn test_producer_in_info() {
        let bytes = PdfWriter::new().write(&overlay(&[]));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Info 5 0 R"));
        assert!(text.contains("/Producer (formletter"));
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let bytes = PdfWriter::new().write(&overlay(&[
            StandardFont::Helvetica,
            StandardFont::HelveticaBold,
        ]));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica /Encoding"));
        assert!(text.contains("/BaseFont /Helvetica-Bold /Encoding"));
        assert!(text.contains("/F0 3 0 R /F1 4 0 R"));
    }

    #[test]
    fn test_output_loads_as_one_page() {
        let bytes = PdfWriter::new().write(&overlay(&[StandardFont::TimesRoman]));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
