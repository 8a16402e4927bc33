use crate::error::{RenderError, Result};
use crate::slice::PageImage;
use paystub_core::PageSize;
use printpdf::image::RawImage;
use printpdf::xobject::XObjectTransform;
use printpdf::{Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt};

/// Assembles page images into a finished document
pub trait DocumentWriter: Send + Sync {
    /// One output page per entry in `pages`, in order
    fn write(&self, pages: &[PageImage], page_size: PageSize) -> Result<Vec<u8>>;
}

/// Writes pages with printpdf, each image hung from the top edge of its page
#[derive(Debug, Clone)]
pub struct PrintPdfWriter {
    title: String,
}

impl PrintPdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

impl Default for PrintPdfWriter {
    fn default() -> Self {
        Self::new("Pay Stub")
    }
}

impl DocumentWriter for PrintPdfWriter {
    fn write(&self, pages: &[PageImage], page_size: PageSize) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(RenderError::Write("No pages to write".to_string()));
        }

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages = Vec::with_capacity(pages.len());
        let mut warnings = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            let raw = RawImage::decode_from_bytes(&page.png_bytes, &mut warnings).map_err(|e| {
                RenderError::Write(format!("Failed to embed page {}: {}", index + 1, e))
            })?;
            let xobject = doc.add_image(&raw);

            // PDF y runs upward; the slice hangs from the top edge
            let transform = XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(page_size.height - page.target_height)),
                scale_x: Some(page.target_width / page.pixel_width as f32),
                scale_y: Some(page.target_height / page.pixel_height as f32),
                rotate: None,
                dpi: Some(72.0),
            };

            pdf_pages.push(PdfPage::new(
                Mm::from(Pt(page_size.width)),
                Mm::from(Pt(page_size.height)),
                vec![Op::UseXobject {
                    id: xobject,
                    transform,
                }],
            ));
        }

        doc.pages = pdf_pages;
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            log::debug!("printpdf reported {} warnings", warnings.len());
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::crop_page;
    use image::{Rgba, RgbaImage};
    use paystub_core::PageDescriptor;

    fn page_image(rows: u32) -> PageImage {
        let source = RgbaImage::from_pixel(20, rows, Rgba([200, 10, 10, 255]));
        let descriptor = PageDescriptor {
            page_index: 0,
            source_offset: 0,
            slice_height: rows,
            target_width: 100.0,
            target_height: rows as f32 * 5.0,
        };
        crop_page(&source, &descriptor).unwrap()
    }

    #[test]
    fn test_writes_one_page_per_image() {
        let writer = PrintPdfWriter::default();
        let size = PageSize { width: 100.0, height: 200.0 };
        let bytes = writer.write(&[page_image(40), page_image(10)], size).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_no_pages_is_an_error() {
        let writer = PrintPdfWriter::default();
        let size = PageSize { width: 100.0, height: 200.0 };
        assert!(matches!(writer.write(&[], size), Err(RenderError::Write(_))));
    }
}
