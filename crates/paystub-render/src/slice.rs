use crate::error::{RenderError, Result};
use image::{DynamicImage, ImageFormat, RgbaImage, imageops};
use paystub_core::PageDescriptor;
use std::io::Cursor;

/// One page's slice of the source bitmap, encoded for embedding
#[derive(Debug, Clone)]
pub struct PageImage {
    /// PNG-encoded RGB rows
    pub png_bytes: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Drawn size on the page, in points
    pub target_width: f32,
    pub target_height: f32,
}

/// Copy the rows `page` names out of `source` and encode them as PNG.
///
/// The slice keeps the full source width.
pub fn crop_page(source: &RgbaImage, page: &PageDescriptor) -> Result<PageImage> {
    let end = page.source_end();
    if page.slice_height == 0 || end > source.height() {
        return Err(RenderError::SliceOutOfBounds {
            offset: page.source_offset,
            end,
            source_height: source.height(),
        });
    }

    let width = source.width();
    let rows = imageops::crop_imm(source, 0, page.source_offset, width, page.slice_height).to_image();

    // The document writer has no use for alpha once the bitmap is flattened
    let rgb = DynamicImage::ImageRgba8(rows).to_rgb8();
    let mut png_bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;

    log::trace!(
        "Page {}: rows {}..{} -> {} bytes",
        page.page_index + 1,
        page.source_offset,
        end,
        png_bytes.len()
    );

    Ok(PageImage {
        png_bytes,
        pixel_width: width,
        pixel_height: page.slice_height,
        target_width: page.target_width,
        target_height: page.target_height,
    })
}
