//! Surface rasterizers
//!
//! A rasterizer turns a laid-out stub into one bitmap. How it does so is its
//! own business; the export only reads the bitmap's size and rows.

#[cfg(feature = "pdfium")]
use crate::error::RenderError;
use crate::error::Result;
use crate::layout::StubSurface;
use image::{Rgba, RgbaImage, imageops};
use paystub_core::StubOptions;
use std::path::PathBuf;

/// Rendering parameters handed to every rasterizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Pixels per point
    pub scale: f32,
    /// Color under transparent areas
    pub background: Rgba<u8>,
}

impl From<&StubOptions> for RasterOptions {
    fn from(options: &StubOptions) -> Self {
        Self {
            scale: options.raster_scale,
            background: Rgba(options.background),
        }
    }
}

/// Renders a laid-out stub into a single bitmap
pub trait SurfaceRasterizer: Send + Sync {
    fn rasterize(&self, surface: &StubSurface, options: &RasterOptions) -> Result<RgbaImage>;
}

/// Uses a document image that was rendered ahead of time, e.g. a browser capture.
///
/// The surface is ignored; only the background is applied.
#[derive(Debug, Clone)]
pub struct ImageFileRasterizer {
    path: PathBuf,
}

impl ImageFileRasterizer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SurfaceRasterizer for ImageFileRasterizer {
    fn rasterize(&self, _surface: &StubSurface, options: &RasterOptions) -> Result<RgbaImage> {
        let image = image::open(&self.path)?.to_rgba8();
        log::debug!(
            "Loaded pre-rendered stub {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );
        Ok(flatten_onto(image, options.background))
    }
}

/// Composite `image` over a solid `background`
pub(crate) fn flatten_onto(image: RgbaImage, background: Rgba<u8>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), background);
    imageops::overlay(&mut canvas, &image, 0, 0);
    canvas
}

/// Renders the laid-out PDF page through a pdfium shared library
#[cfg(feature = "pdfium")]
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

#[cfg(feature = "pdfium")]
impl PdfiumRasterizer {
    /// Look for pdfium in `library_dir` before the system search path
    pub fn with_library_dir(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(library_dir.into()),
        }
    }

    fn bind(&self) -> Result<pdfium_render::prelude::Pdfium> {
        use pdfium_render::prelude::*;

        if let Some(dir) = &self.library_dir {
            match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
                Ok(binding) => return Ok(Pdfium::new(binding)),
                Err(e) => log::warn!("No pdfium in {}: {}", dir.display(), e),
            }
        }

        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| RenderError::Rasterize(format!("Failed to load pdfium: {}", e)))
    }
}

#[cfg(feature = "pdfium")]
impl SurfaceRasterizer for PdfiumRasterizer {
    fn rasterize(&self, surface: &StubSurface, options: &RasterOptions) -> Result<RgbaImage> {
        use pdfium_render::prelude::*;

        let pdfium = self.bind()?;
        let rasterize_err = |e: PdfiumError| RenderError::Rasterize(e.to_string());

        let document = pdfium
            .load_pdf_from_byte_slice(&surface.pdf_bytes, None)
            .map_err(rasterize_err)?;
        let page = document.pages().get(0).map_err(rasterize_err)?;

        let [r, g, b, a] = options.background.0;
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(options.scale)
            .set_clear_color(PdfColor::new(r, g, b, a));

        let bitmap = page.render_with_config(&config).map_err(rasterize_err)?;
        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba_data = bitmap.as_rgba_bytes().to_vec();

        let image = RgbaImage::from_raw(width, height, rgba_data).ok_or_else(|| {
            RenderError::Rasterize(format!("pdfium returned a short {width}x{height} bitmap"))
        })?;
        Ok(flatten_onto(image, options.background))
    }
}
