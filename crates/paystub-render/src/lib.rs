//! Pay stub rendering: layout, rasterization seams, page slicing and PDF output

mod error;
mod export;
mod layout;
mod rasterize;
mod slice;
mod writer;

pub use error::{RenderError, Result};
pub use export::{ExportReport, ExportStage, export_pay_stub};
pub use layout::{StubSurface, layout_pay_stub};
#[cfg(feature = "pdfium")]
pub use rasterize::PdfiumRasterizer;
pub use rasterize::{ImageFileRasterizer, RasterOptions, SurfaceRasterizer};
pub use slice::{PageImage, crop_page};
pub use writer::{DocumentWriter, PrintPdfWriter};
