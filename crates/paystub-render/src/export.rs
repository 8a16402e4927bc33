//! Pay stub export
//!
//! Lay out, rasterize, slice into pages, write, save. The stub is cloned up
//! front so the bitmap and the totals always describe the same items.

use crate::error::Result;
use crate::layout::layout_pay_stub;
use crate::rasterize::{RasterOptions, SurfaceRasterizer};
use crate::slice::{PageImage, crop_page};
use crate::writer::DocumentWriter;
use paystub_core::{PayStub, StubOptions, Totals, paginate};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where an export currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    LayingOut,
    Rasterizing,
    Paginating,
    /// About to encode page `page` of `total` (1-based)
    Slicing { page: usize, total: usize },
    Writing,
    Saving,
}

impl ExportStage {
    /// Rough position out of `ExportStage::STEPS`, for progress bars
    pub fn step(&self) -> usize {
        match self {
            ExportStage::LayingOut => 1,
            ExportStage::Rasterizing => 2,
            ExportStage::Paginating => 3,
            ExportStage::Slicing { .. } => 4,
            ExportStage::Writing => 5,
            ExportStage::Saving => 6,
        }
    }

    pub const STEPS: usize = 6;
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::LayingOut => write!(f, "Laying out stub"),
            ExportStage::Rasterizing => write!(f, "Rasterizing"),
            ExportStage::Paginating => write!(f, "Paginating"),
            ExportStage::Slicing { page, total } => write!(f, "Slicing page {page}/{total}"),
            ExportStage::Writing => write!(f, "Writing document"),
            ExportStage::Saving => write!(f, "Saving"),
        }
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub page_count: usize,
    /// The totals printed on the stub
    pub totals: Totals,
    pub source_width: u32,
    pub source_height: u32,
}

/// Export `stub` as a paginated document in `output_dir`.
///
/// The file is named by [`PayStub::file_name`]. Nothing is written unless
/// every stage succeeds.
pub async fn export_pay_stub(
    stub: &PayStub,
    options: &StubOptions,
    rasterizer: Arc<dyn SurfaceRasterizer>,
    writer: Arc<dyn DocumentWriter>,
    output_dir: &Path,
    mut on_progress: impl FnMut(ExportStage) + Send,
) -> Result<ExportReport> {
    options.validate()?;

    let snapshot = stub.clone();
    let totals = snapshot.totals(&options.mileage);
    let page_size = options.page_size();

    on_progress(ExportStage::LayingOut);
    let logo = match &options.logo {
        Some(path) => match tokio::fs::read(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Skipping logo {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };
    let surface = layout_pay_stub(&snapshot, &totals, options, logo.as_deref())?;

    on_progress(ExportStage::Rasterizing);
    let raster_options = RasterOptions::from(options);
    let bitmap =
        tokio::task::spawn_blocking(move || rasterizer.rasterize(&surface, &raster_options))
            .await??;
    let (source_width, source_height) = bitmap.dimensions();
    log::debug!("Rasterized stub to {}x{} px", source_width, source_height);

    on_progress(ExportStage::Paginating);
    let pages = paginate(source_width, source_height, page_size.width, page_size.height)?;
    let page_count = pages.len();

    // Cropping and encoding is CPU-bound, keep it off the runtime threads
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let slicing = tokio::task::spawn_blocking(move || -> Result<Vec<PageImage>> {
        let mut images = Vec::with_capacity(pages.len());
        for page in &pages {
            let _ = progress_tx.send(page.page_index + 1);
            images.push(crop_page(&bitmap, page)?);
        }
        Ok(images)
    });
    while let Some(page) = progress_rx.recv().await {
        on_progress(ExportStage::Slicing {
            page,
            total: page_count,
        });
    }
    let page_images = slicing.await??;

    on_progress(ExportStage::Writing);
    let document =
        tokio::task::spawn_blocking(move || writer.write(&page_images, page_size)).await??;

    on_progress(ExportStage::Saving);
    let path = output_dir.join(snapshot.file_name());
    tokio::fs::write(&path, document).await?;

    log::info!(
        "Exported {} ({} page{}, net {})",
        path.display(),
        page_count,
        if page_count == 1 { "" } else { "s" },
        paystub_core::format_currency(totals.net)
    );

    Ok(ExportReport {
        path,
        page_count,
        totals,
        source_width,
        source_height,
    })
}
