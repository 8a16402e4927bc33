use crate::constants::{DEFAULT_BACKGROUND, DEFAULT_ISSUER_LINES, DEFAULT_RASTER_SCALE};
use crate::totals::MileagePolicy;
use crate::types::*;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Export configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct StubOptions {
    // Output pages
    pub paper_size: PaperSize,

    // Rasterization
    pub raster_scale: f32,
    pub background: [u8; 4],

    // Mileage
    pub mileage: MileagePolicy,

    // Issuer contact block printed above the stub
    pub issuer_lines: Vec<String>,

    // Image drawn at the top of the card
    pub logo: Option<PathBuf>,

    // Where exported documents are written
    pub output_dir: PathBuf,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            raster_scale: DEFAULT_RASTER_SCALE,
            background: DEFAULT_BACKGROUND,
            mileage: MileagePolicy::default(),
            issuer_lines: DEFAULT_ISSUER_LINES.iter().map(|line| line.to_string()).collect(),
            logo: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl StubOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| StubError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StubError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Output page size in points
    pub fn page_size(&self) -> PageSize {
        self.paper_size.page_size()
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        let (width_mm, height_mm) = self.paper_size.dimensions_mm();
        if !(width_mm.is_finite() && width_mm > 0.0 && height_mm.is_finite() && height_mm > 0.0) {
            return Err(StubError::Config(format!(
                "Paper size must be positive, got {width_mm}×{height_mm}mm"
            )));
        }

        if !(self.raster_scale.is_finite() && self.raster_scale > 0.0) {
            return Err(StubError::Config(format!(
                "Raster scale must be positive, got {}",
                self.raster_scale
            )));
        }

        if !(self.mileage.rate.is_finite() && self.mileage.rate >= 0.0) {
            return Err(StubError::Config(format!(
                "Mileage rate must be zero or more, got {}",
                self.mileage.rate
            )));
        }

        Ok(())
    }
}
