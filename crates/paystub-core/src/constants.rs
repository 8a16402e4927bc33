//! Shared constants for pay stub generation
//!
//! Rates, page geometry and naming fallbacks used across the workspace.

use crate::types::Category;

// =============================================================================
// Mileage
// =============================================================================

/// Reimbursement per mile, in dollars
pub const MILE_RATE: f64 = 0.2;

/// The one category whose line items earn mileage reimbursement
pub const MILEAGE_CATEGORY: Category = Category::PhotoCapture;

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

// =============================================================================
// Rasterization
// =============================================================================

/// Pixels per point when rasterizing the laid-out stub
pub const DEFAULT_RASTER_SCALE: f32 = 2.0;

/// Opaque white
pub const DEFAULT_BACKGROUND: [u8; 4] = [255, 255, 255, 255];

/// Contact block printed above every stub unless configured otherwise
pub const DEFAULT_ISSUER_LINES: [&str; 3] = [
    "adjuster@dollcappraisals.com",
    "(502) 422-1901",
    "P O Box 112, Bloomfield, KY 40008-0112",
];

// =============================================================================
// Output Naming
// =============================================================================

/// Extension of the exported document
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// Used when the contractor name sanitizes to nothing
pub const FALLBACK_CONTRACTOR_NAME: &str = "contractor";

/// Used when neither a period end nor a pay date is known
pub const FALLBACK_PERIOD_LABEL: &str = "pay";
