use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug)]
pub enum StubError {
    #[error(
        "Invalid dimensions: source {source_width}x{source_height}px onto page {page_width}x{page_height}pt"
    )]
    InvalidDimensions {
        source_width: u32,
        source_height: u32,
        page_width: f32,
        page_height: f32,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StubError>;

/// Billable work categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    PhotoCapture,
    EstimateWriting,
    NadaResearch,
    SalvageBid,
    CccProfile,
    PhotoRenaming,
    Bookkeeping,
    OfficeAdministration,
    Others,
}

impl Category {
    /// Every category, in menu order
    pub const ALL: [Category; 9] = [
        Category::PhotoCapture,
        Category::EstimateWriting,
        Category::NadaResearch,
        Category::SalvageBid,
        Category::CccProfile,
        Category::PhotoRenaming,
        Category::Bookkeeping,
        Category::OfficeAdministration,
        Category::Others,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::PhotoCapture => "Photo Capture",
            Category::EstimateWriting => "Estimate Writing",
            Category::NadaResearch => "NADA Research",
            Category::SalvageBid => "Salvage Bid",
            Category::CccProfile => "CCC Profile",
            Category::PhotoRenaming => "Photo Renaming",
            Category::Bookkeeping => "Bookkeeping",
            Category::OfficeAdministration => "Office Administration",
            Category::Others => "Others",
        }
    }

    /// Whether the default mileage policy reimburses miles logged under this category
    pub fn is_mileage_eligible(self) -> bool {
        self == crate::constants::MILEAGE_CATEGORY
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = StubError;

    /// Accepts the display label or its dashed form ("photo-capture"), ignoring case
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| {
                let label = category.label();
                label.eq_ignore_ascii_case(wanted)
                    || label.replace(' ', "-").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| StubError::UnknownCategory(wanted.to_string()))
    }
}

/// How the contractor was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PaymentMethod {
    Check,
    Venmo,
    Zelle,
    Lemfi,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Check => "Check",
            PaymentMethod::Venmo => "Venmo",
            PaymentMethod::Zelle => "Zelle",
            PaymentMethod::Lemfi => "Lemfi",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = StubError;

    fn from_str(s: &str) -> Result<Self> {
        [
            PaymentMethod::Check,
            PaymentMethod::Venmo,
            PaymentMethod::Zelle,
            PaymentMethod::Lemfi,
        ]
        .into_iter()
        .find(|method| method.label().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| StubError::Config(format!("Unknown payment method: {}", s.trim())))
    }
}

static NEXT_ITEM_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Opaque, immutable handle for one line item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct LineItemId(String);

impl LineItemId {
    /// Mint an id that is never handed out twice in this process
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let sequence = NEXT_ITEM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{}", to_base36(millis), to_base36(sequence)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LineItemId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Parse a form-style numeric field.
///
/// Blank or non-numeric input yields `None`, which every consumer treats as 0.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// One billable entry on a pay stub
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineItem {
    #[cfg_attr(feature = "serde", serde(default = "LineItemId::generate"))]
    pub id: LineItemId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: Category,
    /// Blank when `None`
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "serde_impls::lenient_amount")
    )]
    pub quantity: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "serde_impls::lenient_amount")
    )]
    pub rate: Option<f64>,
    /// Only reimbursed for the mileage-eligible category
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "serde_impls::lenient_amount")
    )]
    pub miles: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub note: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub date: Option<NaiveDate>,
}

impl LineItem {
    /// A fresh item with the defaults used when an operator clicks "add"
    pub fn new(category: Category) -> Self {
        Self {
            id: LineItemId::generate(),
            category,
            quantity: Some(1.0),
            rate: Some(0.0),
            miles: Some(0.0),
            note: String::new(),
            date: None,
        }
    }

    /// An item whose numeric fields are all blank
    pub fn blank(category: Category) -> Self {
        Self {
            id: LineItemId::generate(),
            category,
            quantity: None,
            rate: None,
            miles: None,
            note: String::new(),
            date: None,
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_miles(mut self, miles: f64) -> Self {
        self.miles = Some(miles);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn quantity_or_zero(&self) -> f64 {
        or_zero(self.quantity)
    }

    pub fn rate_or_zero(&self) -> f64 {
        or_zero(self.rate)
    }

    pub fn miles_or_zero(&self) -> f64 {
        or_zero(self.miles)
    }

    /// Quantity times rate, before any mileage
    pub fn amount(&self) -> f64 {
        self.quantity_or_zero() * self.rate_or_zero()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contractor {
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub email: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PayPeriod {
    #[cfg_attr(feature = "serde", serde(default))]
    pub start: Option<NaiveDate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end: Option<NaiveDate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pay_date: Option<NaiveDate>,
}

/// Derived pay stub totals, unrounded
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// Sum of quantity × rate
    pub earnings: f64,
    /// Mileage reimbursement
    pub mileage: f64,
    /// Earnings plus mileage
    pub net: f64,
}

/// Format a dollar amount to cents for display
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Portrait dimensions in millimeters
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    pub fn page_size(self) -> PageSize {
        let (w, h) = self.dimensions_mm();
        PageSize {
            width: crate::constants::mm_to_pt(w),
            height: crate::constants::mm_to_pt(h),
        }
    }
}

/// Output page size in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// One output page: which rows of the source bitmap it shows and how large they are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDescriptor {
    /// Zero-based page number
    pub page_index: usize,
    /// First source row on this page
    pub source_offset: u32,
    /// Number of source rows on this page (always at least 1)
    pub slice_height: u32,
    /// Drawn width on the page, in points
    pub target_width: f32,
    /// Drawn height on the page, in points
    pub target_height: f32,
}

impl PageDescriptor {
    /// One past the last source row on this page
    pub fn source_end(&self) -> u32 {
        self.source_offset + self.slice_height
    }
}

/// Summary of how a bitmap will be split into pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationStatistics {
    /// Points per source pixel, identical on every page
    pub scale: f64,
    /// Source rows per full page
    pub slice_height_px: u32,
    pub page_count: usize,
    /// Source rows on the final page
    pub last_slice_height: u32,
    /// The whole source fit on one page
    pub single_page: bool,
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for Category {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.label())
        }
    }

    impl<'de> Deserialize<'de> for Category {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        }
    }

    /// Numbers pass through; strings go through `parse_amount`; null is blank
    pub(super) fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Option<f64>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number, a numeric string, or null")
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Self::Value, E> {
                Ok(Some(value).filter(|v| v.is_finite()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
                Ok(Some(value as f64))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
                Ok(Some(value as f64))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
                Ok(parse_amount(value))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D2>(self, deserializer: D2) -> std::result::Result<Self::Value, D2::Error>
            where
                D2: Deserializer<'de>,
            {
                deserializer.deserialize_any(AmountVisitor)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
