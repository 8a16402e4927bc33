//! Line item import from CSV
//!
//! Columns are matched by header name (case-insensitive): `category`,
//! `quantity` (or `qty`), `rate`, `miles`, `note`, `date`. Missing columns
//! and blank cells are treated like empty form fields.

use crate::items::ItemList;
use crate::types::*;
use chrono::NaiveDate;
use std::path::Path;

pub async fn load_items_from_csv(path: impl AsRef<Path>) -> Result<ItemList> {
    let path = path.as_ref().to_owned();

    let contents = tokio::fs::read_to_string(&path).await?;

    tokio::task::spawn_blocking(move || parse_items_csv(&contents)).await?
}

/// Parse CSV text into line items, in row order
pub fn parse_items_csv(contents: &str) -> Result<ItemList> {
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let columns = Columns::locate(reader.headers()?);
    let mut items = Vec::new();

    for result in reader.records() {
        let record = result?;
        let cell = |index: Option<usize>| index.and_then(|i| record.get(i)).unwrap_or("");

        if record.iter().all(str::is_empty) {
            continue;
        }

        let category = match cell(columns.category) {
            "" => Category::default(),
            label => label.parse()?,
        };

        let date = match cell(columns.date) {
            "" => None,
            raw => {
                let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
                if parsed.is_none() {
                    log::warn!("Ignoring unreadable date {raw:?} on CSV line {}", items.len() + 2);
                }
                parsed
            }
        };

        items.push(LineItem {
            id: LineItemId::generate(),
            category,
            quantity: parse_amount(cell(columns.quantity)),
            rate: parse_amount(cell(columns.rate)),
            miles: parse_amount(cell(columns.miles)),
            note: cell(columns.note).to_string(),
            date,
        });
    }

    Ok(items.into_iter().collect())
}

#[derive(Debug, Default)]
struct Columns {
    category: Option<usize>,
    quantity: Option<usize>,
    rate: Option<usize>,
    miles: Option<usize>,
    note: Option<usize>,
    date: Option<usize>,
}

impl Columns {
    fn locate(headers: &::csv::StringRecord) -> Self {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|name| h.eq_ignore_ascii_case(name)))
        };

        Self {
            category: find(&["category"]),
            quantity: find(&["quantity", "qty"]),
            rate: find(&["rate"]),
            miles: find(&["miles", "mileage"]),
            note: find(&["note", "notes"]),
            date: find(&["date"]),
        }
    }
}
