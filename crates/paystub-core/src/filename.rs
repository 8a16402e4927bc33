use crate::constants::{DOCUMENT_EXTENSION, FALLBACK_CONTRACTOR_NAME, FALLBACK_PERIOD_LABEL};
use chrono::NaiveDate;

/// Make `raw` safe for use inside a file name.
///
/// Leading and trailing whitespace is dropped, each inner run of whitespace
/// becomes one `_`, then anything outside `[A-Za-z0-9._-]` is removed.
pub fn sanitize_file_component(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}

/// `{contractor}_stub_{period end, else pay date, else "pay"}.pdf`
pub fn output_file_name(
    contractor_name: &str,
    period_end: Option<NaiveDate>,
    pay_date: Option<NaiveDate>,
) -> String {
    let name = match sanitize_file_component(contractor_name) {
        name if name.is_empty() => FALLBACK_CONTRACTOR_NAME.to_string(),
        name => name,
    };
    let period = period_end
        .or(pay_date)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| FALLBACK_PERIOD_LABEL.to_string());

    format!("{name}_stub_{period}.{DOCUMENT_EXTENSION}")
}
