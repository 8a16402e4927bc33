pub mod constants;
mod filename;
mod import;
mod items;
mod options;
mod paginate;
mod stub;
mod totals;
mod types;

pub use filename::{output_file_name, sanitize_file_component};
pub use import::{load_items_from_csv, parse_items_csv};
pub use items::ItemList;
pub use options::StubOptions;
pub use paginate::{paginate, pagination_statistics};
pub use stub::PayStub;
pub use totals::{MileagePolicy, compute_totals, compute_totals_with};
pub use types::*;
