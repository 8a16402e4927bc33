use std::path::PathBuf;

mod guard;
mod logger;
mod session;
mod worker;

pub use guard::{ExportGuard, ExportTicket};
pub use logger::{AppLogger, LogEntry};
pub use session::StubSession;
pub use worker::{ExportBackend, worker_task};

// Re-export types from library crates
pub use paystub_core::{ItemList, LineItem, LineItemId, PayStub, StubOptions, Totals};
pub use paystub_render::{ExportReport, ExportStage};

/// Commands sent from the front end to the worker
#[derive(Debug)]
pub enum StubCommand {
    LoadStub {
        path: PathBuf,
    },
    SaveStub {
        stub: PayStub,
        path: PathBuf,
    },
    /// Read line items from a CSV sheet
    LoadItemsCsv {
        path: PathBuf,
    },
    LoadOptions {
        path: PathBuf,
    },
    Export {
        /// Snapshot taken when the export was requested
        stub: PayStub,
        options: StubOptions,
        output_dir: PathBuf,
    },
}

/// Updates sent from the worker to the front end
#[derive(Debug, Clone)]
pub enum StubUpdate {
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    StubLoaded {
        stub: PayStub,
    },
    StubSaved {
        path: PathBuf,
    },
    ItemsLoaded {
        items: ItemList,
    },
    OptionsLoaded {
        options: StubOptions,
    },
    ExportComplete {
        report: ExportReport,
    },
    /// An export was asked for while another was running and was dropped
    ExportSkipped,
    ExportFailed {
        message: String,
    },
    Error {
        message: String,
    },
}

impl StubUpdate {
    /// Does this update end an export, one way or another
    pub fn finishes_export(&self) -> bool {
        matches!(
            self,
            StubUpdate::ExportComplete { .. }
                | StubUpdate::ExportSkipped
                | StubUpdate::ExportFailed { .. }
        )
    }
}
