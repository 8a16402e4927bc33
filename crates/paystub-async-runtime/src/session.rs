use crate::guard::ExportGuard;
use crate::{StubCommand, StubUpdate};
use paystub_core::{
    Category, Contractor, ItemList, LineItem, LineItemId, PayPeriod, PayStub, PaymentMethod,
    StubOptions, Totals,
};
use paystub_render::ExportReport;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Front-end state for the stub being edited.
///
/// Edits go through the immutable `ItemList` operations and swap the list
/// in place. Long-running work is sent to the worker as `StubCommand`s and
/// comes back through [`StubSession::apply_update`].
pub struct StubSession {
    stub: PayStub,
    options: StubOptions,
    command_tx: mpsc::UnboundedSender<StubCommand>,
    guard: ExportGuard,
    export_pending: bool,
    last_export: Option<ExportReport>,
    status: Option<String>,
}

impl StubSession {
    pub fn new(
        command_tx: mpsc::UnboundedSender<StubCommand>,
        guard: ExportGuard,
        options: StubOptions,
    ) -> Self {
        Self {
            stub: PayStub::default(),
            options,
            command_tx,
            guard,
            export_pending: false,
            last_export: None,
            status: None,
        }
    }

    pub fn stub(&self) -> &PayStub {
        &self.stub
    }

    pub fn options(&self) -> &StubOptions {
        &self.options
    }

    pub fn items(&self) -> &ItemList {
        &self.stub.items
    }

    pub fn last_export(&self) -> Option<&ExportReport> {
        self.last_export.as_ref()
    }

    /// Latest progress or error message
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_contractor(&mut self, contractor: Contractor) {
        self.stub.contractor = contractor;
    }

    pub fn set_period(&mut self, period: PayPeriod) {
        self.stub.period = period;
    }

    pub fn set_paid_via(&mut self, method: Option<PaymentMethod>) {
        self.stub.paid_via = method;
    }

    pub fn set_options(&mut self, options: StubOptions) {
        self.options = options;
    }

    /// Append a default item and return its id
    pub fn add_item(&mut self, category: Category) -> LineItemId {
        let (items, id) = self.stub.items.with_new_item(category);
        self.stub.items = items;
        id
    }

    pub fn push_item(&mut self, item: LineItem) {
        self.stub.items = self.stub.items.with_item(item);
    }

    pub fn update_item(&mut self, id: &LineItemId, edit: impl FnOnce(&mut LineItem)) {
        self.stub.items = self.stub.items.updating(id, edit);
    }

    pub fn replace_item(&mut self, id: &LineItemId, item: LineItem) {
        self.stub.items = self.stub.items.replacing(id, item);
    }

    pub fn remove_item(&mut self, id: &LineItemId) {
        self.stub.items = self.stub.items.without(id);
    }

    pub fn totals(&self) -> Totals {
        self.stub.totals(&self.options.mileage)
    }

    pub fn export_in_flight(&self) -> bool {
        self.export_pending || self.guard.is_busy()
    }

    /// Ask the worker to export the stub as it is right now.
    ///
    /// Returns `false` and does nothing while an earlier export is still
    /// running. `output_dir` defaults to the configured one.
    pub fn request_export(&mut self, output_dir: Option<PathBuf>) -> bool {
        if self.export_in_flight() {
            log::debug!("Export already in flight, ignoring request");
            return false;
        }

        let command = StubCommand::Export {
            stub: self.stub.clone(),
            options: self.options.clone(),
            output_dir: output_dir.unwrap_or_else(|| self.options.output_dir.clone()),
        };
        if self.command_tx.send(command).is_err() {
            self.status = Some("Worker is not running".to_string());
            return false;
        }

        self.export_pending = true;
        true
    }

    pub fn request_load_stub(&self, path: PathBuf) -> bool {
        self.command_tx.send(StubCommand::LoadStub { path }).is_ok()
    }

    pub fn request_save_stub(&self, path: PathBuf) -> bool {
        self.command_tx
            .send(StubCommand::SaveStub {
                stub: self.stub.clone(),
                path,
            })
            .is_ok()
    }

    pub fn request_load_items_csv(&self, path: PathBuf) -> bool {
        self.command_tx.send(StubCommand::LoadItemsCsv { path }).is_ok()
    }

    pub fn request_load_options(&self, path: PathBuf) -> bool {
        self.command_tx.send(StubCommand::LoadOptions { path }).is_ok()
    }

    /// Fold a worker update into the session
    pub fn apply_update(&mut self, update: StubUpdate) {
        if update.finishes_export() {
            self.export_pending = false;
        }

        match update {
            StubUpdate::Progress {
                operation,
                current,
                total,
            } => {
                self.status = Some(format!("{operation} ({current}/{total})"));
            }
            StubUpdate::StubLoaded { stub } => {
                self.stub = stub;
                self.status = Some("Stub loaded".to_string());
            }
            StubUpdate::StubSaved { path } => {
                self.status = Some(format!("Saved {}", path.display()));
            }
            StubUpdate::ItemsLoaded { items } => {
                self.status = Some(format!("Loaded {} line items", items.len()));
                self.stub.items = items;
            }
            StubUpdate::OptionsLoaded { options } => {
                self.options = options;
                self.status = Some("Options loaded".to_string());
            }
            StubUpdate::ExportComplete { report } => {
                self.status = Some(format!("Exported {}", report.path.display()));
                self.last_export = Some(report);
            }
            StubUpdate::ExportSkipped => {}
            StubUpdate::ExportFailed { message } | StubUpdate::Error { message } => {
                log::error!("{message}");
                self.status = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (StubSession, mpsc::UnboundedReceiver<StubCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            StubSession::new(tx, ExportGuard::new(), StubOptions::default()),
            rx,
        )
    }

    #[test]
    fn test_item_edits_keep_order() {
        let (mut session, _rx) = session();
        let first = session.add_item(Category::PhotoCapture);
        let second = session.add_item(Category::Bookkeeping);

        session.update_item(&first, |item| {
            item.quantity = Some(1.0);
            item.rate = Some(5.0);
            item.miles = Some(30.0);
        });
        session.update_item(&second, |item| {
            item.quantity = Some(2.0);
            item.rate = Some(10.0);
        });

        let ids: Vec<_> = session.items().iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids, vec![first.clone(), second.clone()]);

        let totals = session.totals();
        assert!((totals.net - 31.0).abs() < 1e-9);

        session.remove_item(&first);
        assert_eq!(session.items().len(), 1);
        assert!((session.totals().mileage).abs() < 1e-12);
    }

    #[test]
    fn test_second_export_request_is_a_no_op() {
        let (mut session, mut rx) = session();
        session.add_item(Category::Others);

        assert!(session.request_export(None));
        assert!(!session.request_export(None));
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_export_snapshot_ignores_later_edits() {
        let (mut session, mut rx) = session();
        let id = session.add_item(Category::Bookkeeping);
        session.update_item(&id, |item| item.rate = Some(10.0));
        assert!(session.request_export(Some(PathBuf::from("out"))));

        session.update_item(&id, |item| item.rate = Some(99.0));

        match rx.try_recv() {
            Ok(StubCommand::Export {
                stub, output_dir, ..
            }) => {
                assert_eq!(stub.items.get(&id).and_then(|item| item.rate), Some(10.0));
                assert_eq!(output_dir, PathBuf::from("out"));
            }
            other => panic!("Expected export command, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_export_allows_retry_and_keeps_items() {
        let (mut session, _rx) = session();
        let id = session.add_item(Category::PhotoCapture);
        let before = session.items().clone();

        assert!(session.request_export(None));
        session.apply_update(StubUpdate::ExportFailed {
            message: "renderer crashed".to_string(),
        });

        assert_eq!(session.items(), &before);
        assert!(session.items().contains(&id));
        assert_eq!(session.status(), Some("renderer crashed"));
        assert!(session.request_export(None));
    }

    #[test]
    fn test_progress_does_not_end_export() {
        let (mut session, _rx) = session();
        assert!(session.request_export(None));
        session.apply_update(StubUpdate::Progress {
            operation: "Rasterizing".to_string(),
            current: 2,
            total: 6,
        });
        assert!(session.export_in_flight());
        assert_eq!(session.status(), Some("Rasterizing (2/6)"));
    }

    #[test]
    fn test_busy_guard_blocks_requests() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let guard = ExportGuard::new();
        let mut session = StubSession::new(tx, guard.clone(), StubOptions::default());

        let ticket = guard.try_acquire();
        assert!(!session.request_export(None));
        drop(ticket);
        assert!(session.request_export(None));
        assert!(rx.try_recv().is_ok());
    }
}
