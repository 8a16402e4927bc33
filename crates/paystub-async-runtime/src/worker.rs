use crate::guard::ExportGuard;
use crate::{StubCommand, StubUpdate};
use paystub_core::{PayStub, StubOptions, load_items_from_csv};
use paystub_render::{DocumentWriter, ExportStage, SurfaceRasterizer, export_pay_stub};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The collaborators an export runs through
#[derive(Clone)]
pub struct ExportBackend {
    pub rasterizer: Arc<dyn SurfaceRasterizer>,
    pub writer: Arc<dyn DocumentWriter>,
}

/// Async worker task that processes stub commands and sends updates
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<StubCommand>,
    update_tx: mpsc::UnboundedSender<StubUpdate>,
    backend: ExportBackend,
    guard: ExportGuard,
) {
    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &backend, &guard, &mut command_rx, &update_tx).await;
    }
    log::debug!("Command channel closed, worker exiting");
}

async fn process_command(
    cmd: StubCommand,
    backend: &ExportBackend,
    guard: &ExportGuard,
    command_rx: &mut mpsc::UnboundedReceiver<StubCommand>,
    update_tx: &mpsc::UnboundedSender<StubUpdate>,
) {
    match cmd {
        StubCommand::LoadStub { path } => match PayStub::load(&path).await {
            Ok(stub) => {
                let _ = update_tx.send(StubUpdate::StubLoaded { stub });
            }
            Err(e) => {
                let _ = update_tx.send(StubUpdate::Error {
                    message: format!("Failed to load stub: {e}"),
                });
            }
        },
        StubCommand::SaveStub { stub, path } => match stub.save(&path).await {
            Ok(()) => {
                let _ = update_tx.send(StubUpdate::StubSaved { path });
            }
            Err(e) => {
                let _ = update_tx.send(StubUpdate::Error {
                    message: format!("Failed to save stub: {e}"),
                });
            }
        },
        StubCommand::LoadItemsCsv { path } => match load_items_from_csv(&path).await {
            Ok(items) => {
                log::info!("Loaded {} line items from {}", items.len(), path.display());
                let _ = update_tx.send(StubUpdate::ItemsLoaded { items });
            }
            Err(e) => {
                let _ = update_tx.send(StubUpdate::Error {
                    message: format!("Failed to load CSV: {e}"),
                });
            }
        },
        StubCommand::LoadOptions { path } => match StubOptions::load(&path).await {
            Ok(options) => {
                let _ = update_tx.send(StubUpdate::OptionsLoaded { options });
            }
            Err(e) => {
                let _ = update_tx.send(StubUpdate::Error {
                    message: format!("Failed to load options: {e}"),
                });
            }
        },
        StubCommand::Export {
            stub,
            options,
            output_dir,
        } => {
            let deferred =
                handle_export(stub, options, output_dir, backend, guard, command_rx, update_tx)
                    .await;
            for next_cmd in deferred {
                Box::pin(process_command(next_cmd, backend, guard, command_rx, update_tx)).await;
            }
        }
    }
}

/// Discard exports queued behind the running one, handing back everything else in order
fn drain_queued_exports(
    command_rx: &mut mpsc::UnboundedReceiver<StubCommand>,
    update_tx: &mpsc::UnboundedSender<StubUpdate>,
) -> Vec<StubCommand> {
    let mut deferred = Vec::new();
    while let Ok(next_cmd) = command_rx.try_recv() {
        if let StubCommand::Export { .. } = next_cmd {
            log::debug!("Discarding export requested while another was running");
            let _ = update_tx.send(StubUpdate::ExportSkipped);
        } else {
            deferred.push(next_cmd);
        }
    }
    deferred
}

async fn handle_export(
    stub: PayStub,
    options: StubOptions,
    output_dir: PathBuf,
    backend: &ExportBackend,
    guard: &ExportGuard,
    command_rx: &mut mpsc::UnboundedReceiver<StubCommand>,
    update_tx: &mpsc::UnboundedSender<StubUpdate>,
) -> Vec<StubCommand> {
    let Some(ticket) = guard.try_acquire() else {
        log::debug!("Export already running, ignoring request");
        let _ = update_tx.send(StubUpdate::ExportSkipped);
        return Vec::new();
    };

    let progress = |stage: ExportStage| {
        let _ = update_tx.send(StubUpdate::Progress {
            operation: stage.to_string(),
            current: stage.step(),
            total: ExportStage::STEPS,
        });
    };

    let result = export_pay_stub(
        &stub,
        &options,
        Arc::clone(&backend.rasterizer),
        Arc::clone(&backend.writer),
        &output_dir,
        progress,
    )
    .await;

    // Only what arrived before the outcome goes out counts as mid-flight
    let deferred = drain_queued_exports(command_rx, update_tx);
    drop(ticket);

    match result {
        Ok(report) => {
            let _ = update_tx.send(StubUpdate::ExportComplete { report });
        }
        Err(e) => {
            log::warn!("Export failed: {e}");
            let _ = update_tx.send(StubUpdate::ExportFailed {
                message: format!("Failed to export pay stub: {e}"),
            });
        }
    }

    deferred
}
