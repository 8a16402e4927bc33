use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use paystub_async_runtime::{
    AppLogger, ExportBackend, ExportGuard, StubCommand, StubSession, StubUpdate, worker_task,
};
use paystub_core::{
    Category, Contractor, LineItem, PaperSize, PayPeriod, PayStub, PaymentMethod, StubOptions,
    format_currency, load_items_from_csv, pagination_statistics,
};
use paystub_render::{ImageFileRasterizer, PrintPdfWriter, SurfaceRasterizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "stub", about = "Contractor pay stub generator", version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print earnings, mileage and net pay
    Totals {
        /// Pay stub JSON file
        #[arg(short, long, required_unless_present = "csv")]
        stub: Option<PathBuf>,

        /// Line items CSV (columns: category, quantity, rate, miles, note, date)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Options JSON file
        #[arg(long)]
        options: Option<PathBuf>,
    },

    /// Show how a rendered stub of the given pixel size splits into pages
    Paginate {
        /// Bitmap width in pixels
        #[arg(long)]
        width: u32,

        /// Bitmap height in pixels
        #[arg(long)]
        height: u32,

        /// Output paper size
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Options JSON file
        #[arg(long)]
        options: Option<PathBuf>,

        /// List every page, not just the summary
        #[arg(long)]
        pages: bool,
    },

    /// Render a pay stub to a paginated PDF
    Export {
        /// Pay stub JSON file
        #[arg(short, long)]
        stub: PathBuf,

        /// Replace the stub's line items with those in this CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Options JSON file
        #[arg(long)]
        options: Option<PathBuf>,

        /// Directory the PDF is written to (default: from options)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output paper size
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Use a pre-rendered image of the stub instead of rasterizing it
        #[arg(long)]
        image: Option<PathBuf>,

        /// Image drawn at the top of the stub (overrides the options file)
        #[arg(long)]
        logo: Option<PathBuf>,

        /// Directory containing the pdfium library
        #[cfg(feature = "pdfium")]
        #[arg(long)]
        pdfium_dir: Option<PathBuf>,
    },

    /// Write a starter stub and a default options file
    Init {
        /// Directory to write stub.json and options.json into
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A4,
    Letter,
    Legal,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A4 => Self::A4,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
        }
    }
}

async fn load_options(path: Option<&Path>, paper: Option<PaperArg>) -> Result<StubOptions> {
    let mut options = match path {
        Some(path) => StubOptions::load(path)
            .await
            .with_context(|| format!("Failed to read options from {}", path.display()))?,
        None => StubOptions::default(),
    };
    if let Some(paper) = paper {
        options.paper_size = paper.into();
    }
    options.validate()?;
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Debug records are always captured so a failed export can show them
    let echo_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let logger = AppLogger::new(1000)
        .with_level(LevelFilter::Debug)
        .with_echo_level(echo_level);
    logger.clone().init().context("Failed to install logger")?;

    match cli.command {
        Commands::Totals { stub, csv, options } => {
            let options = load_options(options.as_deref(), None).await?;
            let mut pay_stub = match &stub {
                Some(path) => PayStub::load(path).await?,
                None => PayStub::default(),
            };
            if let Some(csv) = &csv {
                pay_stub.items = load_items_from_csv(csv).await?;
            }

            let totals = pay_stub.totals(&options.mileage);
            println!("Line items: {}", pay_stub.items.len());
            println!("  Gross earnings: {}", format_currency(totals.earnings));
            println!("  Mileage:        {}", format_currency(totals.mileage));
            println!("  Net pay:        {}", format_currency(totals.net));
        }

        Commands::Paginate {
            width,
            height,
            paper,
            options,
            pages,
        } => {
            let options = load_options(options.as_deref(), paper).await?;
            let page_size = options.page_size();
            let stats = pagination_statistics(width, height, page_size.width, page_size.height)?;

            println!("Pagination Statistics:");
            println!("  Source: {}×{} px", width, height);
            println!("  Page: {:.1}×{:.1} pt", page_size.width, page_size.height);
            println!("  Scale: {:.4} pt/px", stats.scale);
            println!("  Rows per page: {}", stats.slice_height_px);
            println!("  Pages: {}", stats.page_count);
            println!("  Rows on last page: {}", stats.last_slice_height);
            if stats.single_page {
                println!("  Fits on a single page");
            }

            if pages {
                for page in paystub_core::paginate(width, height, page_size.width, page_size.height)? {
                    println!(
                        "  Page {}: rows {}..{} → {:.1}×{:.1} pt",
                        page.page_index + 1,
                        page.source_offset,
                        page.source_end(),
                        page.target_width,
                        page.target_height
                    );
                }
            }
        }

        Commands::Export {
            stub,
            csv,
            options,
            output_dir,
            paper,
            image,
            logo,
            #[cfg(feature = "pdfium")]
            pdfium_dir,
        } => {
            let mut options = load_options(options.as_deref(), paper).await?;
            if logo.is_some() {
                options.logo = logo;
            }

            let rasterizer: Arc<dyn SurfaceRasterizer> = match image {
                Some(path) => Arc::new(ImageFileRasterizer::new(path)),
                #[cfg(feature = "pdfium")]
                None => match pdfium_dir {
                    Some(dir) => Arc::new(paystub_render::PdfiumRasterizer::with_library_dir(dir)),
                    None => Arc::new(paystub_render::PdfiumRasterizer::default()),
                },
                #[cfg(not(feature = "pdfium"))]
                None => bail!("No rasterizer available: pass --image or build with the `pdfium` feature"),
            };

            if let Err(e) = run_export(stub, csv, options, output_dir, rasterizer).await {
                let detail = logger.unechoed_entries();
                if !detail.is_empty() {
                    eprintln!("Recent log before the failure:");
                    for entry in detail {
                        eprintln!("  {}", entry.line());
                    }
                }
                return Err(e);
            }
        }

        Commands::Init { dir, force } => {
            let stub_path = dir.join("stub.json");
            let options_path = dir.join("options.json");
            for path in [&stub_path, &options_path] {
                if !force && tokio::fs::try_exists(path).await? {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
            }

            tokio::fs::create_dir_all(&dir).await?;
            starter_stub().save(&stub_path).await?;
            StubOptions::default().save(&options_path).await?;
            println!("Wrote {} and {}", stub_path.display(), options_path.display());
        }
    }

    Ok(())
}

/// Drive an export through the background worker, printing progress as it arrives
async fn run_export(
    stub: PathBuf,
    csv: Option<PathBuf>,
    options: StubOptions,
    output_dir: Option<PathBuf>,
    rasterizer: Arc<dyn SurfaceRasterizer>,
) -> Result<()> {
    let (command_tx, command_rx) = mpsc::unbounded_channel::<StubCommand>();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<StubUpdate>();
    let guard = ExportGuard::new();
    let backend = ExportBackend {
        rasterizer,
        writer: Arc::new(PrintPdfWriter::default()),
    };
    let worker = tokio::spawn(worker_task(command_rx, update_tx, backend, guard.clone()));

    let mut session = StubSession::new(command_tx, guard, options);

    session.request_load_stub(stub);
    wait_for(&mut session, &mut update_rx, |u| matches!(u, StubUpdate::StubLoaded { .. })).await?;

    if let Some(csv) = csv {
        session.request_load_items_csv(csv);
        wait_for(&mut session, &mut update_rx, |u| matches!(u, StubUpdate::ItemsLoaded { .. }))
            .await?;
    }

    if !session.request_export(output_dir) {
        bail!("Export could not be started");
    }
    wait_for(&mut session, &mut update_rx, StubUpdate::finishes_export).await?;

    let report = session
        .last_export()
        .context("Export finished without a report")?;
    println!(
        "Generated {} page{} (net {}) → {}",
        report.page_count,
        if report.page_count == 1 { "" } else { "s" },
        format_currency(report.totals.net),
        report.path.display()
    );

    drop(session);
    worker.await?;
    Ok(())
}

/// Apply updates until `done` matches one; errors end the wait
async fn wait_for(
    session: &mut StubSession,
    update_rx: &mut mpsc::UnboundedReceiver<StubUpdate>,
    done: impl Fn(&StubUpdate) -> bool,
) -> Result<()> {
    while let Some(update) = update_rx.recv().await {
        let finished = done(&update);
        let failure = match &update {
            StubUpdate::Error { message } | StubUpdate::ExportFailed { message } => {
                Some(message.clone())
            }
            _ => None,
        };
        if let StubUpdate::Progress {
            operation,
            current,
            total,
        } = &update
        {
            log::debug!("[{current}/{total}] {operation}");
        }

        session.apply_update(update);
        if let Some(message) = failure {
            bail!(message);
        }
        if finished {
            return Ok(());
        }
    }
    bail!("Worker stopped unexpectedly")
}

fn starter_stub() -> PayStub {
    let today = chrono::Local::now().date_naive();
    let items = paystub_core::ItemList::new()
        .with_item(
            LineItem::new(Category::PhotoCapture)
                .with_quantity(1.0)
                .with_rate(0.0)
                .with_miles(0.0)
                .with_date(today),
        )
        .with_item(LineItem::new(Category::EstimateWriting).with_quantity(1.0));

    PayStub {
        contractor: Contractor {
            name: "Contractor Name".to_string(),
            email: String::new(),
            id: String::new(),
        },
        period: PayPeriod {
            start: None,
            end: None,
            pay_date: Some(today),
        },
        paid_via: Some(PaymentMethod::Check),
        items,
    }
}
