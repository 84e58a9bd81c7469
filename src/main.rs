//! LineCycle CLI - validate, load and report production-line events.
//!
//! The main entry point for the `linecycle` binary.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use linecycle_core::analytics::Analytics;
use linecycle_core::config::{PipelineConfig, StoreLocation, DEFAULT_Q1_LINE};
use linecycle_core::pipeline::{process_file, BatchResult, RunContext};
use linecycle_core::report::{write_quarantine_csv, write_report, Report, ReportFormat};
use linecycle_core::storage::{FactStore, MemoryStore, SqliteStore};
use linecycle_core::{init_logger, log_error, ExitStatus, Result};

/// Production-line event pipeline.
#[derive(Debug, Parser)]
#[command(name = "linecycle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "LINECYCLE_DB", default_value = "linecycle.db", global = true)]
    db: PathBuf,

    /// Use an in-memory store; nothing is persisted.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Line whose cycles are listed (Q1).
    #[arg(long, env = "LINECYCLE_Q1_LINE", default_value = DEFAULT_Q1_LINE, global = true)]
    q1_line: String,

    /// Number of lines in the downtime ranking (Q3).
    #[arg(long, env = "LINECYCLE_TOP_LINES", default_value_t = 1, global = true)]
    top_lines: usize,

    /// Report format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: ReportFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create tables and seed the status dimension.
    Setup,
    /// Validate and load an input file.
    Load(InputArgs),
    /// Report on the facts already loaded.
    Report(OutputArgs),
    /// Setup, load and report in one go.
    Run {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Input CSV file.
    #[arg(long, short = 'i', env = "LINECYCLE_INPUT")]
    input: Option<PathBuf>,

    /// Write this run's quarantined rows to a CSV file.
    #[arg(long, env = "LINECYCLE_QUARANTINE")]
    quarantine: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Write the report to a file instead of stdout.
    #[arg(long, short = 'o', env = "LINECYCLE_REPORT")]
    output: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let (input, quarantine_path, report_path) = match &self.command {
            Commands::Setup => (None, None, None),
            Commands::Load(i) => (i.input.clone(), i.quarantine.clone(), None),
            Commands::Report(o) => (None, None, o.output.clone()),
            Commands::Run { input, output } => (
                input.input.clone(),
                input.quarantine.clone(),
                output.output.clone(),
            ),
        };
        PipelineConfig {
            store: if self.dry_run {
                StoreLocation::DryRun
            } else {
                StoreLocation::Sqlite(self.db.clone())
            },
            input,
            report_path,
            quarantine_path,
            q1_line: self.q1_line.clone(),
            top_n: self.top_lines,
            format: self.format,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger();

    let ctx = RunContext::new();
    let status = match run(&cli, &ctx) {
        Ok(()) => ExitStatus::Success,
        Err(err) => {
            log_error!(
                ctx.log_context(),
                "PIPELINE_FAILED",
                dependency = err.dependency(),
                error = err.to_string(),
            );
            eprintln!("error ({}): {}", err.dependency(), err);
            err.exit_status()
        }
    };
    process::exit(status.code());
}

fn run(cli: &Cli, ctx: &RunContext) -> Result<()> {
    let config = cli.config();
    config.validate()?;

    // A report-only pass must not create the database file.
    let create = !matches!(cli.command, Commands::Report(_));
    let mut store = open_store(&config.store, create)?;
    log::info!(
        "{} PIPELINE_START command={:?} store={:?}",
        ctx.log_context(),
        cli.command,
        config.store
    );

    match &cli.command {
        Commands::Setup => {
            store.ensure_schema()?;
            println!("schema ready");
            Ok(())
        }
        Commands::Load(_) => {
            let batch = load(ctx, &config, &mut *store)?;
            print_batch(&batch, config.format)
        }
        Commands::Report(_) => {
            // Only a dry run may create tables on a report-only pass.
            match config.store {
                StoreLocation::DryRun => store.ensure_schema()?,
                StoreLocation::Sqlite(_) => store.verify_schema()?,
            }
            report(ctx, &config, &*store, None)
        }
        Commands::Run { .. } => {
            let batch = load(ctx, &config, &mut *store)?;
            report(ctx, &config, &*store, Some(batch))
        }
    }
}

fn open_store(location: &StoreLocation, create: bool) -> Result<Box<dyn FactStore>> {
    Ok(match location {
        StoreLocation::Sqlite(path) if create => Box::new(SqliteStore::open(path)?),
        StoreLocation::Sqlite(path) => Box::new(SqliteStore::open_existing(path)?),
        StoreLocation::DryRun => Box::new(MemoryStore::new()),
    })
}

fn load(ctx: &RunContext, config: &PipelineConfig, store: &mut dyn FactStore) -> Result<BatchResult> {
    let input = config.require_input()?;
    store.ensure_schema()?;
    let batch = process_file(ctx, store, input)?;
    if let Some(path) = &config.quarantine_path {
        write_quarantine_csv(path, &batch.quarantined)?;
    }
    Ok(batch)
}

fn report(
    ctx: &RunContext,
    config: &PipelineConfig,
    store: &dyn FactStore,
    batch: Option<BatchResult>,
) -> Result<()> {
    let analytics = Analytics::from_store(store)?;
    let report = Report::build(
        &ctx.run_id,
        &analytics,
        &config.q1_line,
        config.top_n,
        batch,
        store.quarantine_count()?,
    );
    let content = report.render(config.format)?;
    match &config.report_path {
        Some(path) => write_report(path, &content),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn print_batch(batch: &BatchResult, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => println!(
            "{}: received={} accepted={} resubmitted={} quarantined={} inserted={}",
            batch.run_id,
            batch.received_count,
            batch.accepted_count,
            batch.resubmitted_count,
            batch.quarantined_count(),
            batch.load.inserted
        ),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(batch)?
        ),
    }
    Ok(())
}
