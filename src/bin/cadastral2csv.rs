use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cadastral_pdf_csv::{
    BatchOptions, BatchSummary, CancellationToken, DocumentResult, Event, EventKind, EventLevel,
    PdfFileSource, RecordInterval, process_batch, process_document,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(
    name = "cadastral2csv",
    version,
    about = "Convert cadastral parcel tables in land-use PDF reports into CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert every PDF in a folder; type `stop` and Enter to cancel.
    Batch(BatchArgs),
    /// Convert a single PDF.
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Folder containing the PDF reports.
    #[arg(short, long)]
    input: PathBuf,

    /// Folder receiving CSV files, the processing log and statistics.
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output folder.
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Records between two progress messages.
    #[arg(long, default_value = "10000")]
    interval: String,

    /// Also print debug-level events.
    #[arg(short, long)]
    verbose: bool,
}

impl CommonArgs {
    fn record_interval(&self) -> Result<RecordInterval> {
        RecordInterval::from_str(&self.interval).context("failed to parse --interval")
    }
}

fn print_event(event: &Event, verbose: bool) {
    match &event.kind {
        EventKind::Progress(percent) => {
            eprintln!("[{}] 處理進度: {percent:.1}%", event.timestamp.format("%H:%M:%S"));
        }
        EventKind::Log { level, message } => {
            if *level == EventLevel::Debug && !verbose {
                return;
            }
            println!("[{}] {message}", event.timestamp.format("%H:%M:%S"));
        }
    }
}

fn spawn_stop_listener(token: CancellationToken) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                return;
            };
            if matches!(line.trim(), "stop" | "q") {
                eprintln!("正在停止轉換，請稍候...");
                token.cancel();
                return;
            }
        }
    });
}

fn run_batch(args: &BatchArgs) -> Result<BatchSummary> {
    let options = BatchOptions::new(&args.input, &args.output)
        .with_record_interval(args.common.record_interval()?);
    options.validate().context("invalid batch configuration")?;

    let token = CancellationToken::new();
    spawn_stop_listener(token.clone());

    let (tx, rx) = crossbeam_channel::unbounded::<Event>();
    let worker = thread::Builder::new()
        .name("batch-worker".to_string())
        .spawn({
            let token = token.clone();
            move || process_batch(&PdfFileSource, &options, &token, &tx)
        })
        .context("failed to start batch worker")?;

    let ticker = crossbeam_channel::tick(POLL_INTERVAL);
    loop {
        ticker.recv().context("poll timer stopped")?;
        let finished = worker.is_finished();
        for event in rx.try_iter() {
            print_event(&event, args.common.verbose);
        }
        if finished {
            break;
        }
    }

    worker
        .join()
        .map_err(|_| anyhow!("batch worker panicked"))?
        .with_context(|| format!("failed to process folder '{}'", args.input.display()))
}

fn run_convert(args: &ConvertArgs) -> Result<DocumentResult> {
    let interval = args.common.record_interval()?;
    if !args.input.is_file() {
        anyhow::bail!("input PDF does not exist: {}", args.input.display());
    }

    let (tx, rx) = crossbeam_channel::unbounded::<Event>();
    let result = process_document(
        &PdfFileSource,
        &args.input,
        &args.output,
        interval,
        &CancellationToken::new(),
        &tx,
    );
    for event in rx.try_iter() {
        print_event(&event, args.common.verbose);
    }
    Ok(result)
}

fn exit_code(succeeded: bool) -> ExitCode {
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cadastral_pdf_csv=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Batch(args) => run_batch(args).map(|summary| summary.succeeded > 0),
        Commands::Convert(args) => run_convert(args).map(|result| result.success),
    };

    match outcome {
        Ok(succeeded) => exit_code(succeeded),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
