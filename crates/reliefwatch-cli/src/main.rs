mod display;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reliefwatch_ai::{DEFAULT_ACCEPT_THRESHOLD, DEFAULT_CHUNK_SIZE, Dispatcher, Mode, ReportKind};
use reliefwatch_core::{AnalysisRequest, Lexicon};
use tracing::info;
use tracing_subscriber::EnvFilter;

use display::Format;

#[derive(Parser)]
#[command(
    name = "reliefwatch",
    version,
    about = "Disaster-relief snippet classification and aggregation"
)]
struct Cli {
    /// Directory holding the four taxonomy JSON files.
    #[arg(long, env = "RELIEFWATCH_LEXICON_DIR", default_value = "config", global = true)]
    lexicon_dir: PathBuf,

    /// Directory with `sentiment/` and `zero-shot/` ONNX models.
    #[arg(long, env = "RELIEFWATCH_MODEL_DIR", global = true)]
    model_dir: Option<PathBuf>,

    /// Texts per classification-service call.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, global = true)]
    chunk_size: usize,

    /// Zero-shot scores must exceed this to select a category.
    #[arg(long, default_value_t = DEFAULT_ACCEPT_THRESHOLD, global = true)]
    threshold: f32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sentiment per date.
    SentimentTrend(ReportArgs),
    /// Damage category frequency.
    Damage(ReportArgs),
    /// Damage categories per document.
    DamageLabels(ReportArgs),
    /// Sentiment per relief category.
    ReliefSentiment(ReportArgs),
    /// Sentiment per date and relief category.
    ReliefTrend(ReportArgs),
    /// Request / Offer / News counts.
    Intent(ReportArgs),
    /// Validate the lexicon directory and summarize it.
    Lexicon {
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Request body `{"texts": [...], "dates": [...], "model_type": "ai"}`; `-` reads stdin.
    input: PathBuf,

    /// Override the request's `model_type` (`keyword` or `ai`).
    #[arg(long)]
    mode: Option<Mode>,

    #[arg(long, value_enum, default_value_t)]
    format: Format,

    /// Order date-keyed rows chronologically.
    #[arg(long)]
    sort_dates: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let lexicon = Lexicon::load_dir(&cli.lexicon_dir)
        .with_context(|| format!("loading lexicon from {}", cli.lexicon_dir.display()))?;

    let (kind, args) = match &cli.command {
        Command::SentimentTrend(args) => (ReportKind::SentimentTrend, args),
        Command::Damage(args) => (ReportKind::DamageFrequency, args),
        Command::DamageLabels(args) => (ReportKind::DamageLabels, args),
        Command::ReliefSentiment(args) => (ReportKind::ReliefSentiment, args),
        Command::ReliefTrend(args) => (ReportKind::ReliefTrend, args),
        Command::Intent(args) => (ReportKind::IntentStats, args),
        Command::Lexicon { format } => {
            return display::render_lexicon(&lexicon.summary(), *format);
        }
    };

    let dispatcher = build_dispatcher(cli, lexicon)?;
    let request = read_request(&args.input)?;
    info!(
        report = kind.as_str(),
        texts = request.texts.len(),
        model = dispatcher.has_model(),
        "running report"
    );

    let mut report = dispatcher
        .run(kind, &request, args.mode)
        .with_context(|| format!("{} report", kind.as_str()))?;
    if args.sort_dates {
        report.sort_dates();
    }
    display::render_report(&report, args.format)
}

fn build_dispatcher(cli: &Cli, lexicon: Lexicon) -> anyhow::Result<Dispatcher> {
    let dispatcher = Dispatcher::new(Arc::new(lexicon));
    let Some(model_dir) = &cli.model_dir else {
        return Ok(dispatcher);
    };

    #[cfg(feature = "onnx")]
    {
        let service = reliefwatch_ai::OnnxService::load(model_dir)
            .with_context(|| format!("loading models from {}", model_dir.display()))?;
        let model = reliefwatch_ai::ModelClassifier::new(Arc::new(service))
            .with_chunk_size(cli.chunk_size)
            .with_threshold(cli.threshold);
        info!(
            chunk_size = model.chunk_size(),
            threshold = model.threshold(),
            service = model.service_name(),
            "classification service ready"
        );
        Ok(dispatcher.with_model(model))
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::warn!(
            model_dir = %model_dir.display(),
            chunk_size = cli.chunk_size,
            threshold = cli.threshold,
            "built without the onnx feature, ignoring model directory"
        );
        Ok(dispatcher)
    }
}

fn read_request(path: &Path) -> anyhow::Result<AnalysisRequest> {
    let body = if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("reading request from stdin")?;
        body
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&body).with_context(|| format!("parsing request {}", path.display()))
}
