use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use build_analyzer::colors::ColorChoice;
use build_analyzer::{AnalysisService, AnalyzerConfig, DirLogStore, OutputFormat, ReportWriter};

#[derive(Parser)]
#[command(name = "build-analyzer")]
#[command(about = "Summarize errors, warnings, status and duration of build logs")]
#[command(version)]
struct Args {
    /// Build ids to analyze (logs are read from <log-dir>/<id>.log)
    #[arg(value_name = "BUILD_ID")]
    build_ids: Vec<String>,

    /// Analyze a log file directly instead of a stored build
    #[arg(short = 'i', long = "file", value_name = "PATH", conflicts_with_all = ["list", "serve"])]
    input_file: Option<PathBuf>,

    /// List available build logs and exit
    #[arg(short = 'l', long)]
    list: bool,

    /// Read build ids from stdin, one per line, and answer each in turn
    #[arg(long, conflicts_with = "list")]
    serve: bool,

    /// Show size and modification time of the logs instead of analyzing them
    #[arg(long)]
    info: bool,

    /// Directory containing build logs
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, value_enum)]
    format: Option<OutputFormat>,

    /// Colorize text output
    #[arg(long, value_enum)]
    color: Option<ColorChoice>,

    /// How long analysis results stay cached (e.g. 1h, 30m)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    cache_ttl: Option<Duration>,

    /// Maximum number of cached results
    #[arg(long, value_name = "N")]
    cache_capacity: Option<usize>,

    /// Buffer size for reading logs
    #[arg(long, value_name = "BYTES")]
    buffer_size: Option<usize>,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config_file {
            Some(path) => AnalyzerConfig::load(path)?,
            None => AnalyzerConfig::default(),
        };

        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache_ttl = ttl;
        }
        if let Some(capacity) = self.cache_capacity {
            config.cache_capacity = Some(capacity);
        }
        if let Some(size) = self.buffer_size {
            config.buffer_size = size;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "build_analyzer=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

type Service = AnalysisService<DirLogStore>;

fn run(args: Args) -> Result<i32> {
    let config = args.config()?;
    tracing::debug!(?config, "effective configuration");

    let store = DirLogStore::new(&config.log_dir).with_buffer_size(config.buffer_size);
    let service = AnalysisService::from_config(store, &config);
    let writer = ReportWriter::new(config.format, config.color.use_colors());

    let stdout = io::stdout();
    let mut out = io::BufWriter::with_capacity(config.buffer_size, stdout.lock());

    let code = if let Some(path) = &args.input_file {
        let summary = service
            .analyze_path(path)
            .with_context(|| format!("Failed to analyze '{}'", path.display()))?;
        writer.write_summary(&mut out, &path.display().to_string(), &summary)?;
        0
    } else if args.list {
        let builds = service.available_builds()?;
        writer.write_build_list(&mut out, &builds)?;
        0
    } else if args.serve {
        serve(&service, &writer, &mut out, args.info)?
    } else {
        let build_ids = if args.build_ids.is_empty() {
            vec![select_build(&service, &writer, &mut out)?]
        } else {
            args.build_ids.clone()
        };
        analyze_builds(&service, &writer, &mut out, &build_ids, args.info)?
    };

    out.flush()?;
    Ok(code)
}

fn analyze_builds<W: Write>(
    service: &Service,
    writer: &ReportWriter,
    out: &mut W,
    build_ids: &[String],
    info: bool,
) -> Result<i32> {
    let mut failures = 0;
    for build_id in build_ids {
        let result = if info {
            service
                .metadata(build_id)
                .map(|meta| writer.write_metadata(out, &meta))
        } else {
            if writer.format() == OutputFormat::Text {
                writeln!(out, "Analyzing build ID: {}", build_id)?;
            }
            service
                .analyze(build_id)
                .map(|summary| writer.write_summary(out, build_id, &summary))
        };

        match result {
            Ok(written) => written?,
            Err(e) => {
                failures += 1;
                out.flush()?;
                eprintln!("Error: build {}: {}", build_id, e);
            }
        }
    }
    Ok(if failures > 0 { 1 } else { 0 })
}

/// Answer build ids arriving on stdin until EOF. Failures are reported in the
/// output stream and do not end the session.
fn serve<W: Write>(
    service: &Service,
    writer: &ReportWriter,
    out: &mut W,
    info: bool,
) -> Result<i32> {
    let stdin = io::stdin();
    let mut requests = 0usize;

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request from stdin")?;
        let build_id = line.trim();
        if build_id.is_empty() {
            continue;
        }
        requests += 1;

        let written = if info {
            match service.metadata(build_id) {
                Ok(meta) => writer.write_metadata(out, &meta),
                Err(e) => writer.write_error(out, build_id, &e.to_string()),
            }
        } else {
            match service.analyze(build_id) {
                Ok(summary) => writer.write_summary(out, build_id, &summary),
                Err(e) => {
                    tracing::warn!(build_id, error = %e, "analysis failed");
                    writer.write_error(out, build_id, &e.to_string())
                }
            }
        };
        written?;
        out.flush()?;
    }

    tracing::debug!(requests, cached = service.cache().len(), "stdin closed");
    Ok(0)
}

/// Show the stored builds and read a 1-based choice from stdin
fn select_build<W: Write>(
    service: &Service,
    writer: &ReportWriter,
    out: &mut W,
) -> Result<String> {
    let builds = service.available_builds()?;
    if builds.is_empty() {
        bail!(
            "No log files available in {}. Download some logs first.",
            service.store().dir().display()
        );
    }

    // stdout carries only the list and the report
    writer.write_build_list(out, &builds)?;
    out.flush()?;
    eprint!("\nSelect a log file (1-{}): ", builds.len());
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read selection")?;

    match answer.trim().parse::<usize>() {
        Ok(choice) if choice >= 1 && choice <= builds.len() => Ok(builds[choice - 1].clone()),
        _ => bail!("Invalid selection"),
    }
}
