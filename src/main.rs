use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use http_resource::config::DEBUG_ENV;
use http_resource::template::BuildEnv;
use http_resource::{Action, ResourceInput};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Pipeline resource performing one templated HTTP call
///
/// Installed as `check`, `in` and `out`; the action then comes from the
/// executable name instead of the first argument.
#[derive(Parser, Debug)]
#[command(name = "http-resource", version, about, long_about = None)]
struct Args {
    /// Action to run
    #[arg(value_enum)]
    action: Action,

    /// Working directory (`in` destination or `out` sources)
    dir: Option<PathBuf>,

    /// Log level for the log file
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Stdout carries the protocol, so logs go to stderr in debug mode and to a file otherwise
fn setup_logging(level: LogLevel, debug: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(Level::DEBUG))
            .with_writer(io::stderr)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .init();
        return None;
    }

    let tracing_level = level.to_tracing_level()?;
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("warning: cannot open log file {}: {e}", log_path.display());
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(tracing_level))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::debug!("Log file: {:?}", log_path);

    Some(guard)
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

fn get_log_path() -> PathBuf {
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("http-resource").join("http-resource.log");
    }
    std::env::temp_dir().join("http-resource.log")
}

/// Insert the action when invoked through a `check`/`in`/`out` link
fn normalize_args(mut argv: Vec<String>) -> Vec<String> {
    let action = argv.first().and_then(|program| Action::from_program_name(program));
    if let Some(action) = action {
        argv.insert(1, action.name().to_string());
    }
    argv
}

fn debug_requested() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_from(normalize_args(std::env::args().collect()));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read stdin")?;

    let parsed = ResourceInput::parse(&raw);
    let debug = debug_requested() || parsed.as_ref().is_ok_and(|input| input.source.debug);
    let _log_guard = setup_logging(args.log_level, debug);

    let input = parsed.inspect_err(|e| tracing::error!("Rejected input: {}", e))?;
    let dir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };

    let output = http_resource::action::run(args.action, &input, BuildEnv::from_env(), &dir)
        .await
        .inspect_err(|e| tracing::error!("{} failed: {}", args.action.name(), e))?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &output).context("Failed to write output")?;
    writeln!(stdout).context("Failed to write output")?;
    stdout.flush().context("Failed to write output")?;

    Ok(())
}
