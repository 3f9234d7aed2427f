//! CLI entry point for the bikeshare statistics explorer.
//!
//! Runs the interactive prompt loop by default, or a single non-interactive
//! report for a given city and filter set.

use anyhow::Result;
use bikeshare_stats::{
    config::DataConfig,
    filters::{City, DayFilter, Filters, MonthFilter},
    output::run_report,
    session::Session,
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_stats")]
#[command(about = "Explore US bikeshare trip data", long_about = None)]
struct Cli {
    /// Directory holding the city CSV files
    #[arg(long, global = true, env = "BIKESHARE_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// JSON object mapping city names to CSV files, given inline or as a path
    /// to a JSON file; overrides the default file names
    #[arg(long, global = true, env = "BIKESHARE_CITY_FILES", value_name = "JSON")]
    city_files: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactively pick filters, view statistics and page through raw trips
    Explore,
    /// Print statistics for one city and filter set, then exit
    Report {
        /// chicago, new york city or washington
        #[arg(short, long)]
        city: City,

        /// all, or a month from january to june
        #[arg(short, long, default_value = "all")]
        month: MonthFilter,

        /// all, or a day from monday to sunday
        #[arg(short, long, default_value = "all")]
        day: DayFilter,

        /// Emit the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bikeshare_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    // Prompts share the terminal, so stderr stays quiet unless asked.
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = DataConfig::new(&cli.data_dir);
    if let Some(value) = &cli.city_files {
        config = config.with_city_files_arg(value)?;
    }
    info!(data_dir = %config.data_dir().display(), "Configuration loaded");

    match cli.command.unwrap_or(Commands::Explore) {
        Commands::Explore => {
            let stdin = std::io::stdin().lock();
            let stdout = std::io::stdout().lock();
            let summary = Session::new(config, stdin, stdout).run()?;

            if summary.last_failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Report {
            city,
            month,
            day,
            json,
        } => {
            let filters = Filters::new(city, month, day);
            let mut stdout = std::io::stdout().lock();
            let mut stderr = std::io::stderr().lock();
            if !run_report(&config, &filters, json, &mut stdout, &mut stderr)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
