//! heartwise: Cardiovascular risk assessment from the command line.
//!
//! # Usage
//!
//! ```bash
//! heartwise assess [--user <id>] [--input <file>] [--no-save]
//! heartwise history --user <id> [--limit <n>]
//! heartwise summary --user <id> [--window <n>]
//! heartwise table [--export <file>]
//! ```
//!
//! `assess` reads the metrics JSON from `--input` or stdin. Command output is
//! JSON on stdout; logs go to stderr or `HEARTWISE_LOG_FILE`.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heartwise::adapters::sanitize::SanitizingMakeWriter;
use heartwise::adapters::sqlite::SqliteStorage;
use heartwise::application::{AssessmentReport, AssessmentService, HistoryService};
use heartwise::config::{AppConfig, LogMode};

const USAGE: &str = "Usage:
  heartwise assess [--user <id>] [--input <file>] [--no-save]
  heartwise history --user <id> [--limit <n>]
  heartwise summary --user <id> [--window <n>]
  heartwise table [--export <file>]";

const DEFAULT_HISTORY_LIMIT: usize = 10;
const DEFAULT_SUMMARY_WINDOW: usize = 5;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Assess {
        user: Option<String>,
        input: Option<PathBuf>,
        save: bool,
    },
    History {
        user: String,
        limit: usize,
    },
    Summary {
        user: String,
        window: usize,
    },
    Table {
        export: Option<PathBuf>,
    },
}

fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let command = args.next().ok_or("missing command")?;

    let mut user: Option<String> = None;
    let mut input: Option<PathBuf> = None;
    let mut export: Option<PathBuf> = None;
    let mut count: Option<usize> = None;
    let mut save = true;

    while let Some(arg) = args.next() {
        let mut value = || {
            args.next()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{arg} requires a value"))
        };
        match (command.as_str(), arg.as_str()) {
            ("assess" | "history" | "summary", "--user") => user = Some(value()?),
            ("assess", "--input") => input = Some(PathBuf::from(value()?)),
            ("assess", "--no-save") => save = false,
            ("history", "--limit") | ("summary", "--window") => {
                let raw = value()?;
                let n = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("{arg} must be a positive integer, got {raw:?}"))?;
                count = Some(n);
            }
            ("table", "--export") => export = Some(PathBuf::from(value()?)),
            _ => return Err(format!("unexpected argument {arg:?} for {command}")),
        }
    }

    match command.as_str() {
        "assess" => Ok(Command::Assess { user, input, save }),
        "history" => Ok(Command::History {
            user: user.ok_or("history requires --user")?,
            limit: count.unwrap_or(DEFAULT_HISTORY_LIMIT),
        }),
        "summary" => Ok(Command::Summary {
            user: user.ok_or("summary requires --user")?,
            window: count.unwrap_or(DEFAULT_SUMMARY_WINDOW),
        }),
        "table" => Ok(Command::Table { export }),
        other => Err(format!("unknown command {other:?}")),
    }
}

fn main() -> Result<()> {
    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("heartwise: {message}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let config = AppConfig::from_env();

    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("opening log file {}", config.log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let engine = config.load_engine()?;
    tracing::debug!(
        "Scoring table {} ({})",
        engine.table().version,
        engine.table().fingerprint()
    );

    match command {
        Command::Assess { user, input, save } => {
            let raw = read_input(input.as_ref())?;
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("input is not valid JSON")?;

            let report = match user.filter(|_| save) {
                Some(user) => {
                    let storage = Arc::new(SqliteStorage::new(&config.db_path)?);
                    AssessmentService::new(engine, storage).submit(&user, &value)?
                }
                None => {
                    let storage = Arc::new(SqliteStorage::in_memory()?);
                    AssessmentService::new(engine, storage).assess(&value)?
                }
            };
            print_json(&report)?;
        }
        Command::History { user, limit } => {
            let storage = Arc::new(SqliteStorage::new(&config.db_path)?);
            let service = AssessmentService::new(engine, storage);
            let reports: Vec<AssessmentReport> = service
                .history(&user, limit)?
                .iter()
                .map(AssessmentReport::from_record)
                .collect();
            print_json(&reports)?;
        }
        Command::Summary { user, window } => {
            let storage = Arc::new(SqliteStorage::new(&config.db_path)?);
            let summary = HistoryService::new(storage).summarize(&user, window)?;
            print_json(&summary)?;
        }
        Command::Table { export } => {
            let table = engine.table();
            if let Some(path) = export {
                table.export(&path)?;
                tracing::info!("Exported scoring table {} to {}", table.version, path.display());
            }
            print_json(&serde_json::json!({
                "version": table.version,
                "fingerprint": table.fingerprint(),
                "table": table,
            }))?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading metrics from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
