use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use exam_core::model::{Category, TestSlug};
use services::{CatalogFilter, CatalogService, Clock, SessionConfig, SessionRunner, TestCard};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingSlug,
    InvalidSlug { raw: String },
    InvalidCategory { raw: String },
    InvalidTickMs { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingSlug => write!(f, "run requires a test slug"),
            ArgsError::InvalidSlug { raw } => write!(f, "invalid test slug: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
            ArgsError::InvalidTickMs { raw } => write!(f, "invalid --tick-ms value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p exam -- list [--category ssc|railway] [--search <text>] [--json]");
    eprintln!("  cargo run -p exam -- run <slug> [--tick-ms <ms>]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --catalog <path>   JSON catalog (default: built-in sample)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_CATALOG, EXAM_TICK_MS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Run,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "run" => Some(Self::Run),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    catalog: Option<PathBuf>,
    tick_period: Duration,
    filter: CatalogFilter,
    json: bool,
    slug: Option<TestSlug>,
}

impl Args {
    fn defaults() -> Self {
        let catalog = std::env::var("EXAM_CATALOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let tick_period = std::env::var("EXAM_TICK_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(SessionConfig::default().tick_period, Duration::from_millis);
        Self {
            catalog,
            tick_period,
            filter: CatalogFilter::default(),
            json: false,
            slug: None,
        }
    }

    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::defaults();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--catalog" => {
                    let value = require_value(args, "--catalog")?;
                    parsed.catalog = Some(PathBuf::from(value));
                }
                "--tick-ms" if cmd == Command::Run => {
                    let value = require_value(args, "--tick-ms")?;
                    let ms: u64 = value
                        .parse()
                        .ok()
                        .filter(|ms| *ms > 0)
                        .ok_or_else(|| ArgsError::InvalidTickMs { raw: value.clone() })?;
                    parsed.tick_period = Duration::from_millis(ms);
                }
                "--category" if cmd == Command::List => {
                    let value = require_value(args, "--category")?;
                    let category: Category = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCategory { raw: value.clone() })?;
                    parsed.filter = parsed.filter.category(category);
                }
                "--search" if cmd == Command::List => {
                    let value = require_value(args, "--search")?;
                    parsed.filter = parsed.filter.search(value);
                }
                "--json" if cmd == Command::List => parsed.json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if cmd == Command::Run && parsed.slug.is_none() && !arg.starts_with("--") => {
                    let slug: TestSlug = arg
                        .parse()
                        .map_err(|_| ArgsError::InvalidSlug { raw: arg.clone() })?;
                    parsed.slug = Some(slug);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if cmd == Command::Run && parsed.slug.is_none() {
            return Err(ArgsError::MissingSlug);
        }
        Ok(parsed)
    }
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("exam=info".parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn render_cards(cards: &[TestCard], total: usize) -> String {
    let mut out = format!("Showing {} of {} tests", cards.len(), total);
    for card in cards {
        out.push_str(&format!("\n\n{}  [{}]", card.title, card.slug));
        out.push_str(&format!(
            "\n    {} | {} questions | {} min | max {} | negative {}",
            card.category_label,
            card.question_count,
            card.duration_minutes,
            card.max_score,
            card.negative_label
        ));
        out.push_str(&format!(
            "\n    easy {} / medium {} / hard {} | {}",
            card.difficulty.easy,
            card.difficulty.medium,
            card.difficulty.hard,
            card.topics.join(", ")
        ));
        out.push_str(&format!("\n    {}", card.key_rule));
    }
    if cards.is_empty() {
        out.push_str("\nNo tests match.");
    }
    out
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(cmd, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing()?;

    let storage = match &parsed.catalog {
        Some(path) => Storage::from_json_file(path).await?,
        None => Storage::sample()?,
    };
    let catalog = CatalogService::new(Clock::system(), storage.catalog);

    match cmd {
        Command::List => {
            let cards = catalog.list(&parsed.filter).await?;
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else {
                let total = catalog.count().await?;
                println!("{}", render_cards(&cards, total));
            }
            Ok(())
        }
        Command::Run => {
            let Some(slug) = parsed.slug else {
                return Err(ArgsError::MissingSlug.into());
            };
            let session = catalog.open_session(&slug).await?;
            let test = session.test().clone();
            let config = SessionConfig::default().with_tick_period(parsed.tick_period);
            let (handle, task) = SessionRunner::spawn(session, config);

            terminal::drive(&test, handle).await?;
            let session = task.await?;
            tracing::info!(phase = ?session.phase(), "session closed");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
