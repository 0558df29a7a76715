use std::fmt;
use std::path::PathBuf;

use exam_core::model::{Difficulty, TestDefinition};
use storage::json::parse_catalog;

#[derive(Debug)]
enum ArgsError {
    UnknownArg(String),
    MissingPath,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingPath => write!(f, "no catalog file given"),
        }
    }
}

impl std::error::Error for ArgsError {}

struct Args {
    paths: Vec<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut paths = Vec::new();
        if let Ok(value) = std::env::var("EXAM_CATALOG") {
            if !value.trim().is_empty() {
                paths.push(PathBuf::from(value));
            }
        }

        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => paths.push(PathBuf::from(arg)),
            }
        }

        if paths.is_empty() {
            return Err(ArgsError::MissingPath);
        }
        Ok(Self { paths })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin check_catalog -- <catalog.json>...");
    eprintln!();
    eprintln!("Validates every test record and prints a one-line summary per test.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_CATALOG   extra catalog file to check");
}

fn summary(test: &TestDefinition) -> String {
    let split = test.difficulty_split();
    let levels = Difficulty::ALL
        .iter()
        .map(|level| format!("{} {}", level.as_str(), split.count(*level)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{:<28} {:<8} {:>3} q {:>3} min  max {:<5} neg {:<12} {levels}",
        test.slug(),
        test.category().label(),
        test.question_count(),
        test.duration_minutes(),
        test.max_score(),
        test.marking().negative_label(),
    )
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut failed = 0usize;
    for path in &args.paths {
        let raw = std::fs::read_to_string(path)?;
        match parse_catalog(&raw) {
            Ok(tests) => {
                println!("{}: {} tests", path.display(), tests.len());
                for test in &tests {
                    println!("  {}", summary(test));
                }
            }
            Err(err) => {
                failed += 1;
                println!("{}: {err}", path.display());
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} catalog file(s) failed validation").into());
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
