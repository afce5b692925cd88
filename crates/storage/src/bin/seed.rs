use std::fmt;

use storage::builtin::builtin_templates;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    force: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    eprintln!("  cargo run -p storage --bin seed -- [--db <sqlite_url>] [--force]");
    eprintln!();
    eprintln!("Installs the stock assessment templates. Existing templates are");
    eprintln!("left untouched unless --force is given.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:wellness.sqlite3  (or WELLNESS_DB_URL)");
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("WELLNESS_DB_URL")
            .unwrap_or_else(|_| "sqlite:wellness.sqlite3".into());
        let mut force = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--force" => force = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, force })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = chrono::Utc::now();

    let mut installed = 0_u32;
    let mut skipped = 0_u32;
    for template in builtin_templates(now)? {
        let exists = storage.templates.get_template(template.id()).await?.is_some();
        if exists && !args.force {
            skipped += 1;
            continue;
        }
        storage.templates.upsert_template(&template).await?;
        installed += 1;
    }

    eprintln!(
        "seed: installed {installed} template(s), skipped {skipped} (db={})",
        args.db_url
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
