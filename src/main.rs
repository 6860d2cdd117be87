use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_ingest::infrastructure::AppState;
use catalog_ingest::{config, db};

const USAGE: &str = "usage: catalog-ingest ingest [--institution CODE] <file>...\n       catalog-ingest scope";

enum Command {
    Ingest {
        institution: Option<String>,
        files: Vec<PathBuf>,
    },
    Scope,
}

fn parse_args(args: &[String]) -> Option<Command> {
    match args.first().map(String::as_str) {
        Some("ingest") => {
            let mut institution = None;
            let mut files = Vec::new();
            let mut rest = args[1..].iter();
            while let Some(arg) = rest.next() {
                if arg == "--institution" {
                    institution = Some(rest.next()?.clone());
                } else {
                    files.push(PathBuf::from(arg));
                }
            }
            if files.is_empty() {
                return None;
            }
            Some(Command::Ingest { institution, files })
        }
        Some("scope") => Some(Command::Scope),
        _ => None,
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize report: {}", e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    let config = config::Config::from_env();

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(db, config);

    match command {
        Command::Ingest { institution, files } => {
            let Some(institution) = institution.or_else(|| state.config.institution_code.clone())
            else {
                tracing::error!("No institution code: pass --institution or set INSTITUTION_CODE");
                return ExitCode::from(2);
            };

            let driver = state.ingestion_driver();
            let mut failed = false;
            for path in files {
                match driver.ingest_path(&institution, &path).await {
                    Ok(report) => print_json(&report),
                    Err(e) if e.is_fatal() => {
                        tracing::error!("Stopping ingestion at {}: {}", path.display(), e);
                        return ExitCode::FAILURE;
                    }
                    Err(e) => {
                        tracing::error!("Skipping {}: {}", path.display(), e);
                        failed = true;
                    }
                }
            }
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Scope => match state.scope_filter().run(state.repo.as_ref()).await {
            Ok(report) => {
                print_json(&report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Scope pass failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
