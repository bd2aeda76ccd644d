//! Repository Profile Harvester CLI
//!
//! Command-line caller for the harvesting pipeline: runs the three
//! sources over one repository URL, prints the canonical record, and
//! optionally snapshots every intermediate artifact into an output
//! directory, one file per source.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use repo_harvester::{Credentials, HarvestError, HarvestOptions, Orchestrator};

#[derive(Parser)]
#[command(name = "repo-harvester")]
#[command(about = "Harvest a research data repository profile from self-hosted and registry metadata")]
#[command(version)]
struct Cli {
    /// Repository homepage URL
    url: String,

    /// Directory for per-source artifacts and the final record
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// FAIRsharing login (defaults to FAIRSHARING_USERNAME)
    #[arg(long)]
    fairsharing_user: Option<String>,

    /// FAIRsharing password (defaults to FAIRSHARING_PASSWORD)
    #[arg(long)]
    fairsharing_password: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), HarvestError> {
    let credentials = match (cli.fairsharing_user, cli.fairsharing_password) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => Credentials::from_env(),
    };
    let orchestrator = Orchestrator::new(HarvestOptions {
        fairsharing_credentials: credentials,
    })?;

    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)?;
    }

    let pretty = cli.pretty;
    let output_dir = cli.output_dir.clone();
    let mut snapshot = |source: &str, raw: &Value| {
        if let Some(dir) = &output_dir {
            write_artifact(dir, &format!("{source}_metadata.json"), raw, pretty);
        }
    };

    let outcome = orchestrator.harvest_observed(&cli.url, &mut snapshot)?;

    let record = serde_json::to_value(&outcome.record)?;
    if let Some(dir) = &cli.output_dir {
        let bag = serde_json::to_value(&outcome.bag)?;
        write_artifact(dir, "harvested_metadata.json", &bag, pretty);
        write_artifact(dir, "repository_info.json", &record, pretty);
    }

    println!("{}", render(&record, pretty)?);
    Ok(())
}

fn render(value: &Value, pretty: bool) -> Result<String, HarvestError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

fn write_artifact(dir: &PathBuf, filename: &str, value: &Value, pretty: bool) {
    let path = dir.join(filename);
    match render(value, pretty) {
        Ok(body) => {
            if let Err(e) = fs::write(&path, body) {
                eprintln!("Failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => eprintln!("Failed to serialize {}: {}", path.display(), e),
    }
}
