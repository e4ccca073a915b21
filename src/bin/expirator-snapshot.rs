use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use expirator::persistence::{SnapshotMap, SnapshotStore};
use expirator::ExpirableId;

#[derive(Parser)]
#[command(name = "expirator-snapshot")]
#[command(about = "Inspect an expirator snapshot file", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "expirations.json")]
    path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every pending expiration
    List,
    /// Count pending expirations
    Count,
    /// List expirations whose deadline has already passed
    Overdue,
    /// Show a single identity
    Show { id: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store = SnapshotStore::new(&cli.path);

    let Some(snapshot) = store.read()? else {
        eprintln!("Error: no snapshot at {}", cli.path.display());
        std::process::exit(1);
    };

    let output = match cli.command {
        Commands::List => list(&snapshot, |_| true),
        Commands::Count => json!({ "pending": snapshot.len() }),
        Commands::Overdue => {
            let now = Utc::now();
            list(&snapshot, |expires_at| expires_at <= now)
        }
        Commands::Show { id } => match snapshot.get(&ExpirableId::from(id.as_str())) {
            Some(record) => serde_json::to_value(record)?,
            None => {
                eprintln!("Error: {} has no pending expiration", id);
                std::process::exit(1);
            }
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn list(snapshot: &SnapshotMap, keep: impl Fn(chrono::DateTime<Utc>) -> bool) -> Value {
    let now = Utc::now();
    snapshot
        .values()
        .filter(|record| keep(record.expires_at))
        .map(|record| {
            json!({
                "id": record.id,
                "expires_at": record.expires_at,
                "remaining_secs": (record.expires_at - now).num_seconds(),
            })
        })
        .collect()
}
