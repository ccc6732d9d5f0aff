//! # Palletrack Scanner Shell
//!
//! Line-oriented terminal front end for the pallet scan workflow.
//!
//! ## Usage
//! ```bash
//! # Default config location + ./pallets.db
//! cargo run -p scanner-cli --bin palletrack
//!
//! # Explicit config / database
//! cargo run -p scanner-cli --bin palletrack -- --config ./config.toml --db ./pallets.db
//! ```
//!
//! ## Commands
//! ```text
//! <raw QR text>      record a scan (full mode commits immediately)
//! :partial           switch to partial mode (scans wait for a pack count)
//! :full              switch to full mode (commits a pending scan as full)
//! :packs N           commit the pending partial scan with N packs
//! :recent [n]        list recorded scans (default 300)
//! :retry             flush the outbox and send a full snapshot
//! :status            show outbox depth
//! :labels PID COUNT LAST_SERIAL DESC...   print encoded label payloads
//! :quit              exit
//! ```

mod labels;
mod session;

use std::env;
use std::path::PathBuf;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use tracing_subscriber::EnvFilter;

use palletrack_db::{Database, DbConfig};
use palletrack_sync::{AppConfig, HttpDelivery, SyncEngine, SyncError};

use crate::session::{CommitSummary, ScanOutcome, ScanSession, SessionError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_override: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_override = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Palletrack Scanner Shell");
                println!();
                println!("Usage: palletrack [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path.as_deref())?;
    if let Some(db_path) = db_override {
        config.database_path = db_path;
    }
    config.validate()?;

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let delivery = std::sync::Arc::new(HttpDelivery::new(&config.sync)?);
    let engine = SyncEngine::new(db.clone(), delivery, config.sync.clone());
    let mut session = ScanSession::new(db.clone(), engine);

    println!("Palletrack scanner — database {}", config.database_path.display());
    println!("Mode: FULL (\":partial\" to toggle, \":quit\" to exit)");
    println!(
        "Outbox pending: {}",
        db.outbox().count().await.unwrap_or_default()
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            if !dispatch_command(command, &mut session, &db).await {
                break;
            }
            continue;
        }

        match session.scan(line).await {
            Ok(ScanOutcome::Committed(summary)) => print_commit(&summary),
            Ok(ScanOutcome::AwaitingPacks { product_id, lot, serial_number }) => {
                println!("🟡 Partial: {product_id} | lot {lot} | serial {serial_number}");
                println!("   Enter \":packs N\" to commit (or \":full\" if it was complete).");
            }
            Err(e) => print_session_error(&e),
        }
    }

    db.close().await;
    Ok(())
}

/// Handles one `:command` line. Returns false when the shell should exit.
async fn dispatch_command(command: &str, session: &mut ScanSession, db: &Database) -> bool {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();

    match name {
        "quit" | "q" => return false,

        "partial" => {
            if let Err(e) = session.set_partial_mode(true).await {
                print_session_error(&e);
            } else {
                println!("Mode: PARTIAL (scans wait for \":packs N\")");
            }
        }

        "full" => match session.set_partial_mode(false).await {
            Ok(Some(summary)) => {
                println!("Mode: FULL — pending scan committed as complete");
                print_commit(&summary);
            }
            Ok(None) => println!("Mode: FULL"),
            Err(e) => print_session_error(&e),
        },

        "packs" => {
            let packs = parts.next().and_then(|p| p.parse::<i64>().ok());
            match packs {
                Some(packs) => match session.commit_packs(packs).await {
                    Ok(summary) => print_commit(&summary),
                    Err(e) => print_session_error(&e),
                },
                None => println!("❌ Usage: :packs N  (integer >= 1)"),
            }
        }

        "recent" => {
            let limit = parts.next().and_then(|n| n.parse::<u32>().ok()).unwrap_or(300);
            match db.scans().list_recent(limit).await {
                Ok(rows) => {
                    for row in &rows {
                        println!(
                            "{:>8} | {:>6} | lot {} | {} | {} → {}",
                            row.product_id,
                            row.serial_number,
                            row.lot,
                            row.description,
                            row.created_date,
                            row.expiry_date,
                        );
                    }
                    println!("{} rows (ordered by lot/product/serial)", rows.len());
                }
                Err(e) => println!("❌ {e}"),
            }
        }

        "retry" => match session.engine().resync_all().await {
            Ok(rows) => {
                let pending = db.outbox().count().await.unwrap_or_default();
                println!("✅ Snapshot sent ({rows} rows). Outbox pending: {pending}");
            }
            Err(SyncError::SnapshotIncomplete { rows_sent, reason }) => {
                println!("⚠️  Snapshot incomplete: {rows_sent} rows confirmed, then: {reason}");
            }
            Err(e) => println!("❌ Resync failed: {e}"),
        },

        "status" => {
            let pending = db.outbox().count().await.unwrap_or_default();
            let scans = db.scans().count().await.unwrap_or_default();
            println!("Scans recorded: {scans} | Outbox pending: {pending}");
        }

        "labels" => {
            let product_id = parts.next();
            let count = parts.next().and_then(|n| n.parse::<u32>().ok());
            let last_serial = parts.next().and_then(|n| n.parse::<i64>().ok());
            let description = parts.collect::<Vec<_>>().join(" ");

            match (product_id, count, last_serial) {
                (Some(product_id), Some(count), Some(last_serial)) if !description.is_empty() => {
                    let today = Local::now().date_naive();
                    let (payloads, new_last) = labels::build_label_payloads(
                        product_id,
                        &description,
                        count,
                        last_serial,
                        today,
                    );
                    for payload in &payloads {
                        println!("{payload}");
                    }
                    println!("-- {count} labels, last serial now {new_last}");
                }
                _ => println!("❌ Usage: :labels PID COUNT LAST_SERIAL DESC..."),
            }
        }

        other => println!("❌ Unknown command ':{other}' (\":quit\" to exit)"),
    }

    true
}

fn print_commit(summary: &CommitSummary) {
    let kind = if summary.is_full {
        "COMPLETE".to_string()
    } else {
        format!("PARTIAL ({} packs)", summary.packs_partial)
    };
    let recorded = if summary.newly_recorded {
        "recorded"
    } else {
        "already on record"
    };

    println!(
        "✅ {kind} — {} | lot {} | serial {} ({recorded})",
        summary.product_id, summary.lot, summary.serial_number
    );
    println!(
        "   📦 Pallets: {} | packs declared: {}",
        summary.totals.pallets, summary.totals.packs_declared
    );

    match &summary.sync.failure {
        None => println!(
            "   ☁️  Sent: {} | outbox pending: {}",
            summary.sync.sent, summary.sync.remaining
        ),
        Some(failure) => println!(
            "   ⚠️  Sync failed ({failure}) — {} payload(s) queued for retry",
            summary.sync.remaining
        ),
    }
}

fn print_session_error(err: &SessionError) {
    error!(error = %err, "Session operation failed");
    println!("❌ {err}");
}
