//! # Market Terminal Library
//!
//! Console register for Market POS. Loads the store, reads commands from
//! stdin and saves the store on exit.
//!
//! ## Module Organization
//! ```text
//! market_terminal/
//! ├── lib.rs          ◄─── You are here (startup & command loop)
//! ├── config.rs       ◄─── TerminalConfig from MARKET_* variables
//! ├── commands.rs     ◄─── Command parsing and the Console
//! └── error.rs        ◄─── CommandError shown to the cashier
//! ```

pub mod commands;
pub mod config;
pub mod error;

use std::io::Write;
use std::path::Path;

use market_core::SharedStore;
use market_db::seed::demo_store;
use market_db::{Database, DbConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{Console, Reply, HELP};
use config::TerminalConfig;

/// Opening stock per product when the demo catalog is seeded.
pub const DEMO_STOCK: i64 = 25;

/// Runs the terminal until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Terminal Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter (RUST_LOG)                     │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • MARKET_* variables over defaults                                  │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │     • Demo catalog seeded into an empty database if requested           │
/// │                                                                         │
/// │  4. Command Loop ─────────────────────────────────────────────────────► │
/// │     • One CheckoutLane over the loaded Store                            │
/// │     • Errors are printed and the loop continues                         │
/// │                                                                         │
/// │  5. Shutdown ─────────────────────────────────────────────────────────► │
/// │     • Open transaction cancelled, Store saved, pool closed              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Market POS terminal");

    let config = TerminalConfig::from_env();
    let db_path = config.resolve_database_path();
    ensure_parent_dir(&db_path)?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let mut store = db.load_store().await?;

    if config.seed_demo && store.catalog().is_empty() {
        info!(stock = DEMO_STOCK, "Seeding demo catalog");
        store = demo_store(DEMO_STOCK)?;
        db.save_store(&store).await?;
    }

    let shared = SharedStore::new(store);
    let mut console = Console::new(shared.clone(), config.clone());

    println!("{}", config.store_name);
    println!("{}", HELP);
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match console.handle_line(&line) {
            Ok(Reply::Quit) => break,
            Ok(Reply::Output(text)) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Err(err) => println!("{}", err),
        }
        prompt();
    }

    console.shutdown();
    db.save_store(&shared.snapshot()).await?;
    db.close().await;

    info!("Terminal stopped");
    Ok(())
}

/// Installs the tracing subscriber. `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,market=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
