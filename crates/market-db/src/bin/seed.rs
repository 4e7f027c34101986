//! # Seed Data Generator
//!
//! Populates the database with a demo catalog, stock and loyalty customers.
//!
//! ## Usage
//! ```bash
//! # Seed ./market_dev.db
//! cargo run -p market-db --bin seed
//!
//! # Specify database path and starting stock per product
//! cargo run -p market-db --bin seed -- --db ./data/market.db --stock 50
//! ```
//!
//! The catalog and customers come from [`market_db::seed`].

use std::env;

use market_db::seed::demo_store;
use market_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut stock: i64 = 25;
    let mut db_path = String::from("./market_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stock" | "-s" => {
                if i + 1 < args.len() {
                    stock = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Market POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --stock <N>    Opening stock per product (default: 25)");
                println!("  -d, --db <PATH>    Database file path (default: ./market_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Market POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid overwriting live data.");
        return Ok(());
    }

    let store = demo_store(stock)?;
    db.save_store(&store).await?;

    println!();
    println!("✓ {} products, {} units each", store.catalog().len(), stock);
    println!("✓ {} loyalty customers", store.customers().len());
    println!();
    println!("{}", store.inventory_report());

    db.close().await;
    Ok(())
}
