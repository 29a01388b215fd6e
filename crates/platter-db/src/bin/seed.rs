//! # Seed Data Generator
//!
//! Populates the database with a demo restaurant for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./platter_dev.db
//! cargo run -p platter-db --bin seed
//!
//! # Specify database path
//! cargo run -p platter-db --bin seed -- --db ./data/platter.db
//! ```
//!
//! ## Generated Data
//! - One customer with a delivery address
//! - Four dishes, two options on Pho Bo, a week-long 10% Pho offer
//! - Seven warehouse ingredients across mass, volume and count units
//! - Recipes linking every dish to its ingredients
//! - The `WELCOME20` coupon

use chrono::Local;
use std::env;
use tracing_subscriber::EnvFilter;

use platter_db::demo::{seed_demo_data, DEMO_COUPON_CODE};
use platter_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./platter_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Platter Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./platter_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Platter Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let today = Local::now().date_naive();
    if !seed_demo_data(&db, today).await? {
        println!("⚠ Demo data already present, nothing to do.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    for dish in db.catalog().list_dishes().await? {
        println!("  {:<16} {:>8}", dish.name, dish.list_price());
    }
    println!();
    for row in db.warehouses().list().await? {
        println!(
            "  {:<16} {:>8} {}",
            row.ingredient_name, row.available_quantity, row.unit
        );
    }

    println!();
    println!("✓ Seed complete! Try coupon {}", DEMO_COUPON_CODE);
    db.close().await;

    Ok(())
}
