//! # Seed Data Generator
//!
//! Populates the database with a development inventory of rental units.
//!
//! ## Usage
//! ```bash
//! # Seed the default inventory
//! cargo run -p kitrent-db --bin seed
//!
//! # Custom units per variant
//! cargo run -p kitrent-db --bin seed -- --per-variant 5
//!
//! # Specify database path
//! cargo run -p kitrent-db --bin seed -- --db ./data/kitrent.db
//! ```
//!
//! ## Generated Inventory
//! One fixed variant id per rentable SKU (kayaks, tents, e-bikes, ...) with
//! N physically tracked units each, labelled `{CODE}-{NN}`. The variant ids
//! are stable so an `InMemoryCatalog` in demos and tests can mirror them.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use kitrent_core::{Unit, UnitStatus};
use kitrent_db::{Database, DbConfig};

/// (variant id, asset-tag code, product name) per rentable SKU.
///
/// Variant ids are fixed UUIDs, not generated, so repeated seeds and demo
/// catalogs agree on them.
const VARIANTS: &[(&str, &str, &str)] = &[
    (
        "7b1e9a60-0000-4000-8000-000000000001",
        "KAYAK",
        "Touring Kayak",
    ),
    (
        "7b1e9a60-0000-4000-8000-000000000002",
        "TENT",
        "4-Person Tent",
    ),
    (
        "7b1e9a60-0000-4000-8000-000000000003",
        "EBIKE",
        "Electric Mountain Bike",
    ),
    (
        "7b1e9a60-0000-4000-8000-000000000004",
        "SUP",
        "Stand-Up Paddleboard",
    ),
    (
        "7b1e9a60-0000-4000-8000-000000000005",
        "GOPRO",
        "Action Camera Kit",
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut per_variant: usize = 3;
    let mut db_path = String::from("./kitrent_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--per-variant" | "-n" => {
                if i + 1 < args.len() {
                    per_variant = args[i + 1].parse().unwrap_or(3);
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
                println!("Kitrent Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --per-variant <N>  Units per variant (default: 3)");
                println!("  -d, --db <PATH>        Database file path (default: ./kitrent_dev.db)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kitrent Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Units per variant: {}", per_variant);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing inventory
    let existing = db.units().count_rentable(VARIANTS[0].0).await?;
    if existing > 0 {
        println!("⚠ Database already has seeded units");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating inventory...");

    let mut generated = 0;
    for (variant_id, code, name) in VARIANTS {
        for n in 1..=per_variant {
            let now = Utc::now();
            let unit = Unit {
                id: Uuid::new_v4().to_string(),
                variant_id: variant_id.to_string(),
                label: Some(format!("{}-{:02}", code, n)),
                status: UnitStatus::Rentable,
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = db.units().insert(&unit).await {
                eprintln!("Failed to insert {}: {}", code, e);
                continue;
            }
            generated += 1;
        }

        println!("  {} × {} ({})", per_variant, name, code);
    }

    println!();
    println!("✓ Generated {} units across {} variants", generated, VARIANTS.len());
    println!("✓ Seed complete!");

    Ok(())
}
