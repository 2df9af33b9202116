//! # Seed Data Generator
//!
//! Populates the database with a catalog and receipt history for development.
//!
//! ## Usage
//! ```bash
//! # 200 receipts spread over the last 60 days (default)
//! cargo run -p billing-db --bin seed
//!
//! # Custom amount
//! cargo run -p billing-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p billing-db --bin seed -- --db ./data/billing.db
//! ```
//!
//! ## Generated Data
//! - One admin account `seed@example.com` whose password hash is locked,
//!   so it can own receipts but never log in (billing-api bootstraps the
//!   login-capable admin from its configuration)
//! - A small catalog of spa products
//! - Receipts mixing standard and bundle packages, some with free lines,
//!   backdated over the last 60 days so dashboards show trends

use std::env;

use billing_core::pricing::{LineRequest, NewReceipt};
use billing_core::{Money, PricingPolicy, DEFAULT_BUNDLE_NAME, STANDARD_PACKAGE};
use billing_db::{Database, DbConfig, NewProduct, NewUser};
use chrono::{Duration, Utc};

/// Catalog entries: (name, unit price in cents).
const PRODUCTS: &[(&str, i64)] = &[
    ("Aroma Oil", 12_000),
    ("Body Scrub", 18_500),
    ("Face Mask", 7_500),
    ("Foot Soak", 5_000),
    ("Hair Serum", 9_900),
    ("Hot Stone Set", 25_000),
    ("Towel Wrap", 3_000),
];

/// Fixed bundle prices cycled through for bundle receipts.
const BUNDLE_PRICES: &[i64] = &[45_000, 60_000, 75_000];

/// Payment modes cycled through.
const PAYMENT_MODES: &[&str] = &["Cash", "Card", "Online"];

/// A locked hash never verifies, so the seed account cannot authenticate.
const LOCKED_PASSWORD_HASH: &str = "!locked";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./billing_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--count" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "-d" | "--db" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "-h" | "--help" => {
                println!("Billing Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of receipts to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./billing_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Billing Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Receipts: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.receipts().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} receipts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let seeder = db
        .users()
        .insert(
            &NewUser {
                user_name: "Seed Admin".to_string(),
                email: "seed@example.com".to_string(),
                password_hash: LOCKED_PASSWORD_HASH.to_string(),
                is_admin: true,
            },
            None,
        )
        .await?;

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, cents) in PRODUCTS {
        let product = db
            .products()
            .insert(
                &NewProduct {
                    name: name.to_string(),
                    unit_price: Money::from_cents(*cents),
                },
                Some(&seeder.user_id),
            )
            .await?;
        product_ids.push((product.prod_id, *cents));
    }
    println!("✓ Inserted {} products", product_ids.len());

    println!();
    println!("Generating receipts...");

    let policy = PricingPolicy::default();
    let start = std::time::Instant::now();
    let now = Utc::now();
    let mut generated = 0;

    for seed in 0..count {
        let request = generate_receipt(seed, &product_ids);

        let record = match db.receipts().create(&request, &seeder.user_id, &policy).await {
            Ok(record) => record,
            Err(e) => {
                eprintln!("Failed to insert receipt {}: {}", seed, e);
                continue;
            }
        };

        // Spread history: receipt `seed` lands (seed % 60) days ago at a varied hour.
        let created_at = now
            - Duration::days((seed % 60) as i64)
            - Duration::minutes(((seed * 37) % (10 * 60)) as i64);
        sqlx::query(
            "UPDATE receipts SET created_at = ?2, updated_at = ?2 WHERE receipt_id = ?1",
        )
        .bind(&record.receipt.receipt_id)
        .bind(created_at)
        .execute(db.pool())
        .await?;
        sqlx::query("UPDATE receipt_items SET created_at = ?2 WHERE receipt_id = ?1")
            .bind(&record.receipt.receipt_id)
            .bind(created_at)
            .execute(db.pool())
            .await?;

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} receipts...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} receipts in {:?}", generated, elapsed);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one receipt request with deterministic variety.
fn generate_receipt(seed: usize, products: &[(String, i64)]) -> NewReceipt {
    let line_count = 1 + seed % 3;
    let items = (0..line_count)
        .map(|offset| {
            let (prod_id, unit_cents) = &products[(seed + offset * 3) % products.len()];
            // Vendor price wanders between 90% and 110% of the list price.
            let vendor_pct = 90 + ((seed * 7 + offset) % 21) as i64;
            LineRequest {
                prod_id: prod_id.clone(),
                quantity: 1 + ((seed + offset) % 4) as i64,
                is_free: seed % 11 == 0 && offset > 0,
                vendor_price: Money::from_cents(unit_cents * vendor_pct / 100),
            }
        })
        .collect();

    let is_bundle = seed % 5 == 0;
    NewReceipt {
        recipient_name: format!("Customer {:03}", seed),
        recipient_number: Some(format!("0300-{:07}", seed * 7919 % 10_000_000)),
        package: if is_bundle {
            DEFAULT_BUNDLE_NAME.to_string()
        } else {
            STANDARD_PACKAGE.to_string()
        },
        package_amt: is_bundle.then(|| Money::from_cents(BUNDLE_PRICES[seed % BUNDLE_PRICES.len()])),
        payment_mode: PAYMENT_MODES[seed % PAYMENT_MODES.len()].to_string(),
        transaction_number: (seed % 3 != 0).then(|| format!("TXN{:06}", seed)),
        items,
    }
}
