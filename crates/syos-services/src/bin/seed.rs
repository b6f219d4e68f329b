//! # Seed Data Generator
//!
//! Populates a development database with products, and optionally a few
//! sales, through the same services the tills use.
//!
//! ## Usage
//! ```bash
//! # 200 products into the configured database (default)
//! cargo run -p syos-services --bin seed
//!
//! # Custom amount, explicit file, 25 random sales
//! cargo run -p syos-services --bin seed -- --count 500 --db ./data/syos.db --sales 25
//! ```
//!
//! ## Generated Products
//! - Code: `{CATEGORY}-{NAME}-{NNN}`, e.g. `DRY-WHO-012`
//! - Price: 0.99 - 9.99 plus a size addon
//! - Store 0-120, shelf 0-40, reorder level 5-14
//! - Dairy and bakery items expire 3-20 days after purchase

use std::env;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use syos_core::{Product, ProductState, SaleDraft, SaleLine};
use syos_services::{init_tracing, AppContext, ServiceError, SyosConfig};

/// (code prefix, category name, perishable, product names)
const CATEGORIES: &[(&str, &str, bool, &[&str])] = &[
    (
        "BEV",
        "Beverages",
        false,
        &["Cola", "Lemonade", "Orange Juice", "Iced Tea", "Mineral Water", "Ginger Beer"],
    ),
    (
        "SNK",
        "Snacks",
        false,
        &["Potato Chips", "Salted Peanuts", "Chocolate Bar", "Crackers", "Popcorn"],
    ),
    (
        "DRY",
        "Dairy",
        true,
        &["Whole Milk", "Cheddar", "Yogurt", "Butter", "Cream", "Curd"],
    ),
    (
        "BAK",
        "Bakery",
        true,
        &["White Bread", "Wheat Bread", "Buns", "Croissant", "Sponge Cake"],
    ),
    (
        "GRO",
        "Grocery",
        false,
        &["Basmati Rice", "Red Lentils", "Sugar", "Flour", "Sea Salt", "Tea Leaves"],
    ),
];

const SIZES: &[(&str, i64)] = &[("Small", 0), ("Regular", 80), ("Large", 190), ("Family", 350)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut count: usize = 200;
    let mut sales: usize = 0;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" if i + 1 < args.len() => {
                count = args[i + 1].parse().unwrap_or(200);
                i += 1;
            }
            "--sales" | "-s" if i + 1 < args.len() => {
                sales = args[i + 1].parse().unwrap_or(0);
                i += 1;
            }
            "--db" | "-d" if i + 1 < args.len() => {
                db_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--config" if i + 1 < args.len() => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--help" | "-h" => {
                println!("SYOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of products to generate (default: 200)");
                println!("  -s, --sales <N>      Number of random sales to record (default: 0)");
                println!("  -d, --db <PATH>      Database file (default: from syos.toml)");
                println!("      --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = SyosConfig::load_or_default(config_path);
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("SYOS Seed Data Generator");
    println!("========================");
    println!("Database: {}", config.database.path.display());
    println!("Products: {}", count);
    println!();

    let ctx = AppContext::bootstrap(&config).await?;

    let existing = ctx.db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products, skipping product seed.", existing);
    } else {
        let start = std::time::Instant::now();
        let generated = seed_products(&ctx, count).await;
        println!(
            "Generated {} products in {:?}",
            generated,
            start.elapsed()
        );
    }

    if sales > 0 {
        let recorded = seed_sales(&ctx, sales).await?;
        println!("Recorded {} of {} sales", recorded, sales);
    }

    let low = ctx.inventory.get_low_stock_products().await?;
    println!("Products at or below reorder level: {}", low.len());

    ctx.db.close().await;
    println!("Seed complete.");
    Ok(())
}

async fn seed_products(ctx: &AppContext, count: usize) -> usize {
    let mut generated = 0;

    'outer: for (cat_idx, (prefix, category, perishable, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = cat_idx * 1000 + name_idx * 20 + size_idx;
                let product = generate_product(prefix, category, *perishable, name, size, *addon, seed);
                let code = product.code.clone();

                match ctx.inventory.add_product(product).await {
                    Ok(_) => generated += 1,
                    Err(e) => warn!(code = %code, error = %e, "Skipping product"),
                }
            }
        }
    }

    info!(generated, "Products seeded");
    generated
}

/// Records `count` one- or two-line card sales against products that have
/// shelf stock. Out-of-stock picks are skipped, not fatal.
async fn seed_sales(ctx: &AppContext, count: usize) -> Result<usize, ServiceError> {
    let stocked: Vec<Product> = ctx
        .inventory
        .get_all_products()
        .await?
        .into_iter()
        .filter(|p| p.quantity_on_shelf > 0)
        .collect();

    if stocked.is_empty() {
        warn!("No product has shelf stock; no sales recorded");
        return Ok(0);
    }

    let mut recorded = 0;
    for n in 0..count {
        let first = &stocked[(n * 7) % stocked.len()];
        let second = &stocked[(n * 13 + 5) % stocked.len()];
        let mut lines = vec![SaleLine::new(first.code.clone(), 1 + (n % 3) as i64)];
        if n % 2 == 0 && second.code != first.code {
            lines.push(SaleLine::new(second.code.clone(), 1));
        }

        match ctx
            .sales
            .create_sale(SaleDraft::card(), &lines, &format!("seed-cashier-{}", n % 4 + 1))
            .await
        {
            Ok(_) => recorded += 1,
            Err(ServiceError::InsufficientStock { code, .. }) => {
                info!(code = %code, "Shelf empty, sale skipped");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(recorded)
}

/// Builds one product with deterministic pseudo-random figures.
fn generate_product(
    prefix: &str,
    category: &str,
    perishable: bool,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();
    let today = now.date_naive();

    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let code = format!("{}-{}-{:03}", prefix, short, seed % 1000);

    let purchase_date = today - Duration::days((seed % 10) as i64);
    let expiry_date = perishable.then(|| purchase_date + Duration::days(3 + (seed % 18) as i64));

    Product {
        code,
        name: format!("{} {}", name, size),
        category: category.to_string(),
        unit_price_cents: 99 + ((seed * 17) % 900) as i64 + price_addon,
        quantity_in_store: ((seed * 31) % 121) as i64,
        quantity_on_shelf: ((seed * 7) % 41) as i64,
        reorder_level: 5 + (seed % 10) as i64,
        // Derived by add_product
        state: ProductState::Available,
        purchase_date,
        expiry_date,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}
