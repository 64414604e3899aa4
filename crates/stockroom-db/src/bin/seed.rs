//! # Seed Data Generator
//!
//! Populates the inventory with sample products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockroom-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! Each product gets a valid EAN-13 barcode (so the scanner finds it), a
//! category, a price with a 60-80% cost, and a stock level spread across
//! in-stock, low-stock and out-of-stock.

use std::env;
use stockroom_core::{Money, NewProduct};
use stockroom_db::{Database, DbConfig};

/// Categories and base product names for sample data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Bebidas",
        &[
            "Agua Mineral",
            "Refresco de Cola",
            "Jugo de Naranja",
            "Té Helado",
            "Café Molido",
            "Bebida Energética",
        ],
    ),
    (
        "Lácteos",
        &[
            "Leche Entera",
            "Leche Deslactosada",
            "Yogur Natural",
            "Queso Fresco",
            "Mantequilla",
            "Crema",
        ],
    ),
    (
        "Despensa",
        &[
            "Arroz Blanco",
            "Frijol Negro",
            "Aceite Vegetal",
            "Azúcar",
            "Harina de Trigo",
            "Pasta Espagueti",
        ],
    ),
    (
        "Snacks",
        &[
            "Papas Fritas",
            "Galletas de Avena",
            "Cacahuates",
            "Chocolate Amargo",
            "Palomitas",
        ],
    ),
    (
        "Limpieza",
        &["Detergente", "Jabón de Barra", "Cloro", "Suavizante"],
    ),
];

const SIZES: &[(&str, i64)] = &[
    ("250g", 0),
    ("500g", 80),
    ("1kg", 190),
    ("1L", 120),
    ("2L", 260),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0usize;
    let mut seed = 0usize;

    'outer: for (category, names) in CATEGORIES {
        for name in names.iter() {
            for (size, addon) in SIZES {
                if generated >= count {
                    break 'outer;
                }
                seed += 1;

                let product = generate_product(category, name, size, *addon, seed);
                if let Err(e) = db.products().create(product).await {
                    eprintln!("Failed to insert {} {}: {}", name, size, e);
                    continue;
                }

                generated += 1;
                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let stats = stockroom_core::InventoryStats::compute(&db.products().list().await?);
    println!(
        "  Low stock: {}  Out of stock: {}  Value: {}",
        stats.low_stock, stats.out_of_stock, stats.total_value
    );

    Ok(())
}

fn generate_product(category: &str, name: &str, size: &str, addon: i64, seed: usize) -> NewProduct {
    let price_cents = 99 + ((seed * 37) % 900) as i64 + addon;
    let cost_pct = 60 + (seed % 21) as i64;

    // Every seventh product sold out, every fifth at its reorder point
    let min_stock = 5 + (seed % 6) as i64;
    let stock = match seed {
        s if s % 7 == 0 => 0,
        s if s % 5 == 0 => min_stock,
        s => min_stock + 1 + (s % 60) as i64,
    };

    NewProduct {
        name: format!("{} {}", name, size),
        barcode: Some(ean13(750_000_000_000 + seed as u64)),
        description: Some(format!("{} presentación {}", name, size)),
        price: Money::from_cents(price_cents),
        cost: Some(Money::from_cents(price_cents * cost_pct / 100)),
        stock,
        min_stock,
        category_name: Some(category.to_string()),
    }
}

/// Appends the EAN-13 check digit to a 12-digit body.
fn ean13(body: u64) -> String {
    let digits = format!("{:012}", body % 1_000_000_000_000);
    let sum: u32 = digits
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 0 {
                d
            } else {
                d * 3
            }
        })
        .sum();
    format!("{}{}", digits, (10 - sum % 10) % 10)
}
