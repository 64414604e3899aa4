//! # stockroom
//!
//! ```text
//! stockroom [--config PATH] [serve]        HTTP API (default)
//! stockroom scan                           keyboard-wedge scan station
//! stockroom export --format xlsx|sql       write an export file
//!                  [--out PATH] [--locale es|en]
//!                  [--q TEXT] [--category NAME] [--stock FILTER]
//! ```

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stockroom_core::{CategoryFilter, Product, ProductFilter, StockFilter};
use stockroom_db::Database;
use stockroom_export::{file_name, ExportFormat, Locale};
use stockroom_server::{router, scan, shutdown_signal, AppState, StockroomConfig};

const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

#[derive(Debug, Parser)]
#[command(name = "stockroom", version, about = "Inventory service with barcode capture and export")]
struct Cli {
    /// Config file (default: platform config dir, stockroom.toml)
    #[arg(long, global = true, env = "STOCKROOM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,

    /// Read barcodes from a keyboard-wedge scanner and look them up
    Scan,

    /// Export the catalog to a file
    Export {
        #[arg(long)]
        format: ExportFormat,

        /// Output path (default: <prefix>_<date>.<ext> in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        locale: Option<Locale>,

        /// Only products whose name, barcode or category contains this text
        #[arg(long)]
        q: Option<String>,

        /// "all", "uncategorized" or an exact category name
        #[arg(long)]
        category: Option<String>,

        /// all, in-stock, low-stock or out-of-stock
        #[arg(long)]
        stock: Option<StockFilter>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = StockroomConfig::load(cli.config).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Scan => {
            let db = Database::new(config.database.to_db_config()).await?;
            let result = scan::run(db.clone(), config.capture.clone()).await;
            db.close().await;
            result
        }
        Command::Export {
            format,
            out,
            locale,
            q,
            category,
            stock,
        } => {
            let filter = ProductFilter {
                q,
                category: category.map(CategoryFilter::from).unwrap_or_default(),
                stock: stock.unwrap_or_default(),
            };
            export(config, format, out, locale, filter).await
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn serve(config: StockroomConfig) -> anyhow::Result<()> {
    info!("Starting Stockroom server...");

    let db = Database::new(config.database.to_db_config()).await?;
    let addr = config.server.bind_address();
    let state = AppState::new(db.clone(), config);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn export(
    mut config: StockroomConfig,
    format: ExportFormat,
    out: Option<PathBuf>,
    locale: Option<Locale>,
    filter: ProductFilter,
) -> anyhow::Result<()> {
    if let Some(locale) = locale {
        config.export.locale = locale;
    }

    let db = Database::new(config.database.to_db_config()).await?;
    let products = db.products().list_filtered(&filter).await?;
    let visible: Vec<&Product> = products.iter().collect();

    let now = Utc::now();
    let path = out.unwrap_or_else(|| PathBuf::from(file_name(&config.export, now, format)));

    stockroom_export::write_to(&path, format, &visible, &config.export, now)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    db.close().await;
    println!("Exported {} products to {}", visible.len(), path.display());
    Ok(())
}
