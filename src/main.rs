//! Restock Tracker - pickup availability monitor
//!
//! Checks configured (product, store) pairs, records every check in SQLite,
//! sends an alert when an item comes back in stock and predicts restocks.

use clap::{Parser, Subcommand};
use restock_tracker::{Monitor, MonitorConfig, RestockTracker};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Pickup availability monitor with restock prediction
#[derive(Parser, Debug)]
#[command(name = "restock_tracker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_path("restock_history.db"))]
    database: String,

    /// Path to the JSON monitor configuration
    #[arg(short, long, default_value_t = default_path("config.json"))]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every configured product at every configured store once
    Check,
    /// Check continuously on the configured interval
    Run {
        /// Also serve the JSON API on this port
        #[arg(long)]
        web_port: Option<u16>,
    },
    /// Record a manual availability observation
    Record {
        store_id: String,
        product_id: String,
        #[arg(action = clap::ArgAction::Set)]
        available: bool,
    },
    /// Show restock patterns for a store/product pair
    Patterns { store_id: String, product_id: String },
    /// Predict the next restock for a store/product pair
    Predict { store_id: String, product_id: String },
    /// Show recent checks for a store/product pair
    History {
        store_id: String,
        product_id: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Add a product to the configuration
    AddProduct { product_code: String, product_name: String },
    /// Add a store to the configuration
    AddStore { store_code: String, store_name: String },
    /// Show configuration and tracked keys
    Status,
    /// Serve the JSON API only
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Returns a path under the user data dir: ~/.local/share/restock_tracker/{file}
fn default_path(file: &str) -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("restock_tracker")
        .join(file)
        .to_string_lossy()
        .to_string()
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize output: {}", e),
    }
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    log::error!("{}: {}", context, e);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config_path = PathBuf::from(&args.config);
    let db_path = PathBuf::from(&args.database);

    let mut config = MonitorConfig::load_or_create(&config_path)
        .unwrap_or_else(|e| fail("Failed to load config", e));

    match args.command {
        Command::AddProduct {
            product_code,
            product_name,
        } => {
            if config.add_product(&product_code, &product_name) {
                config
                    .save(&config_path)
                    .unwrap_or_else(|e| fail("Failed to save config", e));
                log::info!("Added product: {}", product_name);
            } else {
                log::warn!("Product already being monitored: {}", product_code);
            }
        }
        Command::AddStore {
            store_code,
            store_name,
        } => {
            if config.add_store(&store_code, &store_name) {
                config
                    .save(&config_path)
                    .unwrap_or_else(|e| fail("Failed to save config", e));
                log::info!("Added store: {}", store_name);
            } else {
                log::warn!("Store already being monitored: {}", store_code);
            }
        }
        command => run_command(command, config, &db_path).await,
    }
}

/// Commands that need the database
async fn run_command(command: Command, config: MonitorConfig, db_path: &Path) {
    let tz = config
        .timezone()
        .unwrap_or_else(|e| fail("Invalid timezone", e));
    let tracker =
        RestockTracker::open(db_path, tz).unwrap_or_else(|e| fail("Failed to open database", e));

    match command {
        Command::Check => {
            let monitor = Monitor::from_config(tracker, config);
            let report = monitor
                .check_once()
                .await
                .unwrap_or_else(|e| fail("Check failed", e));
            if report.errors > 0 {
                std::process::exit(2);
            }
        }
        Command::Run { web_port } => {
            if let Some(port) = web_port {
                let web_tracker = tracker.clone();
                tokio::spawn(async move {
                    if let Err(e) = restock_tracker::web::serve(web_tracker, port).await {
                        log::error!("Web server error: {}", e);
                    }
                });
            }
            let monitor = Monitor::from_config(tracker, config);
            if let Err(e) = monitor.run().await {
                fail("Monitoring failed", e);
            }
        }
        Command::Record {
            store_id,
            product_id,
            available,
        } => {
            let outcome = tracker
                .record_observation(&store_id, &product_id, available)
                .unwrap_or_else(|e| fail("Failed to record observation", e));
            print_json(&outcome);
        }
        Command::Patterns {
            store_id,
            product_id,
        } => {
            let patterns = tracker
                .get_patterns(&store_id, &product_id)
                .unwrap_or_else(|e| fail("Failed to load patterns", e));
            print_json(&patterns);
        }
        Command::Predict {
            store_id,
            product_id,
        } => {
            let prediction = tracker
                .predict_next_restock(&store_id, &product_id)
                .unwrap_or_else(|e| fail("Failed to predict", e));
            print_json(&prediction);
        }
        Command::History {
            store_id,
            product_id,
            limit,
        } => {
            let history = tracker
                .observation_history(&store_id, &product_id, limit)
                .unwrap_or_else(|e| fail("Failed to load history", e));
            print_json(&history);
        }
        Command::Status => {
            println!("Products ({}):", config.products_to_monitor.len());
            for product in &config.products_to_monitor {
                println!("  - {} ({})", product.product_name, product.product_code);
            }
            println!("Stores ({}):", config.stores_to_monitor.len());
            for store in &config.stores_to_monitor {
                println!("  - {} ({})", store.store_name, store.store_code);
            }
            println!("Check interval: {} minute(s)", config.check_interval_minutes);
            println!("Timezone: {}", tz);

            let keys = tracker
                .tracked_keys()
                .unwrap_or_else(|e| fail("Failed to load tracked keys", e));
            println!("Tracked keys ({}):", keys.len());
            for key in keys {
                println!(
                    "  - {} @ {}: {} check(s), {} restock(s), last checked {}",
                    key.product_id, key.store_id, key.checks, key.restocks, key.last_checked
                );
            }
        }
        Command::Serve { port } => {
            if let Err(e) = restock_tracker::web::serve(tracker, port).await {
                fail("Web server error", e);
            }
        }
        Command::AddProduct { .. } | Command::AddStore { .. } => {}
    }
}
