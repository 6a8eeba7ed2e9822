use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use susu_ledger::db;

/// Connects to the database from .env and runs the schema bootstrap.
/// The ledger itself is consumed as a library; this binary only prepares
/// the schema it expects.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("susu_ledger=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("Initializing database...");
    match db::init_db().await {
        Ok(_) => {
            info!("Database initialized successfully");
            info!("Schema is ready");
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    }
}
