use sqlx::mysql::MySqlPool;
use tracing::debug;

pub mod balance;
pub mod client;
pub mod collector;
pub mod payout;
pub mod transaction;

/// Initialize the MySQL connection pool and create tables
pub async fn init_db() -> Result<MySqlPool, sqlx::Error> {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL not set in .env file");

    let pool = MySqlPool::connect(&database_url).await?;

    // Create all tables and the balance view
    create_tables(&pool).await?;

    Ok(pool)
}

/// Read and execute SQL file for creating tables
async fn execute_sql_file(pool: &MySqlPool, file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let sql_content = std::fs::read_to_string(file_path)
        .map_err(|e| format!("Failed to read {}: {}", file_path, e))?;

    // Statements are separated by DELIMITER markers; execute them one by one
    for statement in sql_content.split("//").skip(1) {
        let trimmed = statement.trim();
        if !trimmed.is_empty() && trimmed != "DELIMITER ;" {
            if let Err(e) = sqlx::raw_sql(trimmed).execute(pool).await {
                // Tables and views are IF NOT EXISTS / OR REPLACE, so this
                // only fires for objects that already exist
                debug!("Schema statement skipped: {}", e);
            }
        }
    }

    Ok(())
}

/// Create all database tables
async fn create_tables(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    if let Err(e) = execute_sql_file(pool, "migrations/create_tables.sql").await {
        tracing::warn!("Failed to create tables: {}", e);
    }

    Ok(())
}
