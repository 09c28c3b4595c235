use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::Database;

pub async fn migrate(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let result = db.migrate().await;
    db.close().await;
    result.context("failed to apply migrations")?;

    output_success(&output_format, "Migrations applied", None)
}

pub async fn health(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = match Database::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            output_error(&output_format, &e.to_string(), Some("DATABASE_UNAVAILABLE"))?;
            anyhow::bail!("database unavailable");
        }
    };
    let result = db.health_check().await;
    db.close().await;

    match result {
        Ok(()) => output_success(&output_format, "Database reachable", Some(json!({ "database": "ok" }))),
        Err(e) => {
            output_error(&output_format, &e.to_string(), Some("DATABASE_UNAVAILABLE"))?;
            anyhow::bail!("database unavailable")
        }
    }
}
