use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

/// Connecting already applies the schema; this confirms the store answers afterwards.
pub async fn handle(db: &DatabaseManager, output_format: OutputFormat) -> anyhow::Result<()> {
    db.health_check().await?;
    output_success(output_format, "Schema is up to date", None)
}
