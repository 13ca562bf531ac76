use anyhow::{Context, Result};
use tracing::info;

use folio::api;
use folio::db::Database;
use folio::environment::Settings;
use folio::logging::configure_logging;

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let settings = Settings::from_env();
    info!(
        "Starting folio API (database: {}, port: {})",
        settings.database_path, settings.port
    );

    let db = Database::new(&settings)
        .await
        .with_context(|| format!("Failed to open database '{}'", settings.database_path))?;

    let stats = db.collect_stats().await?;
    info!("Database ready (technologies:tags:projects = {})", stats);

    api::serve(db, settings.port).await
}
