mod comfy_table;
mod daily;
mod enrich;
mod error;
mod history;
mod logger;
mod observation;
mod pipeline;
mod schema;
mod stats;
mod storage_utils;
mod volatility;

use storage_utils::AsyncStorageManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_tracing();

    let storage = AsyncStorageManager::new_relative("storage").await?;
    let config = storage.load_or_init_config().await?;

    // Step 1: Fetch History
    tracing::info!(coin = config.history.coin_id, period = %config.history.period, "step 1: fetching history");
    if let Err(e) = history::run(&config.history, &storage).await {
        tracing::error!(error = %e, "fetching history failed");
        return Err(e);
    }

    // Step 2: Analyze
    tracing::info!("step 2: enriching and aggregating");
    let output = match pipeline::run(&storage, &config.pipeline).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(error = %e, "analysis failed");
            return Err(e);
        }
    };

    // Step 3: Display Results
    comfy_table::run(&output.views, &config.output)?;

    tracing::info!(
        schema1 = %output.schema1_path.display(),
        schema2 = %output.schema2_path.display(),
        "results saved"
    );

    Ok(())
}
