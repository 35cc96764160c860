//! Runs the analysis over a complete price history:
//! 1. Enrich every row against its predecessor.
//! 2. Compute per-day statistics and the global volatility threshold.
//! 3. Join both onto the rows.
//! 4. Keep the first row per day and project the two output views.

use crate::daily::{self, DailyTable, day_key};
use crate::enrich::{self, EnrichedRow};
use crate::error::PipelineError;
use crate::history::HISTORY_FILE;
use crate::observation::{self, Observation, RawObservation};
use crate::schema::{self, AnalyzedRow, OutputViews};
use crate::storage_utils::{AsyncStorageManager, PipelineConfig, run_stamp};
use crate::volatility::VolatilityThreshold;
use anyhow::Result;
use chrono::{Local, TimeZone};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

pub fn is_time_ordered(observations: &[Observation]) -> bool {
    observations.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

/// Attaches the day statistics and volatility flag to every row.
pub fn broadcast(
    rows: Vec<EnrichedRow>,
    table: &DailyTable,
    threshold: &VolatilityThreshold,
) -> Vec<AnalyzedRow> {
    rows.into_iter()
        .map(|row| {
            // every row's day was seen by `aggregate`
            let (daily_average, daily_variance) = table
                .get(day_key(&row.date))
                .map(|d| (d.average, d.variance))
                .unwrap_or((f64::NAN, None));
            let volatility_alert = threshold.is_alert(row.price);
            AnalyzedRow {
                row,
                daily_average,
                daily_variance,
                volatility_alert,
            }
        })
        .collect()
}

/// Enrich, aggregate, classify and join. Returns every row, before de-duplication.
pub fn analyze_rows<Tz: TimeZone>(
    observations: &[Observation],
    tz: &Tz,
    config: &PipelineConfig,
) -> Result<Vec<AnalyzedRow>, PipelineError>
where
    Tz::Offset: fmt::Display,
{
    if observations.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let sorted;
    let observations = if config.sort_by_timestamp {
        let mut v = observations.to_vec();
        v.sort_by_key(|o| o.timestamp);
        sorted = v;
        &sorted[..]
    } else {
        if !is_time_ordered(observations) {
            warn!("history is not in timestamp order, direction uses arrival order");
        }
        observations
    };

    let rows = enrich::enrich_rows(observations, tz)?;

    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    let threshold = VolatilityThreshold::from_prices(&prices)?;
    let table = daily::aggregate(&rows);

    Ok(broadcast(rows, &table, &threshold))
}

pub fn analyze<Tz: TimeZone>(
    observations: &[Observation],
    tz: &Tz,
    config: &PipelineConfig,
) -> Result<OutputViews, PipelineError>
where
    Tz::Offset: fmt::Display,
{
    let rows = analyze_rows(observations, tz, config)?;
    Ok(schema::project(&rows))
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub views: OutputViews,
    pub schema1_path: PathBuf,
    pub schema2_path: PathBuf,
}

/// Loads the stored history, analyses it in local time and saves both views
/// as `schema_1_<stamp>.json` / `schema_2_<stamp>.json`.
#[instrument(skip_all)]
pub async fn run(storage: &AsyncStorageManager, config: &PipelineConfig) -> Result<PipelineOutput> {
    let raw: Vec<RawObservation> = storage.load(HISTORY_FILE).await?;
    let observations = observation::parse_all(&raw)?;
    let views = analyze(&observations, &Local, config)?;

    let stamp = run_stamp();
    let schema1_path = storage.save(&format!("schema_1_{}", stamp), &views.schema1).await?;
    let schema2_path = storage.save(&format!("schema_2_{}", stamp), &views.schema2).await?;

    info!(
        observations = observations.len(),
        days = views.schema1.len(),
        schema1 = %schema1_path.display(),
        schema2 = %schema2_path.display(),
        "views saved"
    );

    Ok(PipelineOutput {
        views,
        schema1_path,
        schema2_path,
    })
}
