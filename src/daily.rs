//! Per calendar day statistics over enriched rows.

use crate::enrich::EnrichedRow;
use crate::stats::{mean, round2, sample_variance};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Mean and sample variance of one day's rounded prices, both rounded to two
/// decimals after computation.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyStats {
    pub day: String,
    pub count: usize,
    pub average: f64,
    /// `None` when the day holds a single observation.
    pub variance: Option<f64>,
}

/// Days in first-seen order plus a lookup from day key to position.
#[derive(Debug, Clone, Default)]
pub struct DailyTable {
    pub days: Vec<DailyStats>,
    index: HashMap<String, usize>,
}

impl DailyTable {
    pub fn get(&self, day: &str) -> Option<&DailyStats> {
        self.index.get(day).map(|&i| &self.days[i])
    }
}

/// The calendar part of a `YYYY-MM-DD THH:MM:SS` date string.
pub fn day_key(date: &str) -> &str {
    date.split(" T").next().unwrap_or(date)
}

pub fn daily_stats(day: &str, prices: &[f64]) -> DailyStats {
    DailyStats {
        day: day.to_string(),
        count: prices.len(),
        average: mean(prices).map(round2).unwrap_or(f64::NAN),
        variance: sample_variance(prices).map(round2),
    }
}

/// Groups rows by exact day key, keeping the order in which days first appear.
pub fn aggregate(rows: &[EnrichedRow]) -> DailyTable {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();

    for row in rows {
        let key = day_key(&row.date);
        match index.get(key) {
            Some(&i) => groups[i].1.push(row.price),
            None => {
                index.insert(key.to_string(), groups.len());
                groups.push((key.to_string(), vec![row.price]));
            }
        }
    }

    let days: Vec<DailyStats> = groups
        .iter()
        .map(|(day, prices)| daily_stats(day, prices))
        .collect();

    for d in days.iter().filter(|d| d.variance.is_none()) {
        warn!(day = %d.day, count = d.count, "single observation day, daily variance left empty");
    }
    debug!(days = days.len(), rows = rows.len(), "daily statistics computed");

    DailyTable { days, index }
}
