//! One row per calendar day, projected into the two output record shapes.

use crate::daily::day_key;
use crate::enrich::{Direction, EnrichedRow};
use serde::Serialize;
use std::collections::HashSet;

/// An enriched row with the day statistics and the volatility flag joined on.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedRow {
    pub row: EnrichedRow,
    pub daily_average: f64,
    pub daily_variance: Option<f64>,
    pub volatility_alert: bool,
}

/// Calendar and direction columns.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Schema1Row {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Direction")]
    pub direction: Option<Direction>,
    #[serde(rename = "Change")]
    pub change: Option<f64>,
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: String,
    #[serde(rename = "highSinceStart")]
    pub high_since_start: String,
    #[serde(rename = "lowSinceStart")]
    pub low_since_start: String,
}

/// Statistics columns.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Schema2Row {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "dailyAverage")]
    pub daily_average: f64,
    #[serde(rename = "dailyVariance")]
    pub daily_variance: Option<f64>,
    #[serde(rename = "volatilityAlert")]
    pub volatility_alert: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputViews {
    pub schema1: Vec<Schema1Row>,
    pub schema2: Vec<Schema2Row>,
}

/// `"true"`, `"false"` or `""` for an undecided flag.
pub fn flag_str(flag: Option<bool>) -> String {
    flag.map(|b| b.to_string()).unwrap_or_default()
}

/// Keeps the first row seen for each day, in sequence order.
pub fn first_per_day(rows: &[AnalyzedRow]) -> Vec<&AnalyzedRow> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| seen.insert(day_key(&r.row.date).to_string()))
        .collect()
}

impl From<&AnalyzedRow> for Schema1Row {
    fn from(a: &AnalyzedRow) -> Self {
        let r = &a.row;
        Self {
            date: r.date.clone(),
            price: r.price,
            direction: r.direction,
            change: r.change,
            day_of_week: r.day_of_week.clone(),
            high_since_start: flag_str(r.high_since_start),
            low_since_start: flag_str(r.low_since_start),
        }
    }
}

impl From<&AnalyzedRow> for Schema2Row {
    fn from(a: &AnalyzedRow) -> Self {
        Self {
            date: a.row.date.clone(),
            price: a.row.price,
            daily_average: a.daily_average,
            daily_variance: a.daily_variance,
            volatility_alert: a.volatility_alert.to_string(),
        }
    }
}

pub fn project(rows: &[AnalyzedRow]) -> OutputViews {
    let kept = first_per_day(rows);
    OutputViews {
        schema1: kept.iter().map(|&a| Schema1Row::from(a)).collect(),
        schema2: kept.iter().map(|&a| Schema2Row::from(a)).collect(),
    }
}
