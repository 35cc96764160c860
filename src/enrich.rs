//! Per-row derived columns.
//!
//! Each column is a small pure function of the current observation and, where
//! needed, the rounded price of the row just before it in sequence order.

use crate::error::PipelineError;
use crate::observation::Observation;
use crate::stats::round2;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d T%H:%M:%S";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Same,
}

/// An observation plus every column derived from it and its predecessor.
/// The daily and volatility columns are attached later by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    /// Local wall-clock time, `YYYY-MM-DD THH:MM:SS`.
    pub date: String,
    pub price: f64,
    pub direction: Option<Direction>,
    /// `previous - current`, so a rise yields a negative change.
    pub change: Option<f64>,
    pub day_of_week: String,
    pub high_since_start: Option<bool>,
    pub low_since_start: Option<bool>,
}

/// Drops the sub-second part of an epoch-millisecond timestamp.
pub fn epoch_seconds(timestamp_ms: i64) -> i64 {
    timestamp_ms / 1000
}

pub fn to_datetime<Tz: TimeZone>(
    index: usize,
    timestamp_ms: i64,
    tz: &Tz,
) -> Result<DateTime<Tz>, PipelineError> {
    DateTime::from_timestamp(epoch_seconds(timestamp_ms), 0)
        .map(|utc| utc.with_timezone(tz))
        .ok_or(PipelineError::InvalidTimestamp {
            index,
            timestamp: timestamp_ms,
        })
}

pub fn format_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format(DATE_FORMAT).to_string()
}

pub fn day_of_week<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    dt.format("%A").to_string()
}

/// `None` for the first row, which has nothing to compare against.
pub fn direction(previous: Option<f64>, current: f64) -> Option<Direction> {
    let diff = previous? - current;
    if diff > 0.0 {
        Some(Direction::Down)
    } else if diff < 0.0 {
        Some(Direction::Up)
    } else {
        Some(Direction::Same)
    }
}

pub fn change(previous: Option<f64>, current: f64) -> Option<f64> {
    previous.map(|p| round2(p - current))
}

pub fn high_since_start(direction: Option<Direction>) -> Option<bool> {
    match direction? {
        Direction::Up => Some(true),
        Direction::Down => Some(false),
        Direction::Same => None,
    }
}

pub fn low_since_start(direction: Option<Direction>) -> Option<bool> {
    match direction? {
        Direction::Down => Some(true),
        Direction::Up => Some(false),
        Direction::Same => None,
    }
}

/// Enriches the series in the order given. The order is never changed here,
/// even when the timestamps are not ascending.
pub fn enrich_rows<Tz: TimeZone>(
    observations: &[Observation],
    tz: &Tz,
) -> Result<Vec<EnrichedRow>, PipelineError>
where
    Tz::Offset: fmt::Display,
{
    if observations.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let mut rows = Vec::with_capacity(observations.len());
    let mut previous: Option<f64> = None;

    for (index, obs) in observations.iter().enumerate() {
        let dt = to_datetime(index, obs.timestamp, tz)?;
        let price = round2(obs.price);
        let dir = direction(previous, price);

        rows.push(EnrichedRow {
            date: format_date(&dt),
            price,
            direction: dir,
            change: change(previous, price),
            day_of_week: day_of_week(&dt),
            high_since_start: high_since_start(dir),
            low_since_start: low_since_start(dir),
        });

        previous = Some(price);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    // 2020-05-01 00:00:00 UTC, a Friday
    const T0: i64 = 1_588_291_200_000;
    const DAY: i64 = 86_400_000;

    #[test]
    fn formats_date_and_weekday_at_second_precision() {
        let rows = enrich_rows(&[Observation::new(T0 + 3_723_999, 1.0)], &Utc).unwrap();
        assert_eq!(rows[0].date, "2020-05-01 T01:02:03");
        assert_eq!(rows[0].day_of_week, "Friday");
    }

    #[test]
    fn first_row_has_no_comparison_columns() {
        let rows = enrich_rows(&[Observation::new(T0, 100.004)], &Utc).unwrap();
        let first = &rows[0];
        assert_eq!(first.price, 100.0);
        assert_eq!(first.direction, None);
        assert_eq!(first.change, None);
        assert_eq!(first.high_since_start, None);
        assert_eq!(first.low_since_start, None);
    }

    #[test]
    fn three_day_walkthrough() {
        let obs = [
            Observation::new(T0, 100.004),
            Observation::new(T0 + DAY, 100.006),
            Observation::new(T0 + 2 * DAY, 110.00),
        ];
        let rows = enrich_rows(&obs, &Utc).unwrap();

        assert_eq!(rows[1].price, 100.01);
        assert_eq!(rows[1].direction, Some(Direction::Up));
        assert_eq!(rows[1].change, Some(-0.01));
        assert_eq!(rows[1].day_of_week, "Saturday");

        assert_eq!(rows[2].price, 110.0);
        assert_eq!(rows[2].direction, Some(Direction::Up));
        assert_eq!(rows[2].change, Some(-9.99));
        assert_eq!(rows[2].high_since_start, Some(true));
        assert_eq!(rows[2].low_since_start, Some(false));
    }

    #[test]
    fn same_is_decided_on_rounded_prices() {
        let obs = [Observation::new(T0, 5.001), Observation::new(T0 + 1000, 4.999)];
        let rows = enrich_rows(&obs, &Utc).unwrap();
        assert_eq!(rows[1].direction, Some(Direction::Same));
        assert_eq!(rows[1].change, Some(0.0));
        assert_eq!(rows[1].high_since_start, None);
        assert_eq!(rows[1].low_since_start, None);
    }

    #[test]
    fn down_move_sets_low_flag() {
        let obs = [Observation::new(T0, 10.0), Observation::new(T0 + 1000, 9.5)];
        let rows = enrich_rows(&obs, &Utc).unwrap();
        assert_eq!(rows[1].direction, Some(Direction::Down));
        assert_eq!(rows[1].change, Some(0.5));
        assert_eq!(rows[1].high_since_start, Some(false));
        assert_eq!(rows[1].low_since_start, Some(true));
    }

    #[test]
    fn keeps_arrival_order_for_predecessor() {
        // out of order timestamps: row 1 still compares against row 0
        let obs = [Observation::new(T0 + DAY, 3.0), Observation::new(T0, 1.0)];
        let rows = enrich_rows(&obs, &Utc).unwrap();
        assert_eq!(rows[0].date, "2020-05-02 T00:00:00");
        assert_eq!(rows[1].direction, Some(Direction::Down));
        assert_eq!(rows[1].change, Some(2.0));
    }

    #[test]
    fn empty_series_is_rejected() {
        assert_eq!(enrich_rows(&[], &Utc).unwrap_err(), PipelineError::EmptyInput);
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        let obs = [Observation::new(T0, 1.0), Observation::new(i64::MAX, 2.0)];
        let err = enrich_rows(&obs, &Utc).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTimestamp { index: 1, .. }));
    }

    proptest! {
        #[test]
        fn direction_agrees_with_change(
            prices in prop::collection::vec(0.0..100_000.0f64, 1..60)
        ) {
            let obs: Vec<Observation> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| Observation::new(T0 + i as i64 * 60_000, *p))
                .collect();
            let rows = enrich_rows(&obs, &Utc).unwrap();

            prop_assert_eq!(rows.len(), obs.len());
            prop_assert!(rows[0].direction.is_none() && rows[0].change.is_none());

            for pair in rows.windows(2) {
                let (prev, cur) = (&pair[0], &pair[1]);
                let change = cur.change.unwrap();
                prop_assert_eq!(change, round2(prev.price - cur.price));
                match cur.direction.unwrap() {
                    Direction::Up => {
                        prop_assert!(prev.price < cur.price && change <= 0.0);
                    }
                    Direction::Down => {
                        prop_assert!(prev.price > cur.price && change >= 0.0);
                    }
                    Direction::Same => {
                        prop_assert!(prev.price == cur.price && change == 0.0);
                    }
                }
            }
        }
    }
}
