use crate::error::PipelineError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// --- Raw input as delivered by the history endpoint ---

/// A numeric field as it arrived on the wire. The API sends prices as strings
/// and timestamps as integers, but neither is guaranteed, so nothing is
/// rejected at deserialisation time. Validation happens in [`Observation::parse`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
    #[default]
    Missing,
}

impl Serialize for RawNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawNumber::Int(v) => serializer.serialize_i64(*v),
            RawNumber::Float(v) => serializer.serialize_f64(*v),
            RawNumber::Text(s) => serializer.serialize_str(s),
            RawNumber::Missing => serializer.serialize_none(),
        }
    }
}

struct RawNumberVisitor;

impl<'de> Visitor<'de> for RawNumberVisitor {
    type Value = RawNumber;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a float, an integer, or a string representing a number")
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(RawNumber::Float(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RawNumber::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        Ok(i64::try_from(v).map_or(RawNumber::Float(v as f64), RawNumber::Int))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(RawNumber::Text(v.to_string()))
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(RawNumber::Text(v.to_string()))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(RawNumber::Missing)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(RawNumber::Missing)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawNumberVisitor)
    }
}

impl<'de> Deserialize<'de> for RawNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawNumberVisitor)
    }
}

/// One entry of the `history` array. Unknown fields are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RawObservation {
    #[serde(default)]
    pub timestamp: RawNumber,
    #[serde(default)]
    pub price: RawNumber,
}

// --- Validated observation ---

/// A single (timestamp, price) point. `timestamp` is Unix epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: i64,
    pub price: f64,
}

impl Observation {
    pub fn new(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }

    /// Validates a raw entry. `index` is its position in the series and only
    /// used for error reporting.
    pub fn parse(index: usize, raw: &RawObservation) -> Result<Self, PipelineError> {
        let malformed = |reason: String| PipelineError::MalformedObservation { index, reason };

        let timestamp = match &raw.timestamp {
            RawNumber::Int(v) => *v,
            RawNumber::Float(v) if v.fract() == 0.0 && v.is_finite() => *v as i64,
            RawNumber::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| malformed(format!("timestamp {:?} is not an integer", s)))?,
            RawNumber::Float(v) => return Err(malformed(format!("timestamp {} is not an integer", v))),
            RawNumber::Missing => return Err(malformed("timestamp is missing".to_string())),
        };

        let price = match &raw.price {
            RawNumber::Int(v) => *v as f64,
            RawNumber::Float(v) => *v,
            RawNumber::Text(s) if s.trim().is_empty() => {
                return Err(malformed("price is empty".to_string()));
            }
            RawNumber::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| malformed(format!("price {:?} is not a number", s)))?,
            RawNumber::Missing => return Err(malformed("price is missing".to_string())),
        };

        if !price.is_finite() {
            return Err(malformed(format!("price {} is not finite", price)));
        }

        Ok(Self::new(timestamp, price))
    }
}

/// Validates a whole series, failing on the first bad entry.
pub fn parse_all(raw: &[RawObservation]) -> Result<Vec<Observation>, PipelineError> {
    raw.iter()
        .enumerate()
        .map(|(index, r)| Observation::parse(index, r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawObservation {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_string_and_numeric_prices() {
        let a = Observation::parse(0, &raw(r#"{"price":"9123.45","timestamp":1588291200000}"#)).unwrap();
        assert_eq!(a, Observation::new(1_588_291_200_000, 9123.45));

        let b = Observation::parse(0, &raw(r#"{"price":42,"timestamp":"1588291200000"}"#)).unwrap();
        assert_eq!(b, Observation::new(1_588_291_200_000, 42.0));
    }

    #[test]
    fn ignores_extra_fields() {
        let obs = Observation::parse(0, &raw(r#"{"price":"1.5","timestamp":1000,"volume":"12"}"#)).unwrap();
        assert_eq!(obs, Observation::new(1000, 1.5));
    }

    #[test]
    fn rejects_missing_and_null_fields() {
        let err = Observation::parse(3, &raw(r#"{"price":"1.5"}"#)).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedObservation { index: 3, .. }));

        let err = Observation::parse(1, &raw(r#"{"price":null,"timestamp":1000}"#)).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedObservation { index: 1, .. }));
    }

    #[test]
    fn rejects_unparsable_values() {
        for json in [
            r#"{"price":"","timestamp":1000}"#,
            r#"{"price":"abc","timestamp":1000}"#,
            r#"{"price":"NaN","timestamp":1000}"#,
            r#"{"price":"inf","timestamp":1000}"#,
            r#"{"price":"1.0","timestamp":"soon"}"#,
            r#"{"price":"1.0","timestamp":1000.5}"#,
            r#"{"price":true,"timestamp":1000}"#,
        ] {
            assert!(Observation::parse(0, &raw(json)).is_err(), "{json} should be rejected");
        }
    }

    #[test]
    fn parse_all_reports_first_bad_index() {
        let series: Vec<RawObservation> = serde_json::from_str(
            r#"[{"price":"1","timestamp":1000},{"price":"x","timestamp":2000},{"price":"","timestamp":3000}]"#,
        )
        .unwrap();
        let err = parse_all(&series).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedObservation { index: 1, .. }));
    }

    #[test]
    fn raw_observation_survives_storage_round_trip() {
        let original = raw(r#"{"price":"7000.12","timestamp":1588291200000}"#);
        let text = serde_json::to_string(&original).unwrap();
        assert_eq!(raw(&text), original);
    }
}
