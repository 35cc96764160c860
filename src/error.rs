use thiserror::Error;

/// Errors raised while turning raw history into the two output views.
///
/// Every variant is fatal for the run: the pipeline never emits a partial result.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("price history is empty, nothing to enrich")]
    EmptyInput,

    #[error("observation #{index} is malformed: {reason}")]
    MalformedObservation { index: usize, reason: String },

    #[error("observation #{index} has a timestamp outside the representable range: {timestamp}")]
    InvalidTimestamp { index: usize, timestamp: i64 },

    #[error("need at least {needed} prices for a sample statistic, found {found}")]
    InsufficientSampleSize { needed: usize, found: usize },
}
