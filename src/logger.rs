use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Log to stderr so stdout only carries the tables or JSON records.
/// Level comes from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    tracing_subscriber::registry().with(env_filter).with(layer).init();
}
