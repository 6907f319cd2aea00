//! Diagnostic logging for the command-line tool.
//!
//! Log lines go to stderr so they never mix with converted output.

use std::io;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable naming the base log level, such as `debug`.
pub const LOG_ENV: &str = "YAML12_LOG";

/// The level for `verbosity` repetitions of `-v` on top of `base`.
pub fn level_for(base: LevelFilter, verbosity: u8) -> LevelFilter {
    let requested = match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    base.max(requested)
}

/// Parse a level name from the environment, falling back to `warn`.
pub fn base_level(env: Option<&str>) -> LevelFilter {
    env.and_then(|name| name.trim().parse().ok())
        .unwrap_or(LevelFilter::WARN)
}

/// Install the stderr subscriber.
pub fn init(verbosity: u8) {
    let env = std::env::var(LOG_ENV).ok();
    let level = level_for(base_level(env.as_deref()), verbosity);

    let targets = Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target("libyaml12", level)
        .with_target("yaml12", level);

    let stderr_layer = fmt::layer()
        .compact()
        .without_time()
        .with_target(true)
        .with_writer(io::stderr)
        .with_filter(targets);

    tracing_subscriber::registry().with(stderr_layer).init();
}
