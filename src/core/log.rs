//! Tracing subscriber setup for the binary

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = "fxconv";

/// Filter for this crate's own events, driven by `--verbose`.
///
/// When `RUST_LOG` is set it has the last word, so no extra filter is added.
fn app_targets(verbose: bool, env_configured: bool) -> Option<Targets> {
    if env_configured {
        return None;
    }
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    Some(Targets::new().with_target(APP_TARGET, level))
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "off" }))
}

/// Logs go to stderr so they never interleave with conversion output on stdout.
pub fn init_logging(verbose: bool) {
    let env_configured = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(app_targets(verbose, env_configured))
        .with(env_filter(verbose))
        .init();
}
