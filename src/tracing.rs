//! Tracing (logging)

use crate::cli::CommandLineArgs;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Choose the log filter.
///
/// A valid `RUST_LOG` value wins. Otherwise the configured filter is used.
fn log_filter(rust_log: Option<&str>, configured: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(configured))
}

/// Initialise tracing (logging) with the filter from `RUST_LOG` or `--log-filter`.
pub fn init_tracing(args: &CommandLineArgs) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(log_filter(rust_log.as_deref(), &args.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
