use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "sheet_ledger_lib=warn";
const VERBOSE_LOG_FILTER: &str = "sheet_ledger_lib=info";

/// Pick the filter: RUST_LOG, then the configured directive, then the verbosity default
fn resolve_filter(verbose: bool, configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let fallback = if verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER };
        configured
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(fallback))
    })
}

/// Send diagnostics to stderr so stdout only carries query output
pub fn init_logging(verbose: bool, configured: Option<&str>) {
    let filter = resolve_filter(verbose, configured);

    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
