use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// HTTP client internals stay quiet unless asked for explicitly.
const DEFAULT_LOG_DIRECTIVES: &str = "info,hyper_util=warn,reqwest=warn";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` selects the filter (e.g. `RUST_LOG=platform=debug,info` to see
/// every platform request). Output goes to stderr so that stdout stays
/// reserved for the `key=value` lines the CLI prints. Later calls are no-ops.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref());
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(false)
            .with_env_filter(filter)
            .try_init();
    });
}

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}
