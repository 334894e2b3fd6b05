use tracing_subscriber::EnvFilter;

/// Initialize hub logging. Honors `RUST_LOG`; defaults to info-level
/// output. Safe to call more than once (later calls are no-ops), so
/// tests and embedding servers can both use it.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok();
}
