use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "membership_console=info";

/// Install the global `tracing` subscriber
///
/// The filter is read from `RUST_LOG`. Logs go to stderr so command output stays clean.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
