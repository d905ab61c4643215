use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber for the crate's diagnostics.
///
/// `RUST_LOG` wins over `level`. Returns `false` when the process already has
/// a global subscriber, which is left in place.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
