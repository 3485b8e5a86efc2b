use tracing_subscriber::{fmt, EnvFilter};

/// Diagnostics go to stderr so that stdout carries only the JSON dump.
pub(crate) fn tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
