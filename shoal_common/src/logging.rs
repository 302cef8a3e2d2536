//! Structured logging setup shared by every shoal binary.

/// Install a `tracing` subscriber reading its filter from `RUST_LOG`
/// (defaulting to `info`). Safe to call once per process.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(
            "info".parse().expect("static filter directive is valid"),
        ))
        .try_init();
}
