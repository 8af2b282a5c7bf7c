/// Installs the fmt subscriber; `RUST_LOG` overrides the default filter.
pub(crate) fn init_tracing() {
    if tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,splitter_tx=info,reqwest=warn,hyper=warn")
            }),
        )
        .with_target(false)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed.
    }
}
