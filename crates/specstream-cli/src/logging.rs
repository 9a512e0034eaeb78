use tracing_subscriber::EnvFilter;

/// Env var holding `EnvFilter` directives.
pub const LOG_ENV: &str = "SPECSTREAM_LOG";

/// Install a stderr subscriber.
///
/// `SPECSTREAM_LOG` wins over `default_filter`. Stdout stays reserved for
/// command output.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}
