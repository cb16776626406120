//! Process-wide tracing setup. Logs go to stderr; stdout carries results.

use tracing_subscriber::EnvFilter;

/// `-v` wins over the environment; otherwise `COURTBOOK_LOG`, then
/// `RUST_LOG`, then `info`.
pub fn init(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("COURTBOOK_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
