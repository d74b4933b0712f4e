use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Output goes to stderr so query results on
/// stdout stay machine-readable.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pink_morsel={0},pink_morsel_sales={0}", default_level)));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // try_init: a second call (tests, embedding) is not an error
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
