use std::sync::Once;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Crates whose log level is raised by [`setup_tracing`].
const TARGETS: [&str; 4] = ["otfmi_core", "otfmi_beam", "otfmi_study", "otfmi"];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log filter directive: {0}")]
    Filter(#[from] ParseError),
    #[error("a global tracing subscriber is already set")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install a global subscriber that writes to stderr.
///
/// `RUST_LOG` is honoured; on top of it the otfmi crates log at `info`, or `debug` when `debug`
/// is set. Fails if the process already has a global subscriber.
pub fn setup_tracing(debug: bool) -> Result<(), LoggingError> {
    // Plugins share stdout with their host, so keep it clean.
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let filter_level = if debug { "debug" } else { "info" };

    let mut filter = EnvFilter::from_default_env();
    for target in TARGETS {
        filter = filter.add_directive(format!("{target}={filter_level}").parse()?);
    }

    let subscriber = Registry::default().with(stderr_layer).with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Install the stderr subscriber once per process from a plugin entry point.
///
/// A subscriber the host already installed is left in place.
pub fn setup_plugin_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        if let Err(LoggingError::Filter(e)) = setup_tracing(false) {
            eprintln!("otfmi: could not configure logging: {e}");
        }
    });
}
