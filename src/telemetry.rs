//! Bunyan-formatted JSON logging for binaries built on this crate.
//!
//! ```no_run
//! use bip340_threshold::telemetry::{get_subscriber, init_subscriber, TelemetryConfig};
//!
//! let subscriber = get_subscriber(&TelemetryConfig::default(), std::io::stdout);
//! init_subscriber(subscriber).expect("telemetry already initialised");
//! ```
use thiserror::Error;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// `RUST_LOG`, when set, takes precedence over `default_filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub name: String,
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            name: env!("CARGO_PKG_NAME").to_string(),
            default_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to redirect log records into tracing")]
    LogRedirect(#[from] log::SetLoggerError),

    #[error("a global subscriber is already installed")]
    GlobalSubscriber(#[from] SetGlobalDefaultError),
}

/// Compose the subscriber without installing it, so tests can scope it with
/// `tracing::subscriber::with_default`.
pub fn get_subscriber<Sink>(config: &TelemetryConfig, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let formatting_layer = BunyanFormattingLayer::new(config.name.clone(), sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Install `subscriber` process-wide and route `log` records through it.
/// Can only succeed once per process.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), TelemetryError> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
