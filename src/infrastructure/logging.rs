use anyhow::Result;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Configuration for console and file logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: Option<String>,
    pub log_level: Level,
    pub enable_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            log_level: Level::INFO,
            enable_console: true,
        }
    }
}

/// Initializes tracing with an env-filter, a console layer and, when a log
/// directory is configured, a daily-rolling file appender.
///
/// The returned guard must be held for as long as file logging should keep
/// flushing.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("banking_ledger={},sqlx=warn", config.log_level)));

    let mut layers: Vec<Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>> = Vec::new();
    let mut guard = None;

    if config.enable_console {
        layers.push(fmt::layer().with_target(true).boxed());
    }

    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "banking-ledger.log");
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    Ok(guard)
}
