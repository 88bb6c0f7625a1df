use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: model and CLI events at info,
/// dependencies only at warn.
pub const DEFAULT_LOG_FILTER: &str = "warn,resonance_core=info,resonance=info";

/// Keeps the non-blocking file writer flushing until dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Parses `directives`. A bare level such as `debug` applies to this crate
/// and the binary only; unparsable input falls back to [`DEFAULT_LOG_FILTER`].
pub fn log_filter(directives: &str) -> EnvFilter {
    let directives = directives.trim();
    let expanded = match directives.parse::<tracing::Level>() {
        Ok(level) => {
            let level = level.as_str().to_ascii_lowercase();
            format!("warn,resonance_core={level},resonance={level}")
        }
        Err(_) => directives.to_string(),
    };
    EnvFilter::try_new(&expanded).unwrap_or_else(|err| {
        eprintln!("invalid log filter {directives:?} ({err}), using {DEFAULT_LOG_FILTER}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

/// Installs the global subscriber. Logs go to stderr so stdout stays free
/// for prediction output.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = log_filter(log_level);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            eprintln!("failed to create log directory {log_dir}: {err}");
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "resonance.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();

            return Some(FileLogGuard { _guard: guard });
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    None
}
