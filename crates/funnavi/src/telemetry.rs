use crate::config::TelemetryConfig;
use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    LogFile { path: PathBuf, source: std::io::Error },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::LogFile { path, .. } => {
                write!(f, "unable to open log file {}", path.display())
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::LogFile { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level; lines go to stderr and, when configured, are appended
/// to the log file.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.log_level)?,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false);

    let installed = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| TelemetryError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            subscriber
                .with_writer(std::io::stderr.and(Mutex::new(file)))
                .try_init()
        }
        None => subscriber.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(TelemetryError::Subscriber)
}

fn parse_filter(value: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(value).map_err(|source| TelemetryError::EnvFilter {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("funnavi=debug,chromiumoxide=warn").is_ok());
    }

    #[test]
    fn rejects_malformed_filter() {
        let err = parse_filter("funnavi=loudest").unwrap_err();
        assert!(err.to_string().contains("funnavi=loudest"));
    }

    #[test]
    fn unopenable_log_file_is_reported_before_install() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = TelemetryConfig {
            log_level: "info".to_string(),
            log_file: Some(dir.path().join("missing").join("run.log")),
        };

        let err = init(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::LogFile { .. }));
    }
}
