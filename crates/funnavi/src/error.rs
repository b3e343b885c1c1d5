use crate::browser::BrowserError;
use crate::config::ConfigError;
use crate::report::ReportError;
use crate::telemetry::TelemetryError;
use crate::workflows::WorkflowError;
use std::fmt;

/// Run-level failure; anything reaching this type ends the run.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Browser(BrowserError),
    Workflow(WorkflowError),
    Report(ReportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Browser(err) => write!(f, "browser error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
            AppError::Report(err) => write!(f, "report error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Browser(err) => Some(err),
            AppError::Workflow(err) => Some(err),
            AppError::Report(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<BrowserError> for AppError {
    fn from(value: BrowserError) -> Self {
        Self::Browser(value)
    }
}

impl From<WorkflowError> for AppError {
    fn from(value: WorkflowError) -> Self {
        Self::Workflow(value)
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_names_the_failing_layer() {
        let err = AppError::from(ConfigError::Missing {
            key: "USER_ID".to_string(),
        });
        assert_eq!(err.to_string(), "configuration error: USER_ID must be set");
        assert!(err.source().is_some());
    }

    #[test]
    fn workflow_errors_keep_their_cause() {
        let err = AppError::from(WorkflowError::Login(BrowserError::Closed));
        assert!(err.to_string().starts_with("workflow error: login failed"));
        assert!(matches!(err, AppError::Workflow(WorkflowError::Login(_))));
    }
}
