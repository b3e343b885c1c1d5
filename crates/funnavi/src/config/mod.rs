use crate::browser::LaunchOptions;
use crate::calendar::{month_after, parse_date, parse_date_list, DateFilterPolicy, DateRange};
use crate::workflows::FacilityName;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOGIN_URL: &str = "https://fun-navi.net/frpc010g.jsp";
pub const DEFAULT_LOG_FILE: &str = "fun_navi_log.log";

/// Namespace prefix of the lottery settings.
pub const LOTTERY_PREFIX: &str = "PRR_";

/// Months between today and the month whose lottery is open.
const LOTTERY_LEAD_MONTHS: u32 = 2;

/// Key lookup behind every configuration struct.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Loads `.env` from the working directory, or `path` when given. Values in
/// the file replace variables already set in the process.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenvy::from_path_override(path)
            .map(|_| ())
            .map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            }),
        None => {
            dotenvy::dotenv_override().ok();
            Ok(())
        }
    }
}

/// Settings shared by every entry point.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
    pub output_dir: PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        load_env_file(None)?;
        Self::from_source(&EnvSource)
    }

    pub fn from_source(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let login_url = value(source, "LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());
        let launch = LaunchOptions {
            executable: value(source, "CHROME_DRIVER_PATH").map(PathBuf::from),
            headless: flag(source, "BROWSER_HEADLESS")?.unwrap_or(false),
            poll_interval: None,
        };

        Ok(Self {
            session: SessionConfig {
                login_url,
                user_id: value(source, "USER_ID"),
                password: secret(source, "PASSWORD"),
                launch,
            },
            telemetry: TelemetryConfig {
                log_level: value(source, "LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                log_file: match source.get("LOG_FILE") {
                    None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
                    Some(raw) if raw.trim().is_empty() => None,
                    Some(raw) => Some(PathBuf::from(raw.trim())),
                },
            },
            output_dir: value(source, "OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

/// Login target, account, and browser launch settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub login_url: String,
    /// Prompted for when absent.
    pub user_id: Option<String>,
    /// Prompted for without echo when absent.
    pub password: Option<String>,
    pub launch: LaunchOptions,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Log lines are also appended here; `None` logs to stderr only.
    pub log_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Which facilities and dates the availability check covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityConfig {
    pub facilities: Vec<FacilityName>,
    pub range: DateRange,
    pub policy: DateFilterPolicy,
}

impl AvailabilityConfig {
    pub fn from_source(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let facilities = facilities(source, "")?;
        let start = required_date(source, "SEARCH_START_DATE")?;
        let end = required_date(source, "SEARCH_END_DATE")?;
        let range = range(start, end)?;
        let policy = policy(source, "")?;

        Ok(Self {
            facilities,
            range,
            policy,
        })
    }
}

/// Lottery batch settings, read from the `PRR_` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryConfig {
    pub facilities: Vec<FacilityName>,
    /// Explicit window; `None` targets the month whose lottery is open.
    pub range: Option<DateRange>,
    pub policy: DateFilterPolicy,
    pub contact_phone: String,
}

impl LotteryConfig {
    pub fn from_source(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let facilities = facilities(source, LOTTERY_PREFIX)?;
        let contact_phone = required(source, &prefixed(LOTTERY_PREFIX, "CONTACT_PHONE"))?;
        let start = optional_date(source, &prefixed(LOTTERY_PREFIX, "SEARCH_START_DATE"))?;
        let end = optional_date(source, &prefixed(LOTTERY_PREFIX, "SEARCH_END_DATE"))?;
        let range = match (start, end) {
            (Some(start), Some(end)) => Some(range(start, end)?),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    key: prefixed(LOTTERY_PREFIX, "SEARCH_END_DATE"),
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing {
                    key: prefixed(LOTTERY_PREFIX, "SEARCH_START_DATE"),
                })
            }
        };
        let policy = policy(source, LOTTERY_PREFIX)?;

        Ok(Self {
            facilities,
            range,
            policy,
            contact_phone,
        })
    }

    /// Configured window, or the whole month two months after `today`.
    pub fn target_range(&self, today: NaiveDate) -> DateRange {
        self.range
            .unwrap_or_else(|| month_after(today, LOTTERY_LEAD_MONTHS))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing { key: String },
    NoFacilities { key: String },
    InvalidDate { key: String, value: String },
    InvalidFlag { key: String, value: String },
    InvertedRange { start: NaiveDate, end: NaiveDate },
    EnvFile { path: PathBuf, source: dotenvy::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { key } => write!(f, "{key} must be set"),
            ConfigError::NoFacilities { key } => {
                write!(f, "{key} must list at least one facility name")
            }
            ConfigError::InvalidDate { key, value } => {
                write!(f, "{key} must be a YYYY/MM/DD date (list), got '{value}'")
            }
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false, got '{value}'")
            }
            ConfigError::InvertedRange { start, end } => {
                write!(f, "search start date {start} is after end date {end}")
            }
            ConfigError::EnvFile { path, .. } => {
                write!(f, "unable to load env file {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::EnvFile { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn prefixed(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

/// Trimmed value; blank counts as unset.
fn value(source: &impl ConfigSource, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Like [`value`], but keeps surrounding whitespace.
fn secret(source: &impl ConfigSource, key: &str) -> Option<String> {
    source.get(key).filter(|raw| !raw.is_empty())
}

fn required(source: &impl ConfigSource, key: &str) -> Result<String, ConfigError> {
    value(source, key).ok_or_else(|| ConfigError::Missing {
        key: key.to_string(),
    })
}

fn flag(source: &impl ConfigSource, key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = value(source, key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn optional_date(source: &impl ConfigSource, key: &str) -> Result<Option<NaiveDate>, ConfigError> {
    value(source, key)
        .map(|raw| {
            parse_date(&raw).map_err(|_| ConfigError::InvalidDate {
                key: key.to_string(),
                value: raw,
            })
        })
        .transpose()
}

fn required_date(source: &impl ConfigSource, key: &str) -> Result<NaiveDate, ConfigError> {
    optional_date(source, key)?.ok_or_else(|| ConfigError::Missing {
        key: key.to_string(),
    })
}

fn date_list(source: &impl ConfigSource, key: &str) -> Result<BTreeSet<NaiveDate>, ConfigError> {
    match value(source, key) {
        None => Ok(BTreeSet::new()),
        Some(raw) => parse_date_list(&raw).map_err(|_| ConfigError::InvalidDate {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, ConfigError> {
    DateRange::new(start, end).map_err(|_| ConfigError::InvertedRange { start, end })
}

fn facilities(source: &impl ConfigSource, prefix: &str) -> Result<Vec<FacilityName>, ConfigError> {
    let key = prefixed(prefix, "FACILITY_NAMES");
    let facilities = FacilityName::parse_list(&source.get(&key).unwrap_or_default());
    if facilities.is_empty() {
        return Err(ConfigError::NoFacilities { key });
    }
    Ok(facilities)
}

fn policy(source: &impl ConfigSource, prefix: &str) -> Result<DateFilterPolicy, ConfigError> {
    Ok(DateFilterPolicy {
        holidays_only: flag(source, &prefixed(prefix, "HOLIDAYS_ONLY"))?.unwrap_or(false),
        excluded: date_list(source, &prefixed(prefix, "EXCLUDED_DATES"))?,
        additional: date_list(source, &prefixed(prefix, "ADDITIONAL_DATES"))?,
    })
}
