//! Narrow browser-automation seam consumed by the workflows.
//!
//! Workflows only ever talk to a [`BrowserSession`]; the Chromium-backed
//! implementation lives in [`chromium`], and tests substitute scripted fakes.

pub mod chromium;
mod site;

use std::fmt;
use std::time::{Duration, Instant};

pub use chromium::{ChromiumSession, LaunchOptions};
pub use site::SiteSelectors;

/// CSS selector addressing one element (or a list of rows) on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector(String);

impl Selector {
    pub fn css(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn id(id: &str) -> Self {
        Self(format!("#{id}"))
    }

    pub fn class(class: &str) -> Self {
        Self(format!(".{class}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page states a workflow can block on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    Present(Selector),
    /// Absent from the page or not rendered.
    Hidden(Selector),
    Clickable(Selector),
    TextContains(Selector, String),
    UrlContains(String),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Present(selector) => write!(f, "presence of {selector}"),
            WaitCondition::Hidden(selector) => write!(f, "{selector} to disappear"),
            WaitCondition::Clickable(selector) => write!(f, "{selector} to become clickable"),
            WaitCondition::TextContains(selector, text) => {
                write!(f, "{selector} to contain '{text}'")
            }
            WaitCondition::UrlContains(fragment) => write!(f, "url containing '{fragment}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowserError {
    #[error("timed out after {timeout:?} waiting for {condition}")]
    Timeout { condition: String, timeout: Duration },
    #[error("element {0} not found")]
    ElementNotFound(String),
    #[error("{selector} holds '{actual}' after typing '{expected}'")]
    InputRejected {
        selector: String,
        expected: String,
        actual: String,
    },
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("browser protocol error: {0}")]
    Protocol(String),
    #[error("browser session already closed")]
    Closed,
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}

/// Bounded waits used by the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// General UI settle time.
    pub general: Duration,
    /// Short probe for the lottery button, whose absence is expected.
    pub lottery_probe: Duration,
    /// Loading indicator clear after a search in the lottery flow.
    pub lottery_loading: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            general: Duration::from_secs(10),
            lottery_probe: Duration::from_secs(3),
            lottery_loading: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Blocking browser capability the workflows are written against.
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;
    fn current_url(&mut self) -> Result<String, BrowserError>;
    fn clear(&mut self, selector: &Selector) -> Result<(), BrowserError>;
    fn type_text(&mut self, selector: &Selector, text: &str) -> Result<(), BrowserError>;
    fn click(&mut self, selector: &Selector) -> Result<(), BrowserError>;
    /// Current value of a form control.
    fn read_value(&mut self, selector: &Selector) -> Result<String, BrowserError>;
    fn read_text(&mut self, selector: &Selector) -> Result<String, BrowserError>;
    fn is_checked(&mut self, selector: &Selector) -> Result<bool, BrowserError>;
    fn count(&mut self, selector: &Selector) -> Result<usize, BrowserError>;
    /// Trimmed `td` texts of every row matched by `rows`.
    fn table_rows(&mut self, rows: &Selector) -> Result<Vec<Vec<String>>, BrowserError>;
    /// Evaluates `condition` once against the current page.
    fn check(&mut self, condition: &WaitCondition) -> Result<bool, BrowserError>;

    fn poll_interval(&self) -> Duration {
        Timeouts::default().poll_interval
    }

    /// Polls `condition` until it holds or `timeout` elapses.
    fn wait_until(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.check(condition)? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    condition: condition.to_string(),
                    timeout,
                });
            }
            std::thread::sleep(self.poll_interval());
        }
    }
}
