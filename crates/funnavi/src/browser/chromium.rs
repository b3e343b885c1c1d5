use super::{BrowserError, BrowserSession, Selector, WaitCondition};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::js::EvaluationResult;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How the Chromium process is started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Browser binary; auto-detected when `None`.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub poll_interval: Option<Duration>,
}

/// [`BrowserSession`] backed by a Chromium instance driven over CDP.
///
/// Owns a private runtime so the workflows can stay synchronous. The browser
/// process is closed by [`ChromiumSession::close`] or, failing that, on drop.
pub struct ChromiumSession {
    runtime: Runtime,
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    poll_interval: Duration,
}

impl ChromiumSession {
    pub fn launch(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let runtime = Runtime::new().map_err(|err| BrowserError::Launch(err.to_string()))?;

        let mut builder = BrowserConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, page, handler) = runtime.block_on(async {
            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|err| BrowserError::Launch(err.to_string()))?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(err) = event {
                        debug!(error = %err, "browser handler event failed");
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(Self::map_error)?;
            Ok::<_, BrowserError>((browser, page, handler))
        })?;

        info!(headless = options.headless, "browser launched");

        Ok(Self {
            runtime,
            browser: Some(browser),
            page,
            handler,
            poll_interval: options
                .poll_interval
                .unwrap_or_else(|| super::Timeouts::default().poll_interval),
        })
    }

    /// Closes the browser process. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), BrowserError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let result = self.runtime.block_on(async {
            browser.close().await.map_err(Self::map_error)?;
            if let Err(err) = browser.wait().await {
                warn!(error = %err, "browser process did not exit cleanly");
            }
            Ok(())
        });
        self.handler.abort();
        info!("browser closed");
        result
    }

    fn map_error<E: std::fmt::Display>(err: E) -> BrowserError {
        BrowserError::Protocol(err.to_string())
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.browser.is_some() {
            Ok(())
        } else {
            Err(BrowserError::Closed)
        }
    }

    fn evaluate<T: DeserializeOwned>(&self, script: String) -> Result<T, BrowserError> {
        self.ensure_open()?;
        self.runtime.block_on(async {
            let result = self
                .page
                .evaluate_expression(script)
                .await
                .map_err(Self::map_error)?;
            decode_evaluation(result)
        })
    }

    /// Runs `body` with `el` bound to the first match of `selector`; the
    /// expression yields `null` when nothing matches.
    fn with_element<T: DeserializeOwned>(
        &self,
        selector: &Selector,
        body: &str,
    ) -> Result<Option<T>, BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return null; {body} }})()",
            js_string(selector.as_str())
        );
        self.evaluate(script)
    }

    fn require<T>(selector: &Selector, value: Option<T>) -> Result<T, BrowserError> {
        value.ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }
}

const VISIBLE_JS: &str = "const style = window.getComputedStyle(el); \
     const visible = style.display !== 'none' && style.visibility !== 'hidden' \
     && el.getClientRects().length > 0;";

impl BrowserSession for ChromiumSession {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        debug!(%url, "navigating");
        self.runtime.block_on(async {
            self.page.goto(url).await.map_err(Self::map_error)?;
            Ok(())
        })
    }

    fn current_url(&mut self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        self.runtime.block_on(async {
            let url = self.page.url().await.map_err(Self::map_error)?;
            Ok(url.unwrap_or_default())
        })
    }

    fn clear(&mut self, selector: &Selector) -> Result<(), BrowserError> {
        let cleared = self.with_element::<bool>(
            selector,
            "el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); return true;",
        )?;
        Self::require(selector, cleared).map(|_| ())
    }

    fn type_text(&mut self, selector: &Selector, text: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.runtime.block_on(async {
            let element = self
                .page
                .find_element(selector.as_str())
                .await
                .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
            element.click().await.map_err(Self::map_error)?;
            element.type_str(text).await.map_err(Self::map_error)?;
            Ok(())
        })
    }

    fn click(&mut self, selector: &Selector) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.runtime.block_on(async {
            let element = self
                .page
                .find_element(selector.as_str())
                .await
                .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
            element.click().await.map_err(Self::map_error)?;
            Ok(())
        })
    }

    fn read_value(&mut self, selector: &Selector) -> Result<String, BrowserError> {
        let value = self.with_element::<String>(selector, "return String(el.value ?? '');")?;
        Self::require(selector, value)
    }

    fn read_text(&mut self, selector: &Selector) -> Result<String, BrowserError> {
        let text = self.with_element::<String>(selector, "return (el.innerText || '').trim();")?;
        Self::require(selector, text)
    }

    fn is_checked(&mut self, selector: &Selector) -> Result<bool, BrowserError> {
        let checked = self.with_element::<bool>(selector, "return Boolean(el.checked);")?;
        Self::require(selector, checked)
    }

    fn count(&mut self, selector: &Selector) -> Result<usize, BrowserError> {
        self.evaluate(format!(
            "document.querySelectorAll({}).length",
            js_string(selector.as_str())
        ))
    }

    fn table_rows(&mut self, rows: &Selector) -> Result<Vec<Vec<String>>, BrowserError> {
        self.evaluate(format!(
            "Array.from(document.querySelectorAll({})).map(row => \
             Array.from(row.querySelectorAll('td')).map(cell => (cell.innerText || '').trim()))",
            js_string(rows.as_str())
        ))
    }

    fn check(&mut self, condition: &WaitCondition) -> Result<bool, BrowserError> {
        match condition {
            WaitCondition::Present(selector) => Ok(self.count(selector)? > 0),
            WaitCondition::Hidden(selector) => {
                let visible = self.with_element::<bool>(
                    selector,
                    &format!("{VISIBLE_JS} return visible;"),
                )?;
                Ok(!visible.unwrap_or(false))
            }
            WaitCondition::Clickable(selector) => {
                let clickable = self.with_element::<bool>(
                    selector,
                    &format!("{VISIBLE_JS} return visible && !el.disabled;"),
                )?;
                Ok(clickable.unwrap_or(false))
            }
            WaitCondition::TextContains(selector, text) => {
                let found: bool = self.evaluate(format!(
                    "Array.from(document.querySelectorAll({})).some(el => (el.innerText || '').includes({}))",
                    js_string(selector.as_str()),
                    js_string(text)
                ))?;
                Ok(found)
            }
            WaitCondition::UrlContains(fragment) => {
                Ok(self.current_url()?.contains(fragment.as_str()))
            }
        }
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close browser on drop");
        }
    }
}

impl std::fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumSession")
            .field("open", &self.browser.is_some())
            .finish_non_exhaustive()
    }
}

/// Decodes a `returnByValue` result. CDP sends JS `null` as a remote object
/// without a `value`, which decodes as JSON `null` so `Option<T>` reads `None`.
pub(crate) fn decode_evaluation<T: DeserializeOwned>(
    result: EvaluationResult,
) -> Result<T, BrowserError> {
    let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(ChromiumSession::map_error)
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
