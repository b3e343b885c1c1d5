use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::NaiveDate;
use chromiumoxide::cdp::js_protocol::runtime::RemoteObject;
use chromiumoxide::js::EvaluationResult;
use serde_json::json;

use crate::browser::chromium::decode_evaluation;
use crate::browser::{BrowserError, BrowserSession, Selector, SiteSelectors, WaitCondition};
use crate::workflows::domain::{FacilityName, SearchKey};

/// In-memory stand-in for the site. Every selector in `present` is rendered
/// and clickable; waits resolve on the first check instead of polling.
/// Element-state checks answer with the CDP payload Chromium would send and
/// decode it the way [`crate::browser::ChromiumSession`] does.
#[derive(Debug, Default)]
pub(super) struct ScriptedSession {
    pub(super) site: SiteSelectors,
    pub(super) present: HashSet<String>,
    pub(super) values: HashMap<String, String>,
    pub(super) texts: HashMap<String, String>,
    pub(super) checked: HashSet<String>,
    pub(super) url: String,
    pub(super) url_after_login: Option<String>,
    /// `(keyword, date)` field values for which available-slot buttons render.
    pub(super) open_slots: HashSet<(String, String)>,
    pub(super) history_pages: Vec<Vec<Vec<String>>>,
    pub(super) history_page: usize,
    /// Selectors whose every interaction fails with the stored error.
    pub(super) broken: HashMap<String, BrowserError>,
    /// Fields that silently drop typed text.
    pub(super) ignore_input: HashSet<String>,
    pub(super) typed: Vec<(String, String)>,
    pub(super) clicks: Vec<String>,
    pub(super) navigations: Vec<String>,
}

impl ScriptedSession {
    /// Facility search form with results already rendered.
    pub(super) fn search_page() -> Self {
        let mut session = Self::default();
        let site = session.site.clone();
        session.show(&site.keyword);
        session.show(&site.use_date);
        session.show(&site.search);
        session.show(&site.results_marker);
        session
    }

    /// Search page whose lottery wizard runs through to a reservation number.
    pub(super) fn lottery_wizard(confirmation_label: &str) -> Self {
        let mut session = Self::search_page();
        let site = session.site.clone();
        for selector in [
            &site.lottery_slot,
            &site.agreement,
            &site.contact_phone,
            &site.to_confirmation,
            &site.submit_application,
            &site.reservation_number,
            &site.back_to_facilities,
        ] {
            session.show(selector);
        }
        session.set_text(&site.reservation_number, confirmation_label);
        session
    }

    pub(super) fn show(&mut self, selector: &Selector) {
        self.present.insert(selector.to_string());
    }

    pub(super) fn hide(&mut self, selector: &Selector) {
        self.present.remove(selector.as_str());
    }

    pub(super) fn set_text(&mut self, selector: &Selector, text: &str) {
        self.texts.insert(selector.to_string(), text.to_string());
    }

    pub(super) fn break_selector(&mut self, selector: &Selector, error: BrowserError) {
        self.broken.insert(selector.to_string(), error);
    }

    pub(super) fn typed_into(&self, selector: &Selector) -> Vec<&str> {
        self.typed
            .iter()
            .filter(|(target, _)| target == selector.as_str())
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub(super) fn clicked(&self, selector: &Selector) -> usize {
        self.clicks
            .iter()
            .filter(|target| target.as_str() == selector.as_str())
            .count()
    }

    fn fail_if_broken(&self, selector: &Selector) -> Result<(), BrowserError> {
        match self.broken.get(selector.as_str()) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Visibility of `selector` as the element-check script reports it: JS
    /// `null` when the element is not in the DOM.
    fn element_flag(&self, selector: &Selector) -> Result<Option<bool>, BrowserError> {
        let object = if self.present.contains(selector.as_str()) {
            json!({ "type": "boolean", "value": true })
        } else {
            json!({ "type": "object", "subtype": "null", "value": null })
        };
        let object: RemoteObject =
            serde_json::from_value(object).map_err(|err| BrowserError::Protocol(err.to_string()))?;
        decode_evaluation(EvaluationResult::new(object))
    }

    fn value_of(&self, selector: &Selector) -> String {
        self.values.get(selector.as_str()).cloned().unwrap_or_default()
    }
}

impl BrowserSession for ScriptedSession {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.navigations.push(url.to_string());
        self.url = url.to_string();
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.url.clone())
    }

    fn clear(&mut self, selector: &Selector) -> Result<(), BrowserError> {
        self.fail_if_broken(selector)?;
        self.values.insert(selector.to_string(), String::new());
        Ok(())
    }

    fn type_text(&mut self, selector: &Selector, text: &str) -> Result<(), BrowserError> {
        self.fail_if_broken(selector)?;
        if !self.present.contains(selector.as_str()) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.typed.push((selector.to_string(), text.to_string()));
        if !self.ignore_input.contains(selector.as_str()) {
            self.values
                .entry(selector.to_string())
                .or_default()
                .push_str(text);
        }
        Ok(())
    }

    fn click(&mut self, selector: &Selector) -> Result<(), BrowserError> {
        self.fail_if_broken(selector)?;
        if self.count(selector)? == 0 {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.clicks.push(selector.to_string());

        if *selector == self.site.login_submit {
            if let Some(url) = self.url_after_login.clone() {
                self.url = url;
            }
        } else if *selector == self.site.agreement {
            if !self.checked.remove(selector.as_str()) {
                self.checked.insert(selector.to_string());
            }
        } else if *selector == self.site.history_next_page {
            self.history_page += 1;
        }
        Ok(())
    }

    fn read_value(&mut self, selector: &Selector) -> Result<String, BrowserError> {
        self.fail_if_broken(selector)?;
        Ok(self.value_of(selector))
    }

    fn read_text(&mut self, selector: &Selector) -> Result<String, BrowserError> {
        self.fail_if_broken(selector)?;
        self.texts
            .get(selector.as_str())
            .cloned()
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }

    fn is_checked(&mut self, selector: &Selector) -> Result<bool, BrowserError> {
        self.fail_if_broken(selector)?;
        Ok(self.checked.contains(selector.as_str()))
    }

    fn count(&mut self, selector: &Selector) -> Result<usize, BrowserError> {
        self.fail_if_broken(selector)?;
        if *selector == self.site.available_slot {
            let current = (
                self.value_of(&self.site.keyword),
                self.value_of(&self.site.use_date),
            );
            return Ok(usize::from(self.open_slots.contains(&current)));
        }
        if *selector == self.site.history_next_page {
            return Ok(usize::from(self.history_page + 1 < self.history_pages.len()));
        }
        Ok(usize::from(self.present.contains(selector.as_str())))
    }

    fn table_rows(&mut self, rows: &Selector) -> Result<Vec<Vec<String>>, BrowserError> {
        self.fail_if_broken(rows)?;
        Ok(self
            .history_pages
            .get(self.history_page)
            .cloned()
            .unwrap_or_default())
    }

    fn check(&mut self, condition: &WaitCondition) -> Result<bool, BrowserError> {
        match condition {
            WaitCondition::Present(selector) => Ok(self.count(selector)? > 0),
            WaitCondition::Hidden(selector) => {
                self.fail_if_broken(selector)?;
                Ok(!self.element_flag(selector)?.unwrap_or(false))
            }
            WaitCondition::Clickable(selector) => {
                self.fail_if_broken(selector)?;
                Ok(self.element_flag(selector)?.unwrap_or(false))
            }
            WaitCondition::TextContains(selector, text) => {
                self.fail_if_broken(selector)?;
                Ok(self
                    .texts
                    .get(selector.as_str())
                    .is_some_and(|current| current.contains(text.as_str())))
            }
            WaitCondition::UrlContains(fragment) => Ok(self.url.contains(fragment.as_str())),
        }
    }

    fn wait_until(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        if self.check(condition)? {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                condition: condition.to_string(),
                timeout,
            })
        }
    }
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn facility(name: &str) -> FacilityName {
    FacilityName::parse(name).expect("non-empty facility")
}

pub(super) fn key(name: &str, day: u32) -> SearchKey {
    SearchKey::new(facility(name), date(2024, 6, day))
}
