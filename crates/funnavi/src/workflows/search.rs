use super::domain::{FacilityName, SearchKey};
use crate::browser::{BrowserError, BrowserSession, Selector, SiteSelectors, WaitCondition};
use crate::calendar::format_date;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;

/// Last facility and date accepted by the search form.
///
/// Lets consecutive keys that share a facility or date skip re-typing the
/// field. Values are committed only once the page reports the typed text, and
/// a field is forgotten before it is overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInputCache {
    last_facility: Option<FacilityName>,
    last_date: Option<NaiveDate>,
}

impl SearchInputCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_write_facility(&self, candidate: &FacilityName) -> bool {
        self.last_facility.as_ref() != Some(candidate)
    }

    pub fn should_write_date(&self, candidate: NaiveDate) -> bool {
        self.last_date != Some(candidate)
    }

    pub fn commit_facility(&mut self, facility: FacilityName) {
        self.last_facility = Some(facility);
    }

    pub fn commit_date(&mut self, date: NaiveDate) {
        self.last_date = Some(date);
    }

    /// Drops the cached facility; the keyword field no longer holds it.
    pub fn forget_facility(&mut self) {
        self.last_facility = None;
    }

    /// Drops the cached date; the date field no longer holds it.
    pub fn forget_date(&mut self) {
        self.last_date = None;
    }

    pub fn last_facility(&self) -> Option<&FacilityName> {
        self.last_facility.as_ref()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }
}

/// Fills the keyword and date fields for `key` and presses search.
pub(crate) fn submit_search<S>(
    session: &mut S,
    cache: &mut SearchInputCache,
    site: &SiteSelectors,
    key: &SearchKey,
    timeout: Duration,
) -> Result<(), BrowserError>
where
    S: BrowserSession + ?Sized,
{
    session.wait_until(&WaitCondition::Present(site.keyword.clone()), timeout)?;

    if cache.should_write_facility(&key.facility) {
        cache.forget_facility();
        write_field(session, &site.keyword, key.facility.as_str())?;
        cache.commit_facility(key.facility.clone());
    } else {
        debug!(facility = %key.facility, "keyword unchanged, skipping input");
    }

    if cache.should_write_date(key.date) {
        cache.forget_date();
        write_field(session, &site.use_date, &format_date(key.date))?;
        cache.commit_date(key.date);
    } else {
        debug!(date = %key.date, "date unchanged, skipping input");
    }

    session.click(&site.search)
}

/// Replaces the field contents and confirms the page kept `value`.
pub(crate) fn write_field<S>(
    session: &mut S,
    selector: &Selector,
    value: &str,
) -> Result<(), BrowserError>
where
    S: BrowserSession + ?Sized,
{
    session.clear(selector)?;
    session.type_text(selector, value)?;

    let actual = session.read_value(selector)?;
    if actual.trim() != value {
        return Err(BrowserError::InputRejected {
            selector: selector.to_string(),
            expected: value.to_string(),
            actual,
        });
    }
    Ok(())
}
