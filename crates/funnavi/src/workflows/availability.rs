use super::domain::SearchKey;
use super::search::{submit_search, SearchInputCache};
use crate::browser::{BrowserError, BrowserSession, SiteSelectors, Timeouts, WaitCondition};
use tracing::{error, info};

/// Checks whether a facility has at least one bookable slot on a date.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityProbe {
    site: SiteSelectors,
    timeouts: Timeouts,
}

impl AvailabilityProbe {
    pub fn new(site: SiteSelectors, timeouts: Timeouts) -> Self {
        Self { site, timeouts }
    }

    /// Interaction failures are logged and reported as "not available" so a
    /// batch keeps going.
    pub fn probe<S>(&self, session: &mut S, cache: &mut SearchInputCache, key: &SearchKey) -> bool
    where
        S: BrowserSession + ?Sized,
    {
        match self.search(session, cache, key) {
            Ok(true) => {
                info!(facility = %key.facility, date = %key.date, "slot available");
                true
            }
            Ok(false) => {
                info!(facility = %key.facility, date = %key.date, "no slot available");
                false
            }
            Err(err) => {
                error!(
                    facility = %key.facility,
                    date = %key.date,
                    error = %err,
                    "availability search failed"
                );
                false
            }
        }
    }

    fn search<S>(
        &self,
        session: &mut S,
        cache: &mut SearchInputCache,
        key: &SearchKey,
    ) -> Result<bool, BrowserError>
    where
        S: BrowserSession + ?Sized,
    {
        let site = &self.site;
        let timeout = self.timeouts.general;

        submit_search(session, cache, site, key, timeout)?;
        session.wait_until(&WaitCondition::Hidden(site.loading.clone()), timeout)?;
        session.wait_until(&WaitCondition::Present(site.results_marker.clone()), timeout)?;

        Ok(session.count(&site.available_slot)? > 0)
    }
}
