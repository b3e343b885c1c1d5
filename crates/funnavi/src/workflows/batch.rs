use super::availability::AvailabilityProbe;
use super::domain::{AvailabilityMatrix, FacilityName, ReservationOutcome, SearchKey};
use super::lottery::LotteryApplier;
use super::search::SearchInputCache;
use crate::browser::BrowserSession;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Keys in driver order: every facility for the first date, then the next date.
pub fn search_keys(dates: &[NaiveDate], facilities: &[FacilityName]) -> Vec<SearchKey> {
    dates
        .iter()
        .flat_map(|date| {
            facilities
                .iter()
                .map(move |facility| SearchKey::new(facility.clone(), *date))
        })
        .collect()
}

pub fn check_availability<S>(
    session: &mut S,
    probe: &AvailabilityProbe,
    cache: &mut SearchInputCache,
    keys: &[SearchKey],
) -> AvailabilityMatrix
where
    S: BrowserSession + ?Sized,
{
    let mut matrix = AvailabilityMatrix::new();
    for key in keys {
        debug!(facility = %key.facility, date = %key.date, "searching availability");
        let available = probe.probe(session, cache, key);
        matrix.record(key, available);
    }
    info!(
        facilities = matrix.facilities().len(),
        dates = matrix.dates().len(),
        "availability check finished"
    );
    matrix
}

pub fn apply_lottery_batch<S>(
    session: &mut S,
    applier: &LotteryApplier,
    cache: &mut SearchInputCache,
    keys: &[SearchKey],
    contact_phone: &str,
) -> Vec<ReservationOutcome>
where
    S: BrowserSession + ?Sized,
{
    let mut outcomes = Vec::with_capacity(keys.len());
    for key in keys {
        debug!(facility = %key.facility, date = %key.date, "applying for lottery");
        outcomes.push(applier.apply(session, cache, key, contact_phone));
    }
    info!(attempted = outcomes.len(), "lottery batch finished");
    outcomes
}
