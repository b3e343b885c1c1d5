//! Form-interaction workflows driven through a [`BrowserSession`].
//!
//! [`BrowserSession`]: crate::browser::BrowserSession

pub mod availability;
pub mod batch;
pub mod domain;
pub mod history;
pub mod lottery;
pub mod navigation;
pub mod search;

#[cfg(test)]
mod tests;

use crate::browser::BrowserError;

pub use availability::AvailabilityProbe;
pub use batch::{apply_lottery_batch, check_availability, search_keys};
pub use domain::{
    AvailabilityMatrix, FacilityName, ReservationHistoryRecord, ReservationOutcome,
    ReservationStatus, SearchKey,
};
pub use history::{parse_datetime_with_weekday, ReservationHistoryFetcher};
pub use lottery::{parse_reservation_number, ButtonProbe, LotteryApplier, LotteryError, LotteryStep};
pub use navigation::{advance, login, open_reservation_history, Credentials};
pub use search::SearchInputCache;

/// Fatal workflow failures; per-key failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("login failed: {0}")]
    Login(#[source] BrowserError),
    #[error("could not open {page}: {source}")]
    Navigation {
        page: &'static str,
        #[source]
        source: BrowserError,
    },
}
