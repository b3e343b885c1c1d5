//! Lottery entry wizard and outcome classification.
//!
//! A missing lottery button is an expected result (the slot was already
//! entered, or no drawing is open). It is told apart from a broken
//! interaction by a short dedicated wait for the button followed by an
//! independent lookup of the "awaiting lottery result" status marker.

use super::domain::{ReservationOutcome, ReservationStatus, SearchKey};
use super::navigation::advance;
use super::search::{submit_search, write_field, SearchInputCache};
use crate::browser::{BrowserError, BrowserSession, SiteSelectors, Timeouts, WaitCondition};
use std::fmt;
use tracing::{info, warn};

/// Reason recorded when neither the lottery button nor the status marker shows up.
pub const STATUS_MARKER_ABSENT: &str = "status marker absent after lottery-button timeout";

/// Result of looking for the lottery button within the bounded probe wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonProbe {
    Found,
    /// Not present within the probe wait; expected control flow.
    TimedOut,
    Error(BrowserError),
}

/// Wizard step in progress when an interaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotteryStep {
    Search,
    OpenSlot,
    Agreement,
    ContactPhone,
    Confirmation,
    FinalConfirmation,
    ReservationNumber,
    ReturnToList,
    StatusCheck,
}

impl LotteryStep {
    pub const fn label(self) -> &'static str {
        match self {
            LotteryStep::Search => "search",
            LotteryStep::OpenSlot => "open lottery slot",
            LotteryStep::Agreement => "terms agreement",
            LotteryStep::ContactPhone => "contact phone",
            LotteryStep::Confirmation => "confirmation page",
            LotteryStep::FinalConfirmation => "final confirmation page",
            LotteryStep::ReservationNumber => "reservation number",
            LotteryStep::ReturnToList => "return to facility list",
            LotteryStep::StatusCheck => "lottery status check",
        }
    }
}

impl fmt::Display for LotteryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{step}: {source}")]
pub struct LotteryError {
    pub step: LotteryStep,
    #[source]
    pub source: BrowserError,
}

trait AtStep<T> {
    fn at(self, step: LotteryStep) -> Result<T, LotteryError>;
}

impl<T> AtStep<T> for Result<T, BrowserError> {
    fn at(self, step: LotteryStep) -> Result<T, LotteryError> {
        self.map_err(|source| LotteryError { step, source })
    }
}

/// Enters lottery applications one key at a time.
#[derive(Debug, Clone, Default)]
pub struct LotteryApplier {
    site: SiteSelectors,
    timeouts: Timeouts,
}

impl LotteryApplier {
    pub fn new(site: SiteSelectors, timeouts: Timeouts) -> Self {
        Self { site, timeouts }
    }

    /// Always yields an outcome; failures become [`ReservationOutcome::failed`].
    pub fn apply<S>(
        &self,
        session: &mut S,
        cache: &mut SearchInputCache,
        key: &SearchKey,
        contact_phone: &str,
    ) -> ReservationOutcome
    where
        S: BrowserSession + ?Sized,
    {
        let outcome = match self.run(session, cache, key, contact_phone) {
            Ok(outcome) => outcome,
            Err(err) => ReservationOutcome::failed(key, err.to_string()),
        };

        match &outcome.status {
            ReservationStatus::Submitted => info!(
                facility = %key.facility,
                date = %key.date,
                reservation_number = outcome.reservation_number.as_deref().unwrap_or_default(),
                "lottery application submitted"
            ),
            ReservationStatus::AlreadyApplied => info!(
                facility = %key.facility,
                date = %key.date,
                "lottery already applied"
            ),
            ReservationStatus::Failed(reason) => warn!(
                facility = %key.facility,
                date = %key.date,
                %reason,
                "lottery application failed"
            ),
        }

        outcome
    }

    fn run<S>(
        &self,
        session: &mut S,
        cache: &mut SearchInputCache,
        key: &SearchKey,
        contact_phone: &str,
    ) -> Result<ReservationOutcome, LotteryError>
    where
        S: BrowserSession + ?Sized,
    {
        let site = &self.site;

        submit_search(session, cache, site, key, self.timeouts.general).at(LotteryStep::Search)?;
        session
            .wait_until(
                &WaitCondition::Hidden(site.loading.clone()),
                self.timeouts.lottery_loading,
            )
            .at(LotteryStep::Search)?;

        match self.probe_button(session) {
            ButtonProbe::Found => {
                let number = self.submit_entry(session, contact_phone)?;
                Ok(ReservationOutcome::submitted(key, number))
            }
            ButtonProbe::TimedOut => self.classify_missing_button(session, key),
            ButtonProbe::Error(source) => Err(LotteryError {
                step: LotteryStep::OpenSlot,
                source,
            }),
        }
    }

    /// Looks for the lottery button using the short probe wait.
    pub fn probe_button<S>(&self, session: &mut S) -> ButtonProbe
    where
        S: BrowserSession + ?Sized,
    {
        let condition = WaitCondition::Clickable(self.site.lottery_slot.clone());
        match session.wait_until(&condition, self.timeouts.lottery_probe) {
            Ok(()) => ButtonProbe::Found,
            Err(err) if err.is_timeout() => ButtonProbe::TimedOut,
            Err(err) => ButtonProbe::Error(err),
        }
    }

    fn classify_missing_button<S>(
        &self,
        session: &mut S,
        key: &SearchKey,
    ) -> Result<ReservationOutcome, LotteryError>
    where
        S: BrowserSession + ?Sized,
    {
        let marker = WaitCondition::TextContains(
            self.site.lottery_status.clone(),
            self.site.awaiting_lottery_text.clone(),
        );

        if session.check(&marker).at(LotteryStep::StatusCheck)? {
            Ok(ReservationOutcome::already_applied(key))
        } else {
            Ok(ReservationOutcome::failed(key, STATUS_MARKER_ABSENT))
        }
    }

    /// Walks agreement, contact, and both confirmation pages; returns the
    /// reservation number shown on the completion page.
    fn submit_entry<S>(&self, session: &mut S, contact_phone: &str) -> Result<String, LotteryError>
    where
        S: BrowserSession + ?Sized,
    {
        let site = &self.site;
        let timeout = self.timeouts.general;

        session.click(&site.lottery_slot).at(LotteryStep::OpenSlot)?;

        session
            .wait_until(&WaitCondition::Clickable(site.agreement.clone()), timeout)
            .at(LotteryStep::Agreement)?;
        if !session.is_checked(&site.agreement).at(LotteryStep::Agreement)? {
            session.click(&site.agreement).at(LotteryStep::Agreement)?;
        }

        session
            .wait_until(&WaitCondition::Present(site.contact_phone.clone()), timeout)
            .at(LotteryStep::ContactPhone)?;
        write_field(session, &site.contact_phone, contact_phone).at(LotteryStep::ContactPhone)?;

        advance(session, site, &site.to_confirmation, timeout).at(LotteryStep::Confirmation)?;
        advance(session, site, &site.submit_application, timeout)
            .at(LotteryStep::FinalConfirmation)?;

        session
            .wait_until(
                &WaitCondition::Present(site.reservation_number.clone()),
                timeout,
            )
            .at(LotteryStep::ReservationNumber)?;
        let label = session
            .read_text(&site.reservation_number)
            .at(LotteryStep::ReservationNumber)?;
        let number = parse_reservation_number(&label).ok_or_else(|| LotteryError {
            step: LotteryStep::ReservationNumber,
            source: BrowserError::ElementNotFound(format!(
                "reservation number in '{}'",
                label.trim()
            )),
        })?;

        advance(session, site, &site.back_to_facilities, timeout).at(LotteryStep::ReturnToList)?;
        Ok(number)
    }
}

/// Extracts the text after the full-width colon of a confirmation label,
/// e.g. `受付番号：ABC123`.
pub fn parse_reservation_number(label: &str) -> Option<String> {
    let (_, number) = label.split_once('：')?;
    let number = number.trim();
    (!number.is_empty()).then(|| number.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_after_full_width_colon() {
        assert_eq!(
            parse_reservation_number("受付番号：ABC123"),
            Some("ABC123".to_string())
        );
        assert_eq!(
            parse_reservation_number(" 受付番号： 0042 \n"),
            Some("0042".to_string())
        );
    }

    #[test]
    fn rejects_labels_without_a_number() {
        assert_eq!(parse_reservation_number("受付番号:ABC123"), None);
        assert_eq!(parse_reservation_number("受付番号：  "), None);
    }
}
