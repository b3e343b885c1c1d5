use crate::calendar::format_date;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Facility keyword as typed into the search form. Never empty, always trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FacilityName(String);

impl FacilityName {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Splits a comma-separated list, dropping blank entries.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',').filter_map(Self::parse).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit of work for availability search and lottery application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub facility: FacilityName,
    pub date: NaiveDate,
}

impl SearchKey {
    pub fn new(facility: FacilityName, date: NaiveDate) -> Self {
        Self { facility, date }
    }
}

/// Availability per facility and date, built incrementally.
///
/// Facilities keep their first-seen order; dates render ascending and missing
/// cells read as not available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMatrix {
    facilities: Vec<FacilityName>,
    cells: HashMap<FacilityName, BTreeMap<NaiveDate, bool>>,
}

impl AvailabilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &SearchKey, available: bool) {
        if !self.cells.contains_key(&key.facility) {
            self.facilities.push(key.facility.clone());
        }
        self.cells
            .entry(key.facility.clone())
            .or_default()
            .insert(key.date, available);
    }

    pub fn is_available(&self, facility: &FacilityName, date: NaiveDate) -> bool {
        self.cells
            .get(facility)
            .and_then(|dates| dates.get(&date))
            .copied()
            .unwrap_or(false)
    }

    pub fn facilities(&self) -> &[FacilityName] {
        &self.facilities
    }

    /// Every date recorded for any facility, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.cells
            .values()
            .flat_map(|dates| dates.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationStatus {
    Submitted,
    AlreadyApplied,
    Failed(String),
}

impl ReservationStatus {
    pub fn label(&self) -> String {
        match self {
            ReservationStatus::Submitted => "submitted".to_string(),
            ReservationStatus::AlreadyApplied => "already_applied".to_string(),
            ReservationStatus::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

/// Result of one lottery attempt; exactly one per key attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationOutcome {
    pub facility: FacilityName,
    pub date: NaiveDate,
    pub reservation_number: Option<String>,
    pub status: ReservationStatus,
}

impl ReservationOutcome {
    pub fn submitted(key: &SearchKey, reservation_number: String) -> Self {
        Self::with_status(key, Some(reservation_number), ReservationStatus::Submitted)
    }

    pub fn already_applied(key: &SearchKey) -> Self {
        Self::with_status(key, None, ReservationStatus::AlreadyApplied)
    }

    pub fn failed(key: &SearchKey, reason: impl Into<String>) -> Self {
        Self::with_status(key, None, ReservationStatus::Failed(reason.into()))
    }

    fn with_status(
        key: &SearchKey,
        reservation_number: Option<String>,
        status: ReservationStatus,
    ) -> Self {
        Self {
            facility: key.facility.clone(),
            date: key.date,
            reservation_number,
            status,
        }
    }

    pub fn date_label(&self) -> String {
        format_date(self.date)
    }
}

/// Future reservation read from the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationHistoryRecord {
    pub facility: String,
    /// Start time as displayed by the site.
    pub start_time: String,
    pub starts_at: NaiveDateTime,
    pub end_time: String,
    pub reservation_number: String,
    pub status: String,
}
