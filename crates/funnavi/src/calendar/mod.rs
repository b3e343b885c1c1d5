//! Target date resolution for search and lottery batches.

mod holidays;

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeSet, HashMap};

pub use holidays::PublicHolidays;

/// Date format used by the site and by configuration values.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Inclusive calendar range. `start` never comes after `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CalendarError> {
        if start > end {
            return Err(CalendarError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The whole calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        let start = day.with_day(1).unwrap_or(day);
        let next_month = start
            .checked_add_months(chrono::Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        let end = next_month.pred_opt().unwrap_or(start);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start
            .iter_days()
            .take_while(move |day| *day <= end)
    }
}

/// Filtering and manual overrides applied on top of a [`DateRange`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFilterPolicy {
    pub holidays_only: bool,
    pub excluded: BTreeSet<NaiveDate>,
    pub additional: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("range start {start} is after range end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("'{value}' is not a YYYY/MM/DD date")]
    InvalidDate { value: String },
}

/// Walks `range`, applies `policy`, and returns strictly ascending dates.
///
/// Additional dates are kept even when they fall outside the range or on a
/// weekday while `holidays_only` is set; excluded dates are always dropped,
/// including ones that are also listed as additional.
pub fn resolve(range: &DateRange, policy: &DateFilterPolicy) -> Vec<NaiveDate> {
    let mut calendars: HashMap<i32, PublicHolidays> = HashMap::new();
    let mut kept = BTreeSet::new();

    for day in range.days() {
        if policy.holidays_only {
            let holidays = calendars
                .entry(day.year())
                .or_insert_with(|| PublicHolidays::for_year(day.year()));
            if !is_weekend(day) && !holidays.contains(day) {
                continue;
            }
        }

        if !policy.excluded.contains(&day) {
            kept.insert(day);
        }
    }

    kept.extend(policy.additional.iter().copied());
    kept.retain(|day| !policy.excluded.contains(day));
    kept.into_iter().collect()
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_weekend_or_holiday(day: NaiveDate) -> bool {
    is_weekend(day) || PublicHolidays::for_year(day.year()).contains(day)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| CalendarError::InvalidDate {
        value: raw.trim().to_string(),
    })
}

/// Parses a comma-separated date list, skipping blank entries.
pub fn parse_date_list(raw: &str) -> Result<BTreeSet<NaiveDate>, CalendarError> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(parse_date)
        .collect()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Moves `today` forward by `months` and returns that whole month.
pub fn month_after(today: NaiveDate, months: u32) -> DateRange {
    let shifted = today
        .with_day(1)
        .and_then(|first| first.checked_add_months(chrono::Months::new(months)))
        .unwrap_or(today);
    DateRange::month_of(shifted)
}
