use super::domain::ReservationHistoryRecord;
use crate::browser::{BrowserError, BrowserSession, SiteSelectors, Timeouts, WaitCondition};
use chrono::NaiveDateTime;
use tracing::{info, warn};

const HISTORY_DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Reads upcoming reservations from the paginated history table.
#[derive(Debug, Clone, Default)]
pub struct ReservationHistoryFetcher {
    site: SiteSelectors,
    timeouts: Timeouts,
}

impl ReservationHistoryFetcher {
    pub fn new(site: SiteSelectors, timeouts: Timeouts) -> Self {
        Self { site, timeouts }
    }

    /// Collects rows starting strictly after `now`, in page then row order.
    ///
    /// Stops at the last page or at the first page that cannot be read;
    /// records gathered so far are kept.
    pub fn fetch_future<S>(&self, session: &mut S, now: NaiveDateTime) -> Vec<ReservationHistoryRecord>
    where
        S: BrowserSession + ?Sized,
    {
        let mut records = Vec::new();
        let mut page = 1usize;

        loop {
            let rows = match session.table_rows(&self.site.history_rows) {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(page, error = %err, "could not read reservation history rows");
                    break;
                }
            };
            if rows.is_empty() {
                info!(page, "no reservation history rows");
                break;
            }

            records.extend(
                rows.iter()
                    .filter_map(|row| parse_row(row))
                    .filter(|record| record.starts_at > now),
            );

            match self.next_page(session) {
                Ok(true) => {
                    page += 1;
                    info!(page, "moved to next reservation history page");
                }
                Ok(false) => {
                    info!(pages = page, records = records.len(), "read all reservation history");
                    break;
                }
                Err(err) => {
                    warn!(page, error = %err, "could not move to next history page");
                    break;
                }
            }
        }

        records
    }

    /// Returns `Ok(false)` when there is no next-page control.
    fn next_page<S>(&self, session: &mut S) -> Result<bool, BrowserError>
    where
        S: BrowserSession + ?Sized,
    {
        if session.count(&self.site.history_next_page)? == 0 {
            return Ok(false);
        }
        session.click(&self.site.history_next_page)?;
        session.wait_until(
            &WaitCondition::Present(self.site.history_section.clone()),
            self.timeouts.general,
        )?;
        Ok(true)
    }
}

/// Columns: start, end, facility, reservation number, status. Rows that are
/// short or whose start time does not parse are dropped.
fn parse_row(columns: &[String]) -> Option<ReservationHistoryRecord> {
    let [start_time, end_time, facility, reservation_number, status, ..] = columns else {
        return None;
    };
    let starts_at = parse_datetime_with_weekday(start_time)?;

    Some(ReservationHistoryRecord {
        facility: facility.trim().to_string(),
        start_time: start_time.trim().to_string(),
        starts_at,
        end_time: end_time.trim().to_string(),
        reservation_number: reservation_number.trim().to_string(),
        status: status.trim().to_string(),
    })
}

/// Parses site timestamps such as `2024/06/01(Sat) 10:00` or
/// `2024/06/01（土） 10:00`; the weekday annotation is ignored.
pub fn parse_datetime_with_weekday(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    let open = trimmed.find(&['(', '（'][..])?;
    let rest = &trimmed[open..];
    let close = rest.find(&[')', '）'][..])?;
    let closing_len = rest[close..].chars().next()?.len_utf8();

    let date = trimmed[..open].trim();
    let time = rest[close + closing_len..].trim();
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), HISTORY_DATETIME_FORMAT).ok()
}
