use super::common::*;
use crate::browser::{BrowserError, SiteSelectors, Timeouts};
use crate::workflows::history::ReservationHistoryFetcher;
use chrono::NaiveDateTime;

fn row(start: &str, facility: &str, number: &str) -> Vec<String> {
    vec![
        start.to_string(),
        "2024/06/01(Sat) 12:00".to_string(),
        facility.to_string(),
        number.to_string(),
        "予約済".to_string(),
    ]
}

fn now(day: u32, hour: u32) -> NaiveDateTime {
    date(2024, 6, day).and_hms_opt(hour, 0, 0).expect("valid time")
}

fn fetcher() -> ReservationHistoryFetcher {
    ReservationHistoryFetcher::new(SiteSelectors::default(), Timeouts::default())
}

fn history_session(pages: Vec<Vec<Vec<String>>>) -> ScriptedSession {
    let mut session = ScriptedSession::default();
    let site = session.site.clone();
    session.show(&site.history_section);
    session.history_pages = pages;
    session
}

#[test]
fn includes_rows_starting_after_now_only() {
    let pages = vec![vec![row("2024/06/01(Sat) 10:00", "Gym A", "R-1")]];

    let mut session = history_session(pages.clone());
    let records = fetcher().fetch_future(&mut session, now(1, 9));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].starts_at, now(1, 10));
    assert_eq!(records[0].facility, "Gym A");
    assert_eq!(records[0].reservation_number, "R-1");
    assert_eq!(records[0].start_time, "2024/06/01(Sat) 10:00");

    let mut session = history_session(pages.clone());
    assert!(fetcher().fetch_future(&mut session, now(1, 10)).is_empty());

    let mut session = history_session(pages);
    assert!(fetcher().fetch_future(&mut session, now(1, 11)).is_empty());
}

#[test]
fn walks_every_page_in_order() {
    let pages = vec![
        vec![
            row("2024/06/03(Mon) 10:00", "Gym A", "R-1"),
            row("2024/05/01(Wed) 10:00", "Gym A", "R-0"),
            row("2024/06/04(Tue) 10:00", "Pool B", "R-2"),
        ],
        vec![row("2024/06/02(Sun) 09:00", "Pool B", "R-3")],
    ];
    let mut session = history_session(pages);
    let site = SiteSelectors::default();

    let records = fetcher().fetch_future(&mut session, now(1, 0));

    assert_eq!(
        records
            .iter()
            .map(|record| record.reservation_number.as_str())
            .collect::<Vec<_>>(),
        vec!["R-1", "R-2", "R-3"]
    );
    assert_eq!(session.clicked(&site.history_next_page), 1);
}

#[test]
fn drops_unparseable_and_short_rows() {
    let pages = vec![vec![
        row("未定", "Gym A", "R-1"),
        vec!["2024/06/03(Mon) 10:00".to_string()],
        row("2024/06/03(Mon) 10:00", "Gym A", "R-2"),
    ]];
    let mut session = history_session(pages);

    let records = fetcher().fetch_future(&mut session, now(1, 0));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reservation_number, "R-2");
}

#[test]
fn empty_history_returns_nothing() {
    let mut session = history_session(Vec::new());
    assert!(fetcher().fetch_future(&mut session, now(1, 0)).is_empty());
}

#[test]
fn failed_page_turn_keeps_collected_rows() {
    let pages = vec![
        vec![row("2024/06/03(Mon) 10:00", "Gym A", "R-1")],
        vec![row("2024/06/04(Tue) 10:00", "Gym A", "R-2")],
    ];
    let mut session = history_session(pages);
    let site = SiteSelectors::default();
    session.hide(&site.history_section);

    let records = fetcher().fetch_future(&mut session, now(1, 0));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reservation_number, "R-1");
}

#[test]
fn unreadable_table_stops_quietly() {
    let mut session = history_session(vec![vec![row("2024/06/03(Mon) 10:00", "Gym A", "R-1")]]);
    let site = SiteSelectors::default();
    session.break_selector(&site.history_rows, BrowserError::Protocol("gone".to_string()));

    assert!(fetcher().fetch_future(&mut session, now(1, 0)).is_empty());
}
