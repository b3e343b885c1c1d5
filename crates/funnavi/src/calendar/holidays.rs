use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Japanese public holidays for one calendar year, including substitute
/// holidays and citizens' holidays.
///
/// The rules follow the Act on National Holidays as amended through 2018;
/// results are reliable for 2000 through 2099.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicHolidays {
    days: BTreeSet<NaiveDate>,
}

impl PublicHolidays {
    pub fn for_year(year: i32) -> Self {
        let national = national_holidays(year);
        let mut days = national.clone();

        days.extend(citizens_holidays(&national));

        for holiday in &national {
            if holiday.weekday() != Weekday::Sun {
                continue;
            }
            let mut substitute = *holiday + Duration::days(1);
            while days.contains(&substitute) {
                substitute += Duration::days(1);
            }
            if substitute.year() == year {
                days.insert(substitute);
            }
        }

        Self { days }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().copied()
    }
}

fn national_holidays(year: i32) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    let mut add = |month: u32, day: u32| {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            days.insert(date);
        }
    };

    add(1, 1);
    add(2, 11);
    add(4, 29);
    add(5, 3);
    add(5, 5);
    add(11, 3);
    add(11, 23);

    if year >= 2007 {
        add(5, 4);
    }

    if year >= 2020 {
        add(2, 23);
    } else if (1989..=2018).contains(&year) {
        add(12, 23);
    }

    if year == 2019 {
        add(5, 1);
        add(10, 22);
    }

    match year {
        2020 => {
            add(7, 23);
            add(7, 24);
            add(8, 10);
        }
        2021 => {
            add(7, 22);
            add(7, 23);
            add(8, 8);
        }
        _ => {
            if year >= 2016 {
                add(8, 11);
            }
        }
    }

    if (1996..=2002).contains(&year) {
        add(7, 20);
    }
    if year < 2003 {
        add(9, 15);
    }
    if year < 2000 {
        add(1, 15);
        add(10, 10);
    }

    add(3, vernal_equinox_day(year));
    add(9, autumnal_equinox_day(year));

    let mondays = [
        (year >= 2000).then_some((1, 2)),
        (year >= 2003 && year != 2020 && year != 2021).then_some((7, 3)),
        (year >= 2003).then_some((9, 3)),
        (year >= 2000 && year != 2020 && year != 2021).then_some((10, 2)),
    ];
    for (month, nth) in mondays.into_iter().flatten() {
        if let Some(date) = NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Mon, nth) {
            days.insert(date);
        }
    }

    days
}

fn citizens_holidays(national: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    national
        .iter()
        .filter_map(|holiday| {
            let between = *holiday + Duration::days(1);
            let after = *holiday + Duration::days(2);
            let sandwiched = !national.contains(&between) && national.contains(&after);
            (sandwiched && between.weekday() != Weekday::Sun).then_some(between)
        })
        .collect()
}

fn vernal_equinox_day(year: i32) -> u32 {
    equinox_day(20.8431, year)
}

fn autumnal_equinox_day(year: i32) -> u32 {
    equinox_day(23.2488, year)
}

fn equinox_day(base: f64, year: i32) -> u32 {
    let offset = f64::from(year - 1980);
    let leap_correction = f64::from((year - 1980).div_euclid(4));
    (base + 0.242194 * offset - leap_correction).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn computes_2024_calendar() {
        let holidays = PublicHolidays::for_year(2024);
        let expected = [
            date(2024, 1, 1),
            date(2024, 1, 8),
            date(2024, 2, 11),
            date(2024, 2, 12),
            date(2024, 2, 23),
            date(2024, 3, 20),
            date(2024, 4, 29),
            date(2024, 5, 3),
            date(2024, 5, 4),
            date(2024, 5, 5),
            date(2024, 5, 6),
            date(2024, 7, 15),
            date(2024, 8, 11),
            date(2024, 8, 12),
            date(2024, 9, 16),
            date(2024, 9, 22),
            date(2024, 9, 23),
            date(2024, 10, 14),
            date(2024, 11, 3),
            date(2024, 11, 4),
            date(2024, 11, 23),
        ];

        assert_eq!(holidays.iter().collect::<Vec<_>>(), expected.to_vec());
    }

    #[test]
    fn sandwiched_weekday_becomes_citizens_holiday() {
        let holidays = PublicHolidays::for_year(2026);
        assert!(holidays.contains(date(2026, 9, 21)));
        assert!(holidays.contains(date(2026, 9, 22)));
        assert!(holidays.contains(date(2026, 9, 23)));
    }

    #[test]
    fn substitute_skips_over_consecutive_holidays() {
        let holidays = PublicHolidays::for_year(2020);
        assert!(holidays.contains(date(2020, 5, 6)));
        assert!(!holidays.contains(date(2020, 5, 7)));
    }

    #[test]
    fn handles_one_off_years() {
        let enthronement = PublicHolidays::for_year(2019);
        for day in [
            date(2019, 4, 30),
            date(2019, 5, 1),
            date(2019, 5, 2),
            date(2019, 10, 22),
        ] {
            assert!(enthronement.contains(day), "{day} should be a holiday");
        }

        let olympics = PublicHolidays::for_year(2021);
        assert!(olympics.contains(date(2021, 7, 22)));
        assert!(olympics.contains(date(2021, 8, 9)));
        assert!(!olympics.contains(date(2021, 10, 11)));
    }

    #[test]
    fn emperors_birthday_moves_with_the_era() {
        assert!(PublicHolidays::for_year(2018).contains(date(2018, 12, 23)));
        assert!(!PublicHolidays::for_year(2019).contains(date(2019, 12, 23)));
        assert!(!PublicHolidays::for_year(2019).contains(date(2019, 2, 23)));
        assert!(PublicHolidays::for_year(2025).contains(date(2025, 2, 23)));
    }
}
