//! Chhankitek arithmetic
//!
//! The Khmer lunisolar reckoning: each lunar year (starting with 1 Koeut
//! Migasir, around December) is either 354 days, 355 days (leap day added
//! to Jesth) or 384 days (Asadh doubled into Pathamasadh and Tutiyasadh).
//! Leap decisions come from the aharkun/avoman/bodithey quantities of the
//! year's Buddhist Era number.
//!
//! Dates are located by stepping whole lunar years from a fixed epoch and
//! then whole months inside the year.

use chrono::{Datelike, Duration, NaiveDate};

use crate::lunar::names::LunarMonth;

/// Lunar year whose first day is [`epoch`]
pub const EPOCH_LUNAR_YEAR: i32 = 1900;

/// Offset from a lunar year number to the BE number driving its leap rules
const BE_OFFSET: i64 = 544;

/// 1 Koeut Migasir of lunar year 1900
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 4).expect("epoch is a valid date")
}

/// Days elapsed since the start of the era
pub fn aharkun(be: i64) -> i64 {
    (be * 292207 + 499) / 800 + 4
}

/// Lunar day error accumulated against the solar year
pub fn avoman(be: i64) -> i64 {
    (11 * aharkun(be) + 25) % 692
}

/// Age of the moon at the start of the year
pub fn bodithey(be: i64) -> i64 {
    let a = aharkun(be);
    ((11 * a + 25) / 692 + a + 29) % 30
}

pub fn kromathupul(be: i64) -> i64 {
    800 - ((292207 * (be - 1) + 373) % 800)
}

pub fn is_solar_leap(be: i64) -> bool {
    kromathupul(be) <= 207
}

/// Raw leap flags before carrying a double leap into the next year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoditheyLeap {
    None,
    Month,
    Day,
    Both,
}

fn bodithey_leap(be: i64) -> BoditheyLeap {
    let av = avoman(be);
    let b = bodithey(be);

    let mut month_leap = b >= 25 || b <= 5;
    let day_leap = if is_solar_leap(be) {
        av <= 126
    } else {
        // A zero avoman next year steals the leap day
        av <= 137 && avoman(be + 1) != 0
    };

    if b == 25 && bodithey(be + 1) == 5 {
        month_leap = false;
    }
    if b == 24 && bodithey(be + 1) == 6 {
        month_leap = true;
    }

    match (month_leap, day_leap) {
        (true, true) => BoditheyLeap::Both,
        (true, false) => BoditheyLeap::Month,
        (false, true) => BoditheyLeap::Day,
        (false, false) => BoditheyLeap::None,
    }
}

/// What a lunar year adds to the common 354 days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearKind {
    Common,
    LeapDay,
    LeapMonth,
}

/// Leap kind of the lunar year governed by `be`
pub fn year_kind(be: i64) -> YearKind {
    match bodithey_leap(be) {
        BoditheyLeap::Both | BoditheyLeap::Month => YearKind::LeapMonth,
        BoditheyLeap::Day => YearKind::LeapDay,
        // A year cannot take both, so the leap day moves to the next year
        BoditheyLeap::None if bodithey_leap(be - 1) == BoditheyLeap::Both => YearKind::LeapDay,
        BoditheyLeap::None => YearKind::Common,
    }
}

pub fn days_in_year(be: i64) -> i64 {
    match year_kind(be) {
        YearKind::Common => 354,
        YearKind::LeapDay => 355,
        YearKind::LeapMonth => 384,
    }
}

pub fn days_in_month(month: LunarMonth, be: i64) -> u32 {
    match month {
        LunarMonth::Jesth if year_kind(be) == YearKind::LeapDay => 30,
        LunarMonth::Pathamasadh | LunarMonth::Tutiyasadh => 30,
        LunarMonth::Migasir
        | LunarMonth::Meak
        | LunarMonth::Chet
        | LunarMonth::Jesth
        | LunarMonth::Srap
        | LunarMonth::Assoch => 29,
        _ => 30,
    }
}

/// Months of a lunar year in order
pub fn months_of_year(be: i64) -> Vec<LunarMonth> {
    let mut months = vec![
        LunarMonth::Migasir,
        LunarMonth::Bos,
        LunarMonth::Meak,
        LunarMonth::Phalkun,
        LunarMonth::Chet,
        LunarMonth::Pisak,
        LunarMonth::Jesth,
    ];
    if year_kind(be) == YearKind::LeapMonth {
        months.push(LunarMonth::Pathamasadh);
        months.push(LunarMonth::Tutiyasadh);
    } else {
        months.push(LunarMonth::Asadh);
    }
    months.extend([
        LunarMonth::Srap,
        LunarMonth::Photrobot,
        LunarMonth::Assoch,
        LunarMonth::Kadeuk,
    ]);
    months
}

/// BE number whose leap rules govern a lunar year
pub fn governing_be(lunar_year: i32) -> i64 {
    lunar_year as i64 + BE_OFFSET
}

/// First day (1 Koeut Migasir) of a lunar year
pub fn lunar_year_start(lunar_year: i32) -> NaiveDate {
    let mut start = epoch();
    let mut year = EPOCH_LUNAR_YEAR;
    while year < lunar_year {
        start += Duration::days(days_in_year(governing_be(year)));
        year += 1;
    }
    while year > lunar_year {
        year -= 1;
        start -= Duration::days(days_in_year(governing_be(year)));
    }
    start
}

/// Where a Gregorian date falls in the lunar calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarPosition {
    /// Named after the Gregorian year in which most of it falls
    pub lunar_year: i32,
    pub month: LunarMonth,
    /// 0-based day of the month; 0..=14 waxing, 15.. waning
    pub day_index: u32,
    pub month_length: u32,
}

impl LunarPosition {
    pub fn is_last_day(&self) -> bool {
        self.day_index + 1 == self.month_length
    }
}

/// Locate a Gregorian date
pub fn locate(date: NaiveDate) -> LunarPosition {
    // The lunar year named after `date`'s year starts in the previous
    // December at the latest; the next one may already have begun.
    let mut lunar_year = date.year();
    let mut start = lunar_year_start(lunar_year);
    while start > date {
        lunar_year -= 1;
        start -= Duration::days(days_in_year(governing_be(lunar_year)));
    }
    loop {
        let next = start + Duration::days(days_in_year(governing_be(lunar_year)));
        if next > date {
            break;
        }
        start = next;
        lunar_year += 1;
    }

    let be = governing_be(lunar_year);
    let mut offset = (date - start).num_days() as u32;
    for month in months_of_year(be) {
        let length = days_in_month(month, be);
        if offset < length {
            return LunarPosition {
                lunar_year,
                month,
                day_index: offset,
                month_length: length,
            };
        }
        offset -= length;
    }

    // Unreachable: the month lengths add up to the year length
    LunarPosition {
        lunar_year,
        month: LunarMonth::Kadeuk,
        day_index: 29,
        month_length: 30,
    }
}

/// Gregorian date of a lunar day; `None` when the month is absent that year
/// or the day is past the month's end
pub fn date_of(lunar_year: i32, month: LunarMonth, day_index: u32) -> Option<NaiveDate> {
    let be = governing_be(lunar_year);
    let mut offset: i64 = 0;
    for m in months_of_year(be) {
        let length = days_in_month(m, be);
        if m == month {
            if day_index >= length {
                return None;
            }
            return Some(lunar_year_start(lunar_year) + Duration::days(offset + day_index as i64));
        }
        offset += length as i64;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_kinds() {
        // Lunar years 2016..=2030
        let expected = [
            (2016, 355),
            (2017, 354),
            (2018, 384),
            (2019, 354),
            (2020, 355),
            (2021, 384),
            (2022, 354),
            (2023, 384),
            (2024, 354),
            (2025, 355),
            (2026, 384),
            (2027, 354),
            (2028, 354),
            (2029, 384),
            (2030, 355),
        ];
        for (year, days) in expected {
            assert_eq!(days_in_year(governing_be(year)), days, "lunar year {}", year);
        }
    }

    #[test]
    fn test_month_lengths_sum_to_year() {
        for year in 1990..2040 {
            let be = governing_be(year);
            let total: i64 = months_of_year(be)
                .iter()
                .map(|m| days_in_month(*m, be) as i64)
                .sum();
            assert_eq!(total, days_in_year(be));
        }
    }

    #[test]
    fn test_epoch_position() {
        let pos = locate(epoch());
        assert_eq!(pos.lunar_year, 1900);
        assert_eq!(pos.month, LunarMonth::Migasir);
        assert_eq!(pos.day_index, 0);

        let before = locate(ymd(1899, 12, 3));
        assert_eq!(before.month, LunarMonth::Kadeuk);
        assert_eq!(before.day_index, 29);
    }

    #[test]
    fn test_known_full_moons() {
        let visak = locate(ymd(2024, 5, 22));
        assert_eq!((visak.month, visak.day_index), (LunarMonth::Pisak, 14));

        let water = locate(ymd(2024, 11, 15));
        assert_eq!((water.month, water.day_index), (LunarMonth::Kadeuk, 14));

        let asalha = locate(ymd(2023, 8, 1));
        assert_eq!((asalha.month, asalha.day_index), (LunarMonth::Tutiyasadh, 14));
    }

    #[test]
    fn test_year_boundaries() {
        let jan = locate(ymd(2024, 1, 1));
        assert_eq!((jan.lunar_year, jan.month, jan.day_index), (2024, LunarMonth::Migasir, 19));

        let dec = locate(ymd(2024, 12, 25));
        assert_eq!((dec.lunar_year, dec.month, dec.day_index), (2025, LunarMonth::Migasir, 24));

        let old = locate(ymd(1850, 6, 1));
        assert_eq!((old.lunar_year, old.month, old.day_index), (1850, LunarMonth::Jesth, 19));
    }

    #[test]
    fn test_date_of_inverts_locate() {
        let mut date = ymd(2023, 11, 1);
        while date < ymd(2025, 3, 1) {
            let pos = locate(date);
            assert_eq!(date_of(pos.lunar_year, pos.month, pos.day_index), Some(date));
            date = date.succ_opt().unwrap();
        }
        assert_eq!(date_of(2024, LunarMonth::Pathamasadh, 0), None);
        assert_eq!(date_of(2024, LunarMonth::Meak, 29), None);
    }
}
