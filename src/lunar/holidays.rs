//! Holiday and holy-day tables
//!
//! Moving holidays are fixed lunar days; the Khmer New Year follows the
//! solar Songkran instant instead.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::i18n::Language;
use crate::lunar::chhankitek::{date_of, locate, months_of_year, governing_be};
use crate::lunar::names::{new_year_day_name, HolidayKind, LunarMonth};

/// One day of a holiday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayInfo {
    pub kind: HolidayKind,
    /// 1-based day within the holiday
    pub day: u8,
    /// Total days of the holiday
    pub length: u8,
}

impl HolidayInfo {
    /// Display name, with the day named for the new year days
    pub fn name(&self, lang: Language) -> String {
        match self.kind {
            HolidayKind::KhmerNewYear => format!(
                "{} ({})",
                self.kind.name(lang),
                new_year_day_name(self.day, lang)
            ),
            kind if self.length > 1 => {
                let day = crate::i18n::number(self.day, lang);
                match lang {
                    Language::En => format!("{} (day {})", kind.name(lang), day),
                    Language::Kh => format!("{} (ថ្ងៃទី{})", kind.name(lang), day),
                }
            }
            kind => kind.name(lang).to_string(),
        }
    }
}

/// Seconds in one sidereal solar year of the reckoning (292207 / 800 days)
const SOLAR_YEAR_SECONDS: i64 = 292207 * 108;

/// Songkran of 2024, the reference instant
fn reference_songkran() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, 13)
        .and_then(|d| d.and_hms_opt(22, 24, 0))
        .expect("reference instant is valid")
}

/// Moment the sun enters Aries in `year` (local time)
pub fn songkran(year: i32) -> NaiveDateTime {
    reference_songkran() + Duration::seconds((year as i64 - 2024) * SOLAR_YEAR_SECONDS)
}

/// First new year day (Moha Songkran)
pub fn new_year_date(year: i32) -> NaiveDate {
    songkran(year).date()
}

/// Third new year day (Loeng Sak), when the era changes
pub fn loeng_sak_date(year: i32) -> NaiveDate {
    new_year_date(year) + Duration::days(2)
}

/// Jolak Sakaraj year in force on `date`
pub fn jolak_sakaraj(date: NaiveDate) -> i64 {
    let year = date.year();
    if date >= loeng_sak_date(year) {
        year as i64 - 638
    } else {
        year as i64 - 639
    }
}

/// Jolak Sakaraj year used for the animal, which turns on Moha Songkran
pub fn animal_year_js(date: NaiveDate) -> i64 {
    let year = date.year();
    if date >= new_year_date(year) {
        year as i64 - 638
    } else {
        year as i64 - 639
    }
}

/// Lunar days that start each holiday, with the holiday length
fn lunar_holiday_rules(lunar_year: i32) -> Vec<(HolidayKind, LunarMonth, u32, u8)> {
    let be = governing_be(lunar_year);
    let asadh = if months_of_year(be).contains(&LunarMonth::Tutiyasadh) {
        LunarMonth::Tutiyasadh
    } else {
        LunarMonth::Asadh
    };
    let photrobot_length = crate::lunar::chhankitek::days_in_month(LunarMonth::Photrobot, be);

    vec![
        (HolidayKind::MeakBochea, LunarMonth::Meak, 14, 1),
        (HolidayKind::VisakhaBochea, LunarMonth::Pisak, 14, 1),
        (HolidayKind::RoyalPloughing, LunarMonth::Pisak, 18, 1),
        (HolidayKind::AsalhaBochea, asadh, 14, 1),
        (HolidayKind::CholVassa, asadh, 15, 1),
        // 14 Roach Photrobot through 1 Koeut Assoch
        (HolidayKind::PchumBen, LunarMonth::Photrobot, photrobot_length - 2, 3),
        // 14 Koeut Kadeuk through 1 Roach Kadeuk
        (HolidayKind::WaterFestival, LunarMonth::Kadeuk, 13, 3),
    ]
}

fn insert_run(
    holidays: &mut BTreeMap<NaiveDate, HolidayInfo>,
    year: i32,
    first: NaiveDate,
    kind: HolidayKind,
    length: u8,
) {
    for day in 0..length {
        let date = first + Duration::days(day as i64);
        if date.year() != year {
            continue;
        }
        holidays.entry(date).or_insert(HolidayInfo {
            kind,
            day: day + 1,
            length,
        });
    }
}

/// Lunar holidays falling in Gregorian `year`; on a shared date the first
/// holiday inserted wins
pub fn holidays_for_year(year: i32) -> BTreeMap<NaiveDate, HolidayInfo> {
    let mut holidays = BTreeMap::new();

    insert_run(
        &mut holidays,
        year,
        new_year_date(year),
        HolidayKind::KhmerNewYear,
        3,
    );

    // Runs can spill across the Gregorian year boundary
    for lunar_year in [year - 1, year, year + 1] {
        for (kind, month, day_index, length) in lunar_holiday_rules(lunar_year) {
            if let Some(first) = date_of(lunar_year, month, day_index) {
                insert_run(&mut holidays, year, first, kind, length);
            }
        }
    }

    holidays
}

/// Holy days (8 Koeut, 15 Koeut, 8 Roach, last day) of a Gregorian month
pub fn holy_days_in_month(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .filter(|d| is_holy_day(*d))
        .collect()
}

pub fn is_holy_day(date: NaiveDate) -> bool {
    let pos = locate(date);
    matches!(pos.day_index, 7 | 14 | 22) || pos.is_last_day()
}
