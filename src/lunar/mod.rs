//! Lunar calendar adapter
//!
//! The calendar views show the Khmer lunar date, holy days and lunar
//! holidays next to the Gregorian date. Everything goes through the
//! [`LunarCalendar`] trait so views and handlers never depend on the
//! arithmetic directly.
//!
//! - **chhankitek**: lunar year/month arithmetic
//! - **holidays**: holiday runs, Songkran and holy days
//! - **names**: Khmer and English vocabulary

pub mod chhankitek;
pub mod holidays;
pub mod names;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::i18n::{number, Language};

pub use holidays::HolidayInfo;
pub use names::{AnimalYear, HolidayKind, LunarMonth, LunarPhase, Sak};

/// Gregorian years the arithmetic is trusted for
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1800..=2300;

/// Errors from the lunar calendar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LunarError {
    #[error("Year {0} is outside the supported range 1800..=2300")]
    YearOutOfRange(i32),

    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
}

pub type LunarResult<T> = Result<T, LunarError>;

/// A Gregorian date expressed in the Khmer lunar calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LunarInfo {
    pub date: NaiveDate,
    /// 1..=15 within the phase
    pub day: u32,
    pub phase: LunarPhase,
    pub month: LunarMonth,
    pub animal_year: AnimalYear,
    pub sak: Sak,
    pub buddhist_era: i64,
    pub jolak_sakaraj: i64,
    pub is_holy_day: bool,
}

impl LunarInfo {
    /// Short cell label, e.g. `5 Koeut` / `៥កើត`
    pub fn short_label(&self, lang: Language) -> String {
        match lang {
            Language::En => format!("{} {}", self.day, self.phase.name(lang)),
            Language::Kh => format!("{}{}", number(self.day, lang), self.phase.name(lang)),
        }
    }

    /// Full date line
    pub fn format(&self, lang: Language) -> String {
        match lang {
            Language::En => format!(
                "{} {} {}, {} year, {}, BE {}",
                self.day,
                self.phase.name(lang),
                self.month.name(lang),
                self.animal_year.name(lang),
                self.sak.name(lang),
                self.buddhist_era
            ),
            Language::Kh => format!(
                "{}{} ខែ{} ឆ្នាំ{} {} ព.ស. {}",
                number(self.day, lang),
                self.phase.name(lang),
                self.month.name(lang),
                self.animal_year.name(lang),
                self.sak.name(lang),
                number(self.buddhist_era, lang)
            ),
        }
    }
}

/// Lunar calendar capability used by the views and the API
pub trait LunarCalendar: Send + Sync {
    fn gregorian_to_lunar(&self, date: NaiveDate) -> LunarResult<LunarInfo>;

    /// Lunar holidays of a Gregorian year, keyed by date
    fn lunar_holidays_for_year(&self, year: i32) -> LunarResult<BTreeMap<NaiveDate, HolidayInfo>>;

    /// Holy days of a Gregorian month
    fn holy_days_in_month(&self, year: i32, month: u32) -> LunarResult<Vec<NaiveDate>>;
}

/// Khmer Chhankitek calendar
#[derive(Debug, Clone, Copy, Default)]
pub struct KhmerCalendar;

impl KhmerCalendar {
    pub fn new() -> Self {
        Self
    }

    fn check_year(year: i32) -> LunarResult<()> {
        if SUPPORTED_YEARS.contains(&year) {
            Ok(())
        } else {
            Err(LunarError::YearOutOfRange(year))
        }
    }
}

impl LunarCalendar for KhmerCalendar {
    fn gregorian_to_lunar(&self, date: NaiveDate) -> LunarResult<LunarInfo> {
        Self::check_year(date.year())?;

        let pos = chhankitek::locate(date);
        let (day, phase) = if pos.day_index < 15 {
            (pos.day_index + 1, LunarPhase::Koeut)
        } else {
            (pos.day_index - 14, LunarPhase::Roach)
        };

        // The BE year turns the day after the Visakha Bochea full moon
        let before_visak = pos.month < LunarMonth::Pisak
            || (pos.month == LunarMonth::Pisak && pos.day_index <= 14);
        let buddhist_era = pos.lunar_year as i64 + if before_visak { 543 } else { 544 };

        let js = holidays::jolak_sakaraj(date);

        Ok(LunarInfo {
            date,
            day,
            phase,
            month: pos.month,
            animal_year: AnimalYear::from_jolak_sakaraj(holidays::animal_year_js(date)),
            sak: Sak::from_jolak_sakaraj(js),
            buddhist_era,
            jolak_sakaraj: js,
            is_holy_day: matches!(pos.day_index, 7 | 14 | 22) || pos.is_last_day(),
        })
    }

    fn lunar_holidays_for_year(&self, year: i32) -> LunarResult<BTreeMap<NaiveDate, HolidayInfo>> {
        Self::check_year(year)?;
        Ok(holidays::holidays_for_year(year))
    }

    fn holy_days_in_month(&self, year: i32, month: u32) -> LunarResult<Vec<NaiveDate>> {
        Self::check_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(LunarError::InvalidMonth(month));
        }
        Ok(holidays::holy_days_in_month(year, month))
    }
}
