//! English and Khmer labels
//!
//! Static label tables used by the view models and the lunar calendar.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::storage::AppointmentStatus;

/// Display language, stored under `calendar-language`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Kh,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Kh => "kh",
        }
    }

    /// Parse a stored value; anything unrecognised is English
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "kh" | "km" | "khmer" => Language::Kh,
            _ => Language::En,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

const KHMER_DIGITS: [char; 10] = ['០', '១', '២', '៣', '៤', '៥', '៦', '៧', '៨', '៩'];

/// Replace ASCII digits with Khmer digits
pub fn khmer_numerals(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => KHMER_DIGITS[d as usize],
            None => c,
        })
        .collect()
}

/// Format a number in the language's digits
pub fn number(n: impl std::fmt::Display, lang: Language) -> String {
    match lang {
        Language::En => n.to_string(),
        Language::Kh => khmer_numerals(&n.to_string()),
    }
}

pub fn status_label(status: AppointmentStatus, lang: Language) -> &'static str {
    use AppointmentStatus::*;
    match (lang, status) {
        (Language::En, Scheduled) => "Scheduled",
        (Language::En, Arrived) => "Arrived",
        (Language::En, Ready) => "Ready",
        (Language::En, InTreatment) => "In Treatment",
        (Language::En, Completed) => "Completed",
        (Language::En, NeedsFollowup) => "Needs Follow-up",
        (Language::En, WalkIn) => "Walk-in",
        (Language::En, NoShow) => "No Show",
        (Language::En, Cancelled) => "Cancelled",
        (Language::Kh, Scheduled) => "បានកំណត់ពេល",
        (Language::Kh, Arrived) => "បានមកដល់",
        (Language::Kh, Ready) => "រួចរាល់",
        (Language::Kh, InTreatment) => "កំពុងព្យាបាល",
        (Language::Kh, Completed) => "បានបញ្ចប់",
        (Language::Kh, NeedsFollowup) => "ត្រូវតាមដាន",
        (Language::Kh, WalkIn) => "មកដោយផ្ទាល់",
        (Language::Kh, NoShow) => "មិនបានមក",
        (Language::Kh, Cancelled) => "បានលុបចោល",
    }
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const MONTHS_KH: [&str; 12] = [
    "មករា", "កុម្ភៈ", "មីនា", "មេសា", "ឧសភា", "មិថុនា", "កក្កដា", "សីហា", "កញ្ញា", "តុលា",
    "វិច្ឆិកា", "ធ្នូ",
];

/// Gregorian month name, `month` in 1..=12
pub fn month_name(month: u32, lang: Language) -> &'static str {
    let idx = (month.clamp(1, 12) - 1) as usize;
    match lang {
        Language::En => MONTHS_EN[idx],
        Language::Kh => MONTHS_KH[idx],
    }
}

pub fn weekday_name(day: Weekday, lang: Language) -> &'static str {
    let idx = day.num_days_from_sunday() as usize;
    match lang {
        Language::En => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"][idx],
        Language::Kh => ["អាទិត្យ", "ចន្ទ", "អង្គារ", "ពុធ", "ព្រហស្បតិ៍", "សុក្រ", "សៅរ៍"][idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::parse_lenient("kh"), Language::Kh);
        assert_eq!(Language::parse_lenient("fr"), Language::En);
        assert_eq!(serde_json::to_string(&Language::Kh).unwrap(), "\"kh\"");
        assert_eq!(Language::default().code(), "en");
    }

    #[test]
    fn test_khmer_numerals() {
        assert_eq!(khmer_numerals("2568"), "២៥៦៨");
        assert_eq!(number(15, Language::Kh), "១៥");
        assert_eq!(number(15, Language::En), "15");
        assert_eq!(khmer_numerals("09:30"), "០៩:៣០");
    }

    #[test]
    fn test_every_status_has_labels() {
        for status in AppointmentStatus::all() {
            assert!(!status_label(*status, Language::En).is_empty());
            assert!(!status_label(*status, Language::Kh).is_empty());
        }
        assert_eq!(status_label(AppointmentStatus::InTreatment, Language::En), "In Treatment");
    }

    #[test]
    fn test_calendar_names() {
        assert_eq!(month_name(4, Language::En), "April");
        assert_eq!(month_name(4, Language::Kh), "មេសា");
        assert_eq!(weekday_name(Weekday::Sun, Language::En), "Sun");
        assert_eq!(weekday_name(Weekday::Sat, Language::Kh), "សៅរ៍");
    }
}
