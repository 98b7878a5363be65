//! Lunar calendar vocabulary
//!
//! Month, phase, animal year, era and holiday names in Khmer and in the
//! romanized form used on English screens.

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Waxing (Koeut) or waning (Roach) half of a lunar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LunarPhase {
    Koeut,
    Roach,
}

impl LunarPhase {
    pub fn name(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (LunarPhase::Koeut, Language::En) => "Koeut",
            (LunarPhase::Roach, Language::En) => "Roach",
            (LunarPhase::Koeut, Language::Kh) => "កើត",
            (LunarPhase::Roach, Language::Kh) => "រោច",
        }
    }
}

/// Lunar months; the two Asadh months replace Asadh in leap-month years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LunarMonth {
    Migasir,
    Bos,
    Meak,
    Phalkun,
    Chet,
    Pisak,
    Jesth,
    Asadh,
    Srap,
    Photrobot,
    Assoch,
    Kadeuk,
    Pathamasadh,
    Tutiyasadh,
}

impl LunarMonth {
    pub fn name(&self, lang: Language) -> &'static str {
        match lang {
            Language::En => match self {
                LunarMonth::Migasir => "Migasir",
                LunarMonth::Bos => "Bos",
                LunarMonth::Meak => "Meak",
                LunarMonth::Phalkun => "Phalkun",
                LunarMonth::Chet => "Chet",
                LunarMonth::Pisak => "Pisak",
                LunarMonth::Jesth => "Jesth",
                LunarMonth::Asadh => "Asadh",
                LunarMonth::Srap => "Srap",
                LunarMonth::Photrobot => "Photrobot",
                LunarMonth::Assoch => "Assoch",
                LunarMonth::Kadeuk => "Kadeuk",
                LunarMonth::Pathamasadh => "Pathamasadh",
                LunarMonth::Tutiyasadh => "Tutiyasadh",
            },
            Language::Kh => match self {
                LunarMonth::Migasir => "មិគសិរ",
                LunarMonth::Bos => "បុស្ស",
                LunarMonth::Meak => "មាឃ",
                LunarMonth::Phalkun => "ផល្គុន",
                LunarMonth::Chet => "ចេត្រ",
                LunarMonth::Pisak => "ពិសាខ",
                LunarMonth::Jesth => "ជេស្ឋ",
                LunarMonth::Asadh => "អាសាឍ",
                LunarMonth::Srap => "ស្រាពណ៍",
                LunarMonth::Photrobot => "ភទ្របទ",
                LunarMonth::Assoch => "អស្សុជ",
                LunarMonth::Kadeuk => "កត្ដិក",
                LunarMonth::Pathamasadh => "បឋមាសាឍ",
                LunarMonth::Tutiyasadh => "ទុតិយាសាឍ",
            },
        }
    }

    /// Months whose full moon carries the Asalha Bochea observance
    pub fn is_rains_retreat_month(&self) -> bool {
        matches!(self, LunarMonth::Asadh | LunarMonth::Tutiyasadh)
    }
}

/// Twelve-year animal cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalYear {
    Rat,
    Ox,
    Tiger,
    Rabbit,
    Dragon,
    Snake,
    Horse,
    Goat,
    Monkey,
    Rooster,
    Dog,
    Pig,
}

impl AnimalYear {
    const CYCLE: [AnimalYear; 12] = [
        AnimalYear::Rat,
        AnimalYear::Ox,
        AnimalYear::Tiger,
        AnimalYear::Rabbit,
        AnimalYear::Dragon,
        AnimalYear::Snake,
        AnimalYear::Horse,
        AnimalYear::Goat,
        AnimalYear::Monkey,
        AnimalYear::Rooster,
        AnimalYear::Dog,
        AnimalYear::Pig,
    ];

    /// Animal of a Jolak Sakaraj year
    pub fn from_jolak_sakaraj(js: i64) -> Self {
        Self::CYCLE[(js + 10).rem_euclid(12) as usize]
    }

    pub fn name(&self, lang: Language) -> &'static str {
        match lang {
            Language::En => match self {
                AnimalYear::Rat => "Rat",
                AnimalYear::Ox => "Ox",
                AnimalYear::Tiger => "Tiger",
                AnimalYear::Rabbit => "Rabbit",
                AnimalYear::Dragon => "Dragon",
                AnimalYear::Snake => "Snake",
                AnimalYear::Horse => "Horse",
                AnimalYear::Goat => "Goat",
                AnimalYear::Monkey => "Monkey",
                AnimalYear::Rooster => "Rooster",
                AnimalYear::Dog => "Dog",
                AnimalYear::Pig => "Pig",
            },
            Language::Kh => match self {
                AnimalYear::Rat => "ជូត",
                AnimalYear::Ox => "ឆ្លូវ",
                AnimalYear::Tiger => "ខាល",
                AnimalYear::Rabbit => "ថោះ",
                AnimalYear::Dragon => "រោង",
                AnimalYear::Snake => "ម្សាញ់",
                AnimalYear::Horse => "មមី",
                AnimalYear::Goat => "មមែ",
                AnimalYear::Monkey => "វក",
                AnimalYear::Rooster => "រកា",
                AnimalYear::Dog => "ច",
                AnimalYear::Pig => "កុរ",
            },
        }
    }
}

/// Ten-year era cycle, indexed by the last digit of the Jolak Sakaraj year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sak(pub u8);

impl Sak {
    const KH: [&'static str; 10] = [
        "សំរឹទ្ធិស័ក",
        "ឯកស័ក",
        "ទោស័ក",
        "ត្រីស័ក",
        "ចត្វាស័ក",
        "បញ្ចស័ក",
        "ឆស័ក",
        "សប្តស័ក",
        "អដ្ឋស័ក",
        "នព្វស័ក",
    ];
    const EN: [&'static str; 10] = [
        "Samridhi Sak",
        "Ek Sak",
        "To Sak",
        "Trei Sak",
        "Chattva Sak",
        "Pancha Sak",
        "Chha Sak",
        "Sapta Sak",
        "Attha Sak",
        "Noppa Sak",
    ];

    pub fn from_jolak_sakaraj(js: i64) -> Self {
        Sak(js.rem_euclid(10) as u8)
    }

    pub fn name(&self, lang: Language) -> &'static str {
        let idx = (self.0 % 10) as usize;
        match lang {
            Language::En => Self::EN[idx],
            Language::Kh => Self::KH[idx],
        }
    }
}

/// Public holidays that follow the lunar calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HolidayKind {
    KhmerNewYear,
    MeakBochea,
    VisakhaBochea,
    RoyalPloughing,
    AsalhaBochea,
    CholVassa,
    PchumBen,
    WaterFestival,
}

impl HolidayKind {
    pub fn name(&self, lang: Language) -> &'static str {
        match lang {
            Language::En => match self {
                HolidayKind::KhmerNewYear => "Khmer New Year",
                HolidayKind::MeakBochea => "Meak Bochea",
                HolidayKind::VisakhaBochea => "Visakha Bochea",
                HolidayKind::RoyalPloughing => "Royal Ploughing Ceremony",
                HolidayKind::AsalhaBochea => "Asalha Bochea",
                HolidayKind::CholVassa => "Chol Vassa",
                HolidayKind::PchumBen => "Pchum Ben",
                HolidayKind::WaterFestival => "Water Festival",
            },
            Language::Kh => match self {
                HolidayKind::KhmerNewYear => "ចូលឆ្នាំខ្មែរ",
                HolidayKind::MeakBochea => "មាឃបូជា",
                HolidayKind::VisakhaBochea => "វិសាខបូជា",
                HolidayKind::RoyalPloughing => "ព្រះរាជពិធីច្រត់ព្រះនង្គ័ល",
                HolidayKind::AsalhaBochea => "អាសាឡ្ហបូជា",
                HolidayKind::CholVassa => "ចូលវស្សា",
                HolidayKind::PchumBen => "ភ្ជុំបិណ្ឌ",
                HolidayKind::WaterFestival => "បុណ្យអុំទូក",
            },
        }
    }
}

/// Names of the three new year days
pub fn new_year_day_name(day: u8, lang: Language) -> &'static str {
    match (day, lang) {
        (1, Language::En) => "Moha Songkran",
        (2, Language::En) => "Virak Vanabat",
        (_, Language::En) => "Virak Loeng Sak",
        (1, Language::Kh) => "មហាសង្ក្រាន្ត",
        (2, Language::Kh) => "វារៈវ័នបត",
        (_, Language::Kh) => "វារៈឡើងស័ក",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animal_and_sak_cycles() {
        // 2024 new year: Dragon, Chha Sak
        assert_eq!(AnimalYear::from_jolak_sakaraj(1386), AnimalYear::Dragon);
        assert_eq!(Sak::from_jolak_sakaraj(1386).name(Language::En), "Chha Sak");
        // 2025 new year: Snake, Sapta Sak
        assert_eq!(AnimalYear::from_jolak_sakaraj(1387), AnimalYear::Snake);
        assert_eq!(Sak::from_jolak_sakaraj(1387).name(Language::Kh), "សប្តស័ក");
    }

    #[test]
    fn test_month_names() {
        assert_eq!(LunarMonth::Pisak.name(Language::En), "Pisak");
        assert_eq!(LunarMonth::Kadeuk.name(Language::Kh), "កត្ដិក");
        assert!(LunarMonth::Tutiyasadh.is_rains_retreat_month());
        assert!(!LunarMonth::Pathamasadh.is_rains_retreat_month());
    }
}
