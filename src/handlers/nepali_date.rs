use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const NEPALI_MONTHS: [&str; 12] = [
    "Baisakh", "Jestha", "Asar", "Shrawan", "Bhadra", "Ashwin", "Kartik", "Mangsir", "Poush",
    "Magh", "Falgun", "Chaitra",
];

// Other spellings the backend and users send, mapped to the month index.
const MONTH_ALIASES: [(&str, usize); 12] = [
    ("baishakh", 0),
    ("jeth", 1),
    ("ashadh", 2),
    ("asadh", 2),
    ("saun", 3),
    ("bhadau", 4),
    ("asoj", 5),
    ("ashoj", 5),
    ("push", 8),
    ("phagun", 10),
    ("fagun", 10),
    ("chait", 11),
];

// Nepali month in force on the 1st of each Gregorian month (Jan..Dec).
const MONTH_TABLE: [usize; 12] = [8, 9, 10, 11, 0, 1, 2, 3, 4, 5, 6, 7];

/// Day of a Gregorian month on which the next Nepali month is taken to begin.
pub const MID_MONTH_DAY: u32 = 14;

/// A Nepali calendar month. Orders chronologically: year, then position in
/// the Baisakh..Chaitra cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NepaliPeriod {
    pub year: i32,
    pub month_index: usize,
}

impl NepaliPeriod {
    pub fn new(year: i32, month_index: usize) -> Option<Self> {
        (month_index < 12).then_some(NepaliPeriod { year, month_index })
    }

    pub fn from_label(label: &str, year: i32) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        let index = NEPALI_MONTHS
            .iter()
            .position(|m| m.to_lowercase() == wanted)
            .or_else(|| {
                MONTH_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == wanted)
                    .map(|(_, i)| *i)
            })?;
        Self::new(year, index)
    }

    pub fn label(&self) -> &'static str {
        NEPALI_MONTHS[self.month_index % 12]
    }

    /// Approximate conversion. Uses a fixed month table with a mid-month
    /// boundary and a +56/+57 year offset around mid-April; it does not model
    /// the varying lengths of Nepali months.
    pub fn approximate(date: NaiveDate) -> Self {
        let month0 = date.month0() as usize;
        let past_boundary = date.day() >= MID_MONTH_DAY;
        let month_index = (MONTH_TABLE[month0] + usize::from(past_boundary)) % 12;
        let after_new_year = date.month() > 4 || (date.month() == 4 && past_boundary);
        let year = date.year() + if after_new_year { 57 } else { 56 };
        NepaliPeriod { year, month_index }
    }

    /// Backend-supplied fields win; the approximation only fills gaps.
    pub fn resolve(
        label: Option<&str>,
        year: Option<i32>,
        fallback: Option<NaiveDate>,
    ) -> Option<Self> {
        match (label, year) {
            (Some(label), Some(year)) => {
                Self::from_label(label, year).or_else(|| fallback.map(Self::approximate))
            }
            _ => fallback.map(Self::approximate),
        }
    }
}
