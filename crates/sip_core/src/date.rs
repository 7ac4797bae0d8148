//! Interpretation of the date strings SIP prints next to each article.
//!
//! The site renders dates as `24. Нов, 2025. у 13:52`: a day, a Serbian
//! Cyrillic month name (full or abbreviated), a year and an optional
//! `у HH:MM` time. Anything that cannot be read precisely degrades to the
//! first year-like token, and anything without one is left unparsed.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DAY_MONTH_YEAR: Regex =
        Regex::new(r"(\d{1,2})\.\s*(\p{L}+).*?(\d{4})").unwrap();
    static ref TIME_AFTER_MARKER: Regex = Regex::new(r"^\s*(\d{1,2}):(\d{2})").unwrap();
    static ref ANY_YEAR: Regex = Regex::new(r"(\d{4})").unwrap();
}

/// How much of a [`ParsedDate`] came from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Day,
    Minute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub at: DateTime<Utc>,
    pub precision: DatePrecision,
}

/// Month names and the "at" marker that introduces a time of day.
#[derive(Debug, Clone)]
pub struct DateVocabulary {
    months: HashMap<String, u32>,
    at_marker: String,
}

impl DateVocabulary {
    pub fn new<'a>(months: impl IntoIterator<Item = (&'a str, u32)>, at_marker: &str) -> Self {
        Self {
            months: months
                .into_iter()
                .map(|(name, number)| (name.to_lowercase(), number))
                .collect(),
            at_marker: at_marker.to_string(),
        }
    }

    pub fn month(&self, name: &str) -> Option<u32> {
        self.months.get(&name.to_lowercase()).copied()
    }

    pub fn at_marker(&self) -> &str {
        &self.at_marker
    }
}

impl Default for DateVocabulary {
    fn default() -> Self {
        Self::new(
            [
                ("јануар", 1),
                ("јан", 1),
                ("фебруар", 2),
                ("феб", 2),
                ("март", 3),
                ("мар", 3),
                ("април", 4),
                ("апр", 4),
                ("мај", 5),
                ("јун", 6),
                ("јул", 7),
                ("август", 8),
                ("авг", 8),
                ("септембар", 9),
                ("сеп", 9),
                ("октобар", 10),
                ("окт", 10),
                ("новембар", 11),
                ("нов", 11),
                ("децембар", 12),
                ("дец", 12),
            ],
            "у",
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateInterpreter {
    vocabulary: DateVocabulary,
}

impl DateInterpreter {
    pub fn new(vocabulary: DateVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn parse(&self, raw: &str) -> Option<ParsedDate> {
        self.parse_day_month_year(raw).or_else(|| {
            let fallback = Self::parse_year_only(raw);
            tracing::debug!(raw, year_only = fallback.is_some(), "date.fallback");
            fallback
        })
    }

    /// Absent and unreadable dates count as recent; only a date that is
    /// known to precede `cutoff` does not.
    pub fn is_recent(&self, raw: Option<&str>, cutoff: DateTime<Utc>) -> bool {
        match raw.and_then(|raw| self.parse(raw)) {
            Some(parsed) => parsed.at >= cutoff,
            None => true,
        }
    }

    fn parse_day_month_year(&self, raw: &str) -> Option<ParsedDate> {
        let caps = DAY_MONTH_YEAR.captures(raw)?;
        let day: u32 = caps[1].parse().ok()?;
        let month = self.vocabulary.month(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        let (naive, precision) = match self
            .time_of_day(raw)
            .and_then(|(hour, minute)| date.and_hms_opt(hour, minute, 0))
        {
            Some(naive) => (naive, DatePrecision::Minute),
            None => (date.and_hms_opt(0, 0, 0)?, DatePrecision::Day),
        };

        Some(ParsedDate {
            at: Utc.from_utc_datetime(&naive),
            precision,
        })
    }

    fn time_of_day(&self, raw: &str) -> Option<(u32, u32)> {
        let marker = self.vocabulary.at_marker();
        if marker.is_empty() {
            return None;
        }
        raw.match_indices(marker).find_map(|(idx, _)| {
            let caps = TIME_AFTER_MARKER.captures(&raw[idx + marker.len()..])?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
    }

    fn parse_year_only(raw: &str) -> Option<ParsedDate> {
        let year: i32 = ANY_YEAR.captures(raw)?[1].parse().ok()?;
        let naive = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        Some(ParsedDate {
            at: Utc.from_utc_datetime(&naive),
            precision: DatePrecision::Year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_abbreviated_month_with_time() {
        let parsed = DateInterpreter::default()
            .parse("24. Нов, 2025. у 13:52")
            .unwrap();
        assert_eq!(parsed.at, utc(2025, 11, 24, 13, 52));
        assert_eq!(parsed.precision, DatePrecision::Minute);
    }

    #[test]
    fn test_full_month_without_time_is_midnight() {
        let parsed = DateInterpreter::default().parse("3. децембар 2025.").unwrap();
        assert_eq!(parsed.at, utc(2025, 12, 3, 0, 0));
        assert_eq!(parsed.precision, DatePrecision::Day);
    }

    #[test]
    fn test_months_spelled_with_je() {
        let interpreter = DateInterpreter::default();
        assert_eq!(interpreter.parse("1. Мај 2025.").unwrap().at, utc(2025, 5, 1, 0, 0));
        assert_eq!(
            interpreter.parse("15. Јун, 2024. у 9:05").unwrap().at,
            utc(2024, 6, 15, 9, 5)
        );
    }

    #[test]
    fn test_every_month_word_round_trips() {
        let vocabulary = DateVocabulary::default();
        let interpreter = DateInterpreter::new(vocabulary.clone());
        assert_eq!(vocabulary.months.len(), 21);

        for (word, &month) in &vocabulary.months {
            let mut letters = word.chars();
            let capitalized: String = letters
                .next()
                .into_iter()
                .flat_map(char::to_uppercase)
                .chain(letters)
                .collect();

            for (day, year) in [(1, 2024), (9, 2025), (28, 2026)] {
                for name in [word.as_str(), capitalized.as_str()] {
                    let plain = format!("{}. {}, {}.", day, name, year);
                    let parsed = interpreter.parse(&plain).unwrap();
                    assert_eq!(parsed.at, utc(year, month, day, 0, 0), "{}", plain);
                    assert_eq!(parsed.precision, DatePrecision::Day, "{}", plain);

                    let timed = format!("{} у 17:45", plain);
                    let parsed = interpreter.parse(&timed).unwrap();
                    assert_eq!(parsed.at, utc(year, month, day, 17, 45), "{}", timed);
                    assert_eq!(parsed.precision, DatePrecision::Minute, "{}", timed);
                }
            }
        }
    }

    #[test]
    fn test_year_fallback() {
        let parsed = DateInterpreter::default()
            .parse("some garbage 2025 text")
            .unwrap();
        assert_eq!(parsed.at, utc(2025, 1, 1, 0, 0));
        assert_eq!(parsed.precision, DatePrecision::Year);
    }

    #[test]
    fn test_unknown_month_falls_back_to_year() {
        let parsed = DateInterpreter::default().parse("7. Brumaire 2024").unwrap();
        assert_eq!(parsed.at, utc(2024, 1, 1, 0, 0));
        assert_eq!(parsed.precision, DatePrecision::Year);
    }

    #[test]
    fn test_impossible_day_falls_back_to_year() {
        let parsed = DateInterpreter::default().parse("31. феб 2025.").unwrap();
        assert_eq!(parsed.precision, DatePrecision::Year);
    }

    #[test]
    fn test_impossible_time_is_ignored() {
        let parsed = DateInterpreter::default()
            .parse("2. окт 2025. у 27:99")
            .unwrap();
        assert_eq!(parsed.at, utc(2025, 10, 2, 0, 0));
        assert_eq!(parsed.precision, DatePrecision::Day);
    }

    #[test]
    fn test_no_year_is_unparsed() {
        assert!(DateInterpreter::default().parse("јуче у 10:00").is_none());
        assert!(DateInterpreter::default().parse("").is_none());
    }

    #[test]
    fn test_custom_vocabulary() {
        let interpreter = DateInterpreter::new(DateVocabulary::new([("nov", 11)], "at"));
        assert_eq!(
            interpreter.parse("24. Nov 2025 at 08:30").unwrap().at,
            utc(2025, 11, 24, 8, 30)
        );
    }

    #[test]
    fn test_recency() {
        let interpreter = DateInterpreter::default();
        let cutoff = utc(2025, 12, 1, 0, 0);

        assert!(interpreter.is_recent(None, cutoff));
        assert!(interpreter.is_recent(Some("без датума"), cutoff));
        assert!(!interpreter.is_recent(Some("30. Нов, 2025. у 23:59"), cutoff));
        assert!(interpreter.is_recent(Some("1. Дец, 2025. у 00:00"), cutoff));
        assert!(interpreter.is_recent(Some("2. Дец, 2025."), cutoff));
        // a bare year before the cutoff is old
        assert!(!interpreter.is_recent(Some("2024"), cutoff));
    }
}
