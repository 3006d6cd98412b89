//! Parsing and matching of GEDCOM date expressions (§4.4.1, §4.5).
//!
//! GEDCOM dates in source records come in five shapes: exact (`15 JAN
//! 1800`), year-only (`1800`), month-year (`JAN 1800`), range (`BET <d1>
//! AND <d2>`), and modifier-prefixed (`ABT`, `BEF`, `AFT`). This module
//! parses that small grammar and answers the two families of question the
//! query engine needs: "does this date have month/day X" (birth filters)
//! and "does this date fall on year/month/day Y" (event-on-date lookup,
//! with 0 components treated as wildcards).

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::DateParseError;

/// The (possibly partial) year/month/day precision of a single GEDCOM date
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateParts {
    /// Calendar year, if known.
    pub year: Option<i32>,
    /// Calendar month (1-12), if known.
    pub month: Option<u32>,
    /// Calendar day of month (1-31), if known.
    pub day: Option<u32>,
}

impl DateParts {
    /// The earliest calendar date consistent with these parts, filling in
    /// missing month/day with the start of the period.
    fn floor_date(&self) -> Option<NaiveDate> {
        let year = self.year?;
        let month = self.month.unwrap_or(1);
        let day = self.day.unwrap_or(1);
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// The latest calendar date consistent with these parts, filling in
    /// missing month/day with the end of the period.
    fn ceil_date(&self) -> Option<NaiveDate> {
        let year = self.year?;
        let month = self.month.unwrap_or(12);
        let day = self.day.unwrap_or_else(|| last_day_of_month(year, month));
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map(|d| (d - Duration::days(1)).day()).unwrap_or(28)
}

/// A parsed GEDCOM date expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GedcomDate {
    /// An exact (or partially-specified, e.g. year-only) date.
    Exact(DateParts),
    /// `ABT <date>` — approximate date.
    About(DateParts),
    /// `BEF <date>` — before date.
    Before(DateParts),
    /// `AFT <date>` — after date.
    After(DateParts),
    /// `BET <date1> AND <date2>` — inclusive range.
    Range(DateParts, DateParts),
}

const MONTHS: &[(&str, u32)] = &[
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MAY", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AUG", 8),
    ("SEP", 9),
    ("OCT", 10),
    ("NOV", 11),
    ("DEC", 12),
];

fn month_of(token: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, n)| *n)
}

fn parse_date_parts(tokens: &[&str]) -> std::result::Result<DateParts, DateParseError> {
    let unrecognized = || DateParseError::Unrecognized(tokens.join(" "));
    match tokens.len() {
        1 => {
            let year = tokens[0].parse::<i32>().map_err(|_| unrecognized())?;
            Ok(DateParts { year: Some(year), month: None, day: None })
        }
        2 => {
            let month = month_of(tokens[0]).ok_or_else(unrecognized)?;
            let year = tokens[1].parse::<i32>().map_err(|_| unrecognized())?;
            Ok(DateParts { year: Some(year), month: Some(month), day: None })
        }
        3 => {
            let day = tokens[0].parse::<u32>().map_err(|_| unrecognized())?;
            if !(1..=31).contains(&day) {
                return Err(unrecognized());
            }
            let month = month_of(tokens[1]).ok_or_else(unrecognized)?;
            let year = tokens[2].parse::<i32>().map_err(|_| unrecognized())?;
            Ok(DateParts { year: Some(year), month: Some(month), day: Some(day) })
        }
        _ => Err(unrecognized()),
    }
}

/// Parse a GEDCOM date expression.
///
/// Returns [`DateParseError`] for empty or unrecognized input. Callers in
/// this crate treat a parse failure as "no match" per §4.4.1, rather than
/// propagating the error.
pub fn parse(input: &str) -> std::result::Result<GedcomDate, DateParseError> {
    let upper = input.trim().to_uppercase();
    let tokens: Vec<&str> = upper.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(DateParseError::Empty);
    }

    match tokens[0] {
        "BET" => {
            let and_pos = tokens
                .iter()
                .position(|t| *t == "AND")
                .ok_or_else(|| DateParseError::Unrecognized(upper.clone()))?;
            let start = parse_date_parts(&tokens[1..and_pos])?;
            let end = parse_date_parts(&tokens[and_pos + 1..])?;
            Ok(GedcomDate::Range(start, end))
        }
        "ABT" => Ok(GedcomDate::About(parse_date_parts(&tokens[1..])?)),
        "BEF" => Ok(GedcomDate::Before(parse_date_parts(&tokens[1..])?)),
        "AFT" => Ok(GedcomDate::After(parse_date_parts(&tokens[1..])?)),
        _ => Ok(GedcomDate::Exact(parse_date_parts(&tokens)?)),
    }
}

/// Parse a date, returning `None` for empty/unparseable expressions rather
/// than an error — the form every query-side caller actually wants.
pub fn parse_lenient(input: &str) -> Option<GedcomDate> {
    parse(input).ok()
}

/// Does a range `[start, end]` contain a calendar date whose month (if
/// `month` is given) and day (if `day` is given) match?
fn range_contains_month_day(start: NaiveDate, end: NaiveDate, month: Option<u32>, day: Option<u32>) -> bool {
    if start > end {
        return false;
    }
    // A span of a full year or more necessarily covers every month/day
    // combination at least once.
    if (end - start).num_days() >= 366 {
        return true;
    }
    match (month, day) {
        (Some(m), None) => {
            // Circular scan over the (small) sequence of months the range
            // touches, handling year wraparound (e.g. DEC 1800 .. JAN 1801).
            let months_span = (end.year() * 12 + end.month() as i32) - (start.year() * 12 + start.month() as i32);
            (0..=months_span).any(|i| {
                let idx = (start.month() as i32 - 1 + i).rem_euclid(12) as u32;
                idx + 1 == m
            })
        }
        _ => {
            let mut cur = start;
            loop {
                let month_ok = month.map(|m| cur.month() == m).unwrap_or(true);
                let day_ok = day.map(|d| cur.day() == d).unwrap_or(true);
                if month_ok && day_ok {
                    return true;
                }
                if cur >= end {
                    return false;
                }
                cur += Duration::days(1);
            }
        }
    }
}

fn month_day_of(parts: &DateParts, month: Option<u32>, day: Option<u32>) -> bool {
    let month_ok = month.map(|m| parts.month == Some(m)).unwrap_or(true);
    let day_ok = day.map(|d| parts.day == Some(d)).unwrap_or(true);
    month_ok && day_ok && (month.is_some() || day.is_some())
}

/// Does `date` have the given birth month (1-12)? See §4.4.1.
pub fn matches_month(date: &GedcomDate, month: u32) -> bool {
    matches_month_day_opt(date, Some(month), None)
}

/// Does `date` have the given birth day of month (1-31)? See §4.4.1.
pub fn matches_day(date: &GedcomDate, day: u32) -> bool {
    matches_month_day_opt(date, None, Some(day))
}

/// Does `date` have the given birth (month, day)? See §4.4.1.
pub fn matches_month_day(date: &GedcomDate, month: u32, day: u32) -> bool {
    matches_month_day_opt(date, Some(month), Some(day))
}

fn matches_month_day_opt(date: &GedcomDate, month: Option<u32>, day: Option<u32>) -> bool {
    match date {
        GedcomDate::Exact(parts) | GedcomDate::About(parts) | GedcomDate::Before(parts) | GedcomDate::After(parts) => {
            month_day_of(parts, month, day)
        }
        GedcomDate::Range(start, end) => {
            let (Some(s), Some(e)) = (start.floor_date(), end.ceil_date()) else {
                return false;
            };
            range_contains_month_day(s, e, month, day)
        }
    }
}

fn date_floor(date: &GedcomDate) -> Option<NaiveDate> {
    match date {
        GedcomDate::Exact(p) | GedcomDate::About(p) | GedcomDate::Before(p) | GedcomDate::After(p) => p.floor_date(),
        GedcomDate::Range(start, _) => start.floor_date(),
    }
}

fn date_ceil(date: &GedcomDate) -> Option<NaiveDate> {
    match date {
        GedcomDate::Exact(p) | GedcomDate::About(p) | GedcomDate::Before(p) | GedcomDate::After(p) => p.ceil_date(),
        GedcomDate::Range(_, end) => end.ceil_date(),
    }
}

fn midnight_utc_epoch_seconds(d: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("1970-01-01 is a valid date");
    (d - epoch).num_days() * 86_400
}

/// The earliest calendar instant consistent with `date`, as epoch seconds
/// (UTC midnight) — the §6 schema's `birth_date` column unit. A
/// partially-specified GEDCOM date is widened to the start of its period
/// before conversion.
pub fn to_epoch_seconds(date: &GedcomDate) -> Option<i64> {
    date_floor(date).map(midnight_utc_epoch_seconds)
}

/// The latest calendar instant consistent with `date`, as epoch seconds —
/// the companion bound to [`to_epoch_seconds`], used to widen a
/// `ByBirthDate` range to an inclusive `[start, end]` pair of epoch seconds
/// for the relational mirror's `BirthDateRange` predicate.
pub fn to_epoch_seconds_ceil(date: &GedcomDate) -> Option<i64> {
    date_ceil(date).map(midnight_utc_epoch_seconds)
}

/// Does `date` fall within the inclusive calendar range `[start, end]`? Used
/// by [`crate::filter::FilterQuery::by_birth_date`] (§4.4 `ByBirthDate`).
/// Partial dates are widened to their earliest/latest consistent calendar
/// date before comparison, the same floor/ceil treatment range endpoints get
/// elsewhere in this module.
pub fn date_in_range(date: &GedcomDate, start: &GedcomDate, end: &GedcomDate) -> bool {
    let (Some(floor), Some(ceil)) = (date_floor(date), date_ceil(date)) else { return false };
    let (Some(range_start), Some(range_end)) = (date_floor(start), date_ceil(end)) else { return false };
    floor <= range_end && ceil >= range_start
}

/// Does `date` match the partially-specified `(year, month, day)` target
/// used by [`crate::events::get_events_on_date`]? A component of `0` is a
/// wildcard. See §4.5.
pub fn matches_event_target(date: &GedcomDate, year: u32, month: u32, day: u32) -> bool {
    let year = (year != 0).then_some(year as i32);
    let month = (month != 0).then_some(month);
    let day = (day != 0).then_some(day);

    match date {
        GedcomDate::Exact(parts) => {
            year.map(|y| parts.year == Some(y)).unwrap_or(true)
                && month.map(|m| parts.month == Some(m)).unwrap_or(true)
                && day.map(|d| parts.day == Some(d)).unwrap_or(true)
        }
        // Per §9 open question: BEF/AFT (and ABT) are matched on "parsed
        // year equals target year", not as open intervals.
        GedcomDate::About(parts) | GedcomDate::Before(parts) | GedcomDate::After(parts) => {
            year.map(|y| parts.year == Some(y)).unwrap_or(true)
        }
        GedcomDate::Range(start, end) => {
            let (Some(s), Some(e)) = (start.floor_date(), end.ceil_date()) else {
                return false;
            };
            if s > e {
                return false;
            }
            if let Some(y) = year {
                if !(s.year()..=e.year()).contains(&y) {
                    return false;
                }
            }
            if month.is_none() && day.is_none() {
                return true;
            }
            range_contains_month_day(s, e, month, day)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_exact_date() {
        let d = parse("15 JAN 1800").unwrap();
        assert_eq!(d, GedcomDate::Exact(DateParts { year: Some(1800), month: Some(1), day: Some(15) }));
    }

    #[test]
    fn parses_year_only() {
        assert_eq!(parse("1800").unwrap(), GedcomDate::Exact(DateParts { year: Some(1800), month: None, day: None }));
    }

    #[test]
    fn parses_month_year() {
        assert_eq!(
            parse("JAN 1800").unwrap(),
            GedcomDate::Exact(DateParts { year: Some(1800), month: Some(1), day: None })
        );
    }

    #[test]
    fn parses_modifiers() {
        assert!(matches!(parse("ABT 1800").unwrap(), GedcomDate::About(_)));
        assert!(matches!(parse("BEF 1800").unwrap(), GedcomDate::Before(_)));
        assert!(matches!(parse("AFT 1800").unwrap(), GedcomDate::After(_)));
    }

    #[test]
    fn parses_range() {
        let d = parse("BET 25 JAN 1800 AND 5 FEB 1800").unwrap();
        match d {
            GedcomDate::Range(s, e) => {
                assert_eq!(s, DateParts { year: Some(1800), month: Some(1), day: Some(25) });
                assert_eq!(e, DateParts { year: Some(1800), month: Some(2), day: Some(5) });
            }
            _ => panic!("expected range"),
        }
    }

    #[test]
    fn empty_is_error() {
        assert_eq!(parse(""), Err(DateParseError::Empty));
        assert!(parse_lenient("").is_none());
        assert!(parse_lenient("not a date").is_none());
    }

    #[test]
    fn abt_without_month_never_matches_month_filter() {
        let d = parse("ABT 1800").unwrap();
        assert!(!matches_month(&d, 1));
    }

    #[rstest]
    #[case(2, 3, true)]
    #[case(2, 10, false)]
    #[case(1, 30, true)]
    fn range_month_and_day(#[case] month: u32, #[case] day: u32, #[case] expected: bool) {
        let d = parse("BET 25 JAN 1800 AND 5 FEB 1800").unwrap();
        assert_eq!(matches_month_day(&d, month, day), expected);
    }

    #[rstest]
    #[case(12, true)]
    #[case(1, true)]
    #[case(6, false)]
    fn range_spanning_year_boundary_month(#[case] month: u32, #[case] expected: bool) {
        let d = parse("BET 1 DEC 1800 AND 31 JAN 1801").unwrap();
        assert_eq!(matches_month(&d, month), expected);
    }

    #[test]
    fn event_on_exact_date() {
        let d = parse("15 JAN 1800").unwrap();
        assert!(matches_event_target(&d, 1800, 1, 15));
        assert!(matches_event_target(&d, 1800, 0, 0));
        assert!(!matches_event_target(&d, 1801, 1, 15));
    }

    #[test]
    fn event_on_before_after_matches_only_year() {
        let d = parse("BEF 1800").unwrap();
        assert!(matches_event_target(&d, 1800, 6, 12));
        assert!(!matches_event_target(&d, 1799, 0, 0));
    }
}
