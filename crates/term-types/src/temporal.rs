//! Parsers for the string forms of temporal values.
//!
//! Calendar and clock formats go through `chrono`; interval literals have
//! their own small grammar (`1 year 2 months`, `3 days 04:05:06 ago`,
//! `P1Y2M3DT4H5M6.5S`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use duck_types::temporal::{
    DAYS_PER_MONTH, MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MINUTE, MICROS_PER_MSEC,
    MICROS_PER_SEC,
};
use duck_types::{Date, Interval, Time, TimeTz, TimestampTz, TimestampUnit};

use crate::numeric::LiteralError;

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const TIMESTAMP_TZ_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%#z",
    "%Y-%m-%dT%H:%M:%S%#z",
];

/// Parse `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Option<Date> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .map(Date::from_naive)
}

fn parse_naive_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

/// Parse `HH:MM[:SS[.f]]`.
pub fn parse_time(text: &str) -> Option<Time> {
    parse_naive_time(text.trim()).map(Time::from_naive)
}

/// Parse a UTC offset: `Z`, `±HH`, `±HH:MM` or `±HHMM`.
pub fn parse_offset(text: &str) -> Option<i32> {
    if text.eq_ignore_ascii_case("z") {
        return Some(0);
    }
    let (sign, digits) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    if !digits.is_ascii() {
        return None;
    }
    let (hours, minutes) = match (digits.len(), digits.split_once(':')) {
        (_, Some((h, m))) => (h, m),
        (2, None) | (1, None) => (digits, "0"),
        (4, None) => digits.split_at(2),
        _ => return None,
    };
    if !(1..=2).contains(&hours.len())
        || !hours.bytes().all(|b| b.is_ascii_digit())
        || !minutes.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3_600 + minutes * 60))
}

/// Parse a time followed by an offset, e.g. `10:30:00+05:30` or `08:00Z`.
pub fn parse_time_tz(text: &str) -> Option<TimeTz> {
    let text = text.trim();
    let split = text.find(['+', '-', 'Z', 'z'])?;
    let time = parse_naive_time(text[..split].trim_end())?;
    let offset = parse_offset(&text[split..])?;
    TimeTz::new(Time::from_naive(time), offset)
}

fn to_units(naive: NaiveDateTime, unit: TimestampUnit) -> Option<i64> {
    let utc = Utc.from_utc_datetime(&naive);
    match unit {
        TimestampUnit::Seconds => Some(utc.timestamp()),
        TimestampUnit::Millis => Some(utc.timestamp_millis()),
        TimestampUnit::Micros => Some(utc.timestamp_micros()),
        TimestampUnit::Nanos => utc.timestamp_nanos_opt(),
    }
}

fn parse_naive_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse `YYYY-MM-DD[( |T)HH:MM[:SS[.f]]]` into a count of `unit` since the
/// epoch. Sub-unit digits are truncated.
pub fn parse_timestamp(text: &str, unit: TimestampUnit) -> Option<i64> {
    parse_naive_timestamp(text.trim()).and_then(|naive| to_units(naive, unit))
}

/// Parse an RFC 3339 timestamp or a timestamp followed by an offset. A
/// timestamp without an offset is taken as UTC.
pub fn parse_timestamp_tz(text: &str) -> Option<TimestampTz> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(TimestampTz::from_chrono(dt));
    }
    if let Some(dt) = TIMESTAMP_TZ_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    {
        return Some(TimestampTz::from_chrono(dt));
    }
    if let Some(stripped) = text.strip_suffix(['Z', 'z']) {
        return parse_timestamp(stripped, TimestampUnit::Micros).map(TimestampTz::utc);
    }
    parse_timestamp(text, TimestampUnit::Micros).map(TimestampTz::utc)
}

/// Months/days/micros accumulated while parsing an interval.
#[derive(Debug, Default)]
struct IntervalParts {
    months: i64,
    days: i64,
    micros: i64,
}

impl IntervalParts {
    fn add_months(&mut self, whole: i64, fraction: f64) -> Result<(), LiteralError> {
        self.months = self.months.checked_add(whole).ok_or(LiteralError::OutOfRange)?;
        self.add_days(0, fraction * DAYS_PER_MONTH as f64)
    }

    fn add_days(&mut self, whole: i64, fraction: f64) -> Result<(), LiteralError> {
        let extra_days = fraction.trunc();
        self.days = self
            .days
            .checked_add(whole)
            .and_then(|d| d.checked_add(extra_days as i64))
            .ok_or(LiteralError::OutOfRange)?;
        self.add_micros((fraction - extra_days) * MICROS_PER_DAY as f64)
    }

    fn add_micros(&mut self, micros: f64) -> Result<(), LiteralError> {
        if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
            return Err(LiteralError::OutOfRange);
        }
        self.micros = self
            .micros
            .checked_add(micros.round() as i64)
            .ok_or(LiteralError::OutOfRange)?;
        Ok(())
    }

    fn into_interval(self) -> Result<Interval, LiteralError> {
        Interval::new(self.months, self.days, self.micros).ok_or(LiteralError::OutOfRange)
    }
}

enum IntervalUnit {
    Months(i64),
    Days(i64),
    Micros(i64),
}

fn interval_unit(name: &str) -> Option<IntervalUnit> {
    let unit = match name {
        "millennium" | "millennia" | "millenniums" | "mil" | "mils" => IntervalUnit::Months(12_000),
        "century" | "centuries" | "c" | "cent" => IntervalUnit::Months(1_200),
        "decade" | "decades" | "dec" | "decs" => IntervalUnit::Months(120),
        "year" | "years" | "y" | "yr" | "yrs" => IntervalUnit::Months(12),
        "quarter" | "quarters" => IntervalUnit::Months(3),
        "month" | "months" | "mon" | "mons" => IntervalUnit::Months(1),
        "week" | "weeks" | "w" => IntervalUnit::Days(7),
        "day" | "days" | "d" => IntervalUnit::Days(1),
        "hour" | "hours" | "h" | "hr" | "hrs" => IntervalUnit::Micros(MICROS_PER_HOUR),
        "minute" | "minutes" | "m" | "min" | "mins" => IntervalUnit::Micros(MICROS_PER_MINUTE),
        "second" | "seconds" | "s" | "sec" | "secs" => IntervalUnit::Micros(MICROS_PER_SEC),
        "millisecond" | "milliseconds" | "ms" | "msec" | "msecs" => {
            IntervalUnit::Micros(MICROS_PER_MSEC)
        }
        "microsecond" | "microseconds" | "us" | "usec" | "usecs" => IntervalUnit::Micros(1),
        _ => return None,
    };
    Some(unit)
}

/// Split a signed decimal amount into whole part and signed fraction.
fn parse_amount(text: &str) -> Result<(i64, f64), LiteralError> {
    let negative = text.starts_with('-');
    let unsigned = text.trim_start_matches(['+', '-']);
    if unsigned.len() + 1 < text.len() {
        return Err(LiteralError::Malformed);
    }
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if (whole.is_empty() && frac.is_empty())
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(LiteralError::Malformed);
    }
    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| LiteralError::OutOfRange)?
    };
    let frac: f64 = if frac.is_empty() {
        0.0
    } else {
        format!("0.{frac}")
            .parse()
            .map_err(|_| LiteralError::Malformed)?
    };
    Ok(if negative { (-whole, -frac) } else { (whole, frac) })
}

/// Parse `[-]HH:MM[:SS[.f]]` into microseconds.
fn parse_clock(text: &str) -> Result<i64, LiteralError> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let mut fields = body.split(':');
    let hours = fields.next().ok_or(LiteralError::Malformed)?;
    let minutes = fields.next().ok_or(LiteralError::Malformed)?;
    let seconds = fields.next().unwrap_or("0");
    if fields.next().is_some() {
        return Err(LiteralError::Malformed);
    }

    let digits_only = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(hours) || !digits_only(minutes) {
        return Err(LiteralError::Malformed);
    }
    let hours: i64 = hours.parse().map_err(|_| LiteralError::OutOfRange)?;
    let minutes: i64 = minutes.parse().map_err(|_| LiteralError::Malformed)?;
    let (secs, frac) = parse_amount(seconds)?;
    if minutes > 59 || !(0..60).contains(&secs) || seconds.starts_with(['-', '+']) {
        return Err(LiteralError::Malformed);
    }

    let micros = hours
        .checked_mul(MICROS_PER_HOUR)
        .and_then(|h| h.checked_add(minutes * MICROS_PER_MINUTE + secs * MICROS_PER_SEC))
        .and_then(|t| t.checked_add((frac * MICROS_PER_SEC as f64).round() as i64))
        .ok_or(LiteralError::OutOfRange)?;
    Ok(if negative { -micros } else { micros })
}

/// Parse an ISO 8601 duration such as `P1Y2M3W4DT5H6M7.5S`.
fn parse_iso_duration(text: &str) -> Result<Interval, LiteralError> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = body.strip_prefix('p').ok_or(LiteralError::Malformed)?;
    if body.is_empty() {
        return Err(LiteralError::Malformed);
    }

    let mut parts = IntervalParts::default();
    let mut in_time = false;
    let mut number = String::new();
    let mut saw_component = false;

    for ch in body.chars() {
        match ch {
            't' if !in_time && number.is_empty() => in_time = true,
            '0'..='9' | '.' | '-' => number.push(ch),
            designator => {
                if number.is_empty() {
                    return Err(LiteralError::Malformed);
                }
                let (whole, frac) = parse_amount(&number)?;
                number.clear();
                saw_component = true;
                match (in_time, designator) {
                    (false, 'y') => parts.add_months(
                        whole.checked_mul(12).ok_or(LiteralError::OutOfRange)?,
                        frac * 12.0,
                    )?,
                    (false, 'm') => parts.add_months(whole, frac)?,
                    (false, 'w') => parts.add_days(
                        whole.checked_mul(7).ok_or(LiteralError::OutOfRange)?,
                        frac * 7.0,
                    )?,
                    (false, 'd') => parts.add_days(whole, frac)?,
                    (true, 'h') => add_scaled_micros(&mut parts, whole, frac, MICROS_PER_HOUR)?,
                    (true, 'm') => add_scaled_micros(&mut parts, whole, frac, MICROS_PER_MINUTE)?,
                    (true, 's') => add_scaled_micros(&mut parts, whole, frac, MICROS_PER_SEC)?,
                    _ => return Err(LiteralError::Malformed),
                }
            }
        }
    }
    if !number.is_empty() || !saw_component {
        return Err(LiteralError::Malformed);
    }

    let interval = parts.into_interval()?;
    if negative {
        interval.checked_neg().ok_or(LiteralError::OutOfRange)
    } else {
        Ok(interval)
    }
}

fn add_scaled_micros(
    parts: &mut IntervalParts,
    whole: i64,
    frac: f64,
    scale: i64,
) -> Result<(), LiteralError> {
    let micros = whole.checked_mul(scale).ok_or(LiteralError::OutOfRange)?;
    parts.micros = parts
        .micros
        .checked_add(micros)
        .ok_or(LiteralError::OutOfRange)?;
    parts.add_micros(frac * scale as f64)
}

/// Parse an interval literal.
///
/// Accepts unit sequences (`1 year 2 months`, `1.5 hours`, `2 weeks ago`)
/// with an optional `HH:MM[:SS[.f]]` clock part, and ISO 8601 durations.
pub fn parse_interval(text: &str) -> Result<Interval, LiteralError> {
    let text = text.trim().to_ascii_lowercase();
    let text = text
        .strip_prefix('@')
        .map(str::trim_start)
        .unwrap_or(text.as_str());
    if text.starts_with('p') || text.starts_with("-p") {
        return parse_iso_duration(text);
    }

    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let ago = tokens.last() == Some(&"ago");
    if ago {
        tokens.pop();
    }
    if tokens.is_empty() {
        return Err(LiteralError::Malformed);
    }

    let mut parts = IntervalParts::default();
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        if token.contains(':') {
            let micros = parse_clock(token)?;
            parts.micros = parts
                .micros
                .checked_add(micros)
                .ok_or(LiteralError::OutOfRange)?;
            continue;
        }

        // Either "5 days" or "5days"
        let split = token
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(token.len());
        let (amount, attached_unit) = token.split_at(split);
        let unit_name = if attached_unit.is_empty() {
            iter.next().ok_or(LiteralError::Malformed)?
        } else {
            attached_unit
        };
        let (whole, frac) = parse_amount(amount)?;
        match interval_unit(unit_name).ok_or(LiteralError::Malformed)? {
            IntervalUnit::Months(factor) => parts.add_months(
                whole.checked_mul(factor).ok_or(LiteralError::OutOfRange)?,
                frac * factor as f64,
            )?,
            IntervalUnit::Days(factor) => parts.add_days(
                whole.checked_mul(factor).ok_or(LiteralError::OutOfRange)?,
                frac * factor as f64,
            )?,
            IntervalUnit::Micros(factor) => add_scaled_micros(&mut parts, whole, frac, factor)?,
        }
    }

    let interval = parts.into_interval()?;
    if ago {
        interval.checked_neg().ok_or(LiteralError::OutOfRange)
    } else {
        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(parse_date("2024-01-15"), Date::from_ymd(2024, 1, 15));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("15/01/2024"), None);

        assert_eq!(
            parse_time("10:30:05.25"),
            Time::from_hms_micro(10, 30, 5, 250_000)
        );
        assert_eq!(parse_time("10:30"), Time::from_hms_micro(10, 30, 0, 0));
        assert_eq!(parse_time("25:00:00"), None);
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("Z"), Some(0));
        assert_eq!(parse_offset("+05"), Some(18_000));
        assert_eq!(parse_offset("-05:30"), Some(-19_800));
        assert_eq!(parse_offset("+0530"), Some(19_800));
        assert_eq!(parse_offset("05:30"), None);
        assert_eq!(parse_offset("+05:75"), None);
        assert_eq!(parse_offset("+16:59"), Some(61_140));
    }

    #[test]
    fn test_parse_offset_non_ascii() {
        assert_eq!(parse_offset("+0é5"), None);
        assert_eq!(parse_offset("-é500"), None);
        assert_eq!(parse_offset("+05:3é"), None);
        assert!(parse_time_tz("10:30+0é5").is_none());
        assert!(parse_timestamp_tz("2024-01-15 10:30:00+0é5").is_none());
    }

    #[test]
    fn test_parse_time_tz() {
        let value = parse_time_tz("10:30:00+05:30").unwrap();
        assert_eq!(value.time(), Time::from_hms_micro(10, 30, 0, 0).unwrap());
        assert_eq!(value.offset_seconds(), 19_800);

        let value = parse_time_tz("08:00Z").unwrap();
        assert_eq!(value.offset_seconds(), 0);

        assert!(parse_time_tz("10:30:00").is_none());
    }

    #[test]
    fn test_parse_timestamp_units() {
        let micros = parse_timestamp("2024-01-15 10:30:00.123456", TimestampUnit::Micros).unwrap();
        assert_eq!(micros, 1_705_314_600_123_456);
        assert_eq!(
            parse_timestamp("2024-01-15T10:30:00.123456", TimestampUnit::Millis),
            Some(1_705_314_600_123)
        );
        assert_eq!(
            parse_timestamp("2024-01-15 10:30:00", TimestampUnit::Seconds),
            Some(1_705_314_600)
        );
        assert_eq!(
            parse_timestamp("2024-01-15", TimestampUnit::Micros),
            Some(1_705_276_800_000_000)
        );
        assert_eq!(parse_timestamp("yesterday", TimestampUnit::Micros), None);
    }

    #[test]
    fn test_parse_timestamp_tz() {
        let value = parse_timestamp_tz("2024-01-15T10:30:00+05:00").unwrap();
        assert_eq!(value.offset_seconds(), 18_000);
        assert_eq!(value.micros(), 1_705_296_600_000_000);

        let value = parse_timestamp_tz("2024-01-15 10:30:00-0330").unwrap();
        assert_eq!(value.offset_seconds(), -12_600);

        let value = parse_timestamp_tz("2024-01-15 10:30:00").unwrap();
        assert_eq!(value.offset_seconds(), 0);
        assert_eq!(value.micros(), 1_705_314_600_000_000);
    }

    #[test]
    fn test_parse_interval_units() {
        let interval = parse_interval("1 year 2 months 3 days").unwrap();
        assert_eq!(
            (interval.months(), interval.days(), interval.micros()),
            (14, 3, 0)
        );

        let interval = parse_interval("2 hours 30 minutes").unwrap();
        assert_eq!(interval.micros(), 2 * MICROS_PER_HOUR + 30 * MICROS_PER_MINUTE);

        let interval = parse_interval("1.5 days").unwrap();
        assert_eq!((interval.days(), interval.micros()), (1, 12 * MICROS_PER_HOUR));

        let interval = parse_interval("2 weeks ago").unwrap();
        assert_eq!(interval.days(), -14);

        let interval = parse_interval("5days 10ms").unwrap();
        assert_eq!((interval.days(), interval.micros()), (5, 10_000));

        let interval = parse_interval("45 days 25 hours").unwrap();
        assert_eq!(
            (interval.months(), interval.days(), interval.micros()),
            (0, 45, 25 * MICROS_PER_HOUR)
        );
    }

    #[test]
    fn test_parse_interval_clock() {
        let interval = parse_interval("1 day 04:05:06.5").unwrap();
        assert_eq!(interval.days(), 1);
        assert_eq!(
            interval.micros(),
            4 * MICROS_PER_HOUR + 5 * MICROS_PER_MINUTE + 6 * MICROS_PER_SEC + 500_000
        );

        let interval = parse_interval("-01:00").unwrap();
        assert_eq!(interval.micros(), -MICROS_PER_HOUR);
    }

    #[test]
    fn test_parse_iso_duration() {
        let interval = parse_interval("P1Y2M3DT4H5M6.5S").unwrap();
        assert_eq!(interval.months(), 14);
        assert_eq!(interval.days(), 3);
        assert_eq!(
            interval.micros(),
            4 * MICROS_PER_HOUR + 5 * MICROS_PER_MINUTE + 6_500_000
        );

        let interval = parse_interval("PT90M").unwrap();
        assert_eq!(interval.micros(), 90 * MICROS_PER_MINUTE);

        let interval = parse_interval("-P1W").unwrap();
        assert_eq!(interval.days(), -7);
    }

    #[test]
    fn test_parse_interval_errors() {
        assert_eq!(parse_interval(""), Err(LiteralError::Malformed));
        assert_eq!(parse_interval("3 fortnights"), Err(LiteralError::Malformed));
        assert_eq!(parse_interval("days"), Err(LiteralError::Malformed));
        assert_eq!(parse_interval("5"), Err(LiteralError::Malformed));
        assert_eq!(parse_interval("P"), Err(LiteralError::Malformed));
        assert_eq!(parse_interval("PT5X"), Err(LiteralError::Malformed));
        assert_eq!(
            parse_interval("999999999999 years"),
            Err(LiteralError::OutOfRange)
        );
    }
}
