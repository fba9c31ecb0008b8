//! Temporal payloads.
//!
//! Dates, times and timestamps are stored as plain counts from the Unix epoch
//! (or from midnight) so that every stored value has exactly one
//! representation. Calendar validation goes through `chrono`; splitting a
//! count back into civil fields is pure arithmetic and never fails.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};

pub const MICROS_PER_MSEC: i64 = 1_000;
pub const MICROS_PER_SEC: i64 = 1_000_000;
pub const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SEC;
pub const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;
pub const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;
pub const NANOS_PER_MICRO: i64 = 1_000;
pub const SECS_PER_MINUTE: i32 = 60;
pub const SECS_PER_HOUR: i32 = 3_600;
pub const SECS_PER_DAY: i64 = 86_400;
pub const DAYS_PER_MONTH: i64 = 30;
pub const MICROS_PER_MONTH: i64 = DAYS_PER_MONTH * MICROS_PER_DAY;

/// Largest absolute time zone offset, 16:59:59.
pub const MAX_OFFSET_SECONDS: i32 = 17 * SECS_PER_HOUR - 1;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Sub-second unit of a timestamp kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    Seconds,
    Millis,
    Micros,
    Nanos,
}

impl TimestampUnit {
    /// Number of units in one second.
    pub fn per_second(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Millis => 1_000,
            Self::Micros => 1_000_000,
            Self::Nanos => 1_000_000_000,
        }
    }

    /// Number of units in one day.
    pub fn per_day(self) -> i64 {
        self.per_second() * SECS_PER_DAY
    }
}

/// Split a timestamp count into whole days since the epoch and units since
/// midnight. Values before the epoch floor towards negative days.
pub fn split_timestamp(value: i64, unit: TimestampUnit) -> (i64, i64) {
    let per_day = unit.per_day();
    (value.div_euclid(per_day), value.rem_euclid(per_day))
}

/// Inverse of [`split_timestamp`]; `None` on overflow.
pub fn combine_timestamp(days: i64, units_of_day: i64, unit: TimestampUnit) -> Option<i64> {
    days.checked_mul(unit.per_day())?.checked_add(units_of_day)
}

/// Civil `(year, month, day)` for a day count since 1970-01-01, proleptic
/// Gregorian.
pub fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Calendar date, stored as days since 1970-01-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(i32);

impl Date {
    /// Date from a raw day count.
    pub fn from_days(days: i32) -> Self {
        Self(days)
    }

    /// Validated calendar date, `None` for impossible dates such as Feb 30.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from_naive)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
    }

    /// Days since 1970-01-01.
    pub fn days(self) -> i32 {
        self.0
    }

    /// `(year, month, day)` of this date.
    pub fn ymd(self) -> (i64, u32, u32) {
        civil_from_days(i64::from(self.0))
    }

    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(self.0.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, month, day) = self.ymd();
        write!(f, "{year:04}-{month:02}-{day:02}")
    }
}

/// Time of day, stored as microseconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i64);

impl Time {
    /// Time from microseconds since midnight; must be within one day.
    pub fn from_micros(micros: i64) -> Option<Self> {
        (0..MICROS_PER_DAY).contains(&micros).then_some(Self(micros))
    }

    pub fn from_hms_micro(hour: u32, minute: u32, second: u32, micros: i64) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 || micros < 0 {
            return None;
        }
        let total = i64::from(hour) * MICROS_PER_HOUR
            + i64::from(minute) * MICROS_PER_MINUTE
            + i64::from(second) * MICROS_PER_SEC;
        Self::from_micros(total.checked_add(micros)?)
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        let micros = i64::from(time.num_seconds_from_midnight()) * MICROS_PER_SEC
            + i64::from(time.nanosecond() % 1_000_000_000) / NANOS_PER_MICRO;
        Self(micros)
    }

    /// Microseconds since midnight.
    pub fn micros(self) -> i64 {
        self.0
    }

    /// `(hour, minute, second, microsecond)` of this time.
    pub fn hms_micro(self) -> (u32, u32, u32, u32) {
        let secs = self.0 / MICROS_PER_SEC;
        (
            (secs / 3_600) as u32,
            (secs / 60 % 60) as u32,
            (secs % 60) as u32,
            (self.0 % MICROS_PER_SEC) as u32,
        )
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, minute, second, micros) = self.hms_micro();
        write!(f, "{hour:02}:{minute:02}:{second:02}")?;
        write_fraction(f, micros)
    }
}

fn write_fraction(f: &mut fmt::Formatter<'_>, micros: u32) -> fmt::Result {
    if micros == 0 {
        return Ok(());
    }
    let digits = format!("{micros:06}");
    write!(f, ".{}", digits.trim_end_matches('0'))
}

fn write_offset(f: &mut fmt::Formatter<'_>, offset_seconds: i32) -> fmt::Result {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    let hours = abs / 3_600;
    let minutes = abs / 60 % 60;
    let seconds = abs % 60;
    write!(f, "{sign}{hours:02}")?;
    if minutes != 0 || seconds != 0 {
        write!(f, ":{minutes:02}")?;
    }
    if seconds != 0 {
        write!(f, ":{seconds:02}")?;
    }
    Ok(())
}

/// Time of day with the UTC offset it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeTz {
    time: Time,
    offset_seconds: i32,
}

impl TimeTz {
    /// `None` if the offset exceeds [`MAX_OFFSET_SECONDS`].
    pub fn new(time: Time, offset_seconds: i32) -> Option<Self> {
        (offset_seconds.unsigned_abs() <= MAX_OFFSET_SECONDS.unsigned_abs()).then_some(Self {
            time,
            offset_seconds,
        })
    }

    pub fn time(self) -> Time {
        self.time
    }

    /// Signed offset east of UTC in seconds.
    pub fn offset_seconds(self) -> i32 {
        self.offset_seconds
    }
}

impl fmt::Display for TimeTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time)?;
        write_offset(f, self.offset_seconds)
    }
}

/// Instant with time zone: UTC microseconds plus the offset the value was
/// written with. Equality compares both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampTz {
    micros: i64,
    offset_seconds: i32,
}

impl TimestampTz {
    /// Instant at `utc_micros`, written with `offset_seconds`.
    pub fn new(utc_micros: i64, offset_seconds: i32) -> Option<Self> {
        (offset_seconds.unsigned_abs() <= MAX_OFFSET_SECONDS.unsigned_abs()).then_some(Self {
            micros: utc_micros,
            offset_seconds,
        })
    }

    /// Instant in UTC.
    pub fn utc(utc_micros: i64) -> Self {
        Self {
            micros: utc_micros,
            offset_seconds: 0,
        }
    }

    /// Instant from a wall-clock reading at the given offset; `None` on
    /// overflow.
    pub fn from_local(local_micros: i64, offset_seconds: i32) -> Option<Self> {
        let shift = i64::from(offset_seconds).checked_mul(MICROS_PER_SEC)?;
        Self::new(local_micros.checked_sub(shift)?, offset_seconds)
    }

    pub fn from_chrono(value: DateTime<FixedOffset>) -> Self {
        Self {
            micros: value.timestamp_micros(),
            offset_seconds: value.offset().local_minus_utc(),
        }
    }

    /// Microseconds since the epoch in UTC.
    pub fn micros(self) -> i64 {
        self.micros
    }

    pub fn offset_seconds(self) -> i32 {
        self.offset_seconds
    }

    /// Wall-clock microseconds at the stored offset.
    pub fn local_micros(self) -> i64 {
        self.micros
            .saturating_add(i64::from(self.offset_seconds) * MICROS_PER_SEC)
    }

    pub fn to_chrono(self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_seconds)?;
        let utc = Utc.timestamp_micros(self.micros).single()?;
        Some(utc.with_timezone(&offset))
    }
}

impl fmt::Display for TimestampTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_timestamp(f, self.local_micros(), TimestampUnit::Micros)?;
        write_offset(f, self.offset_seconds)
    }
}

/// Render a timestamp count as `YYYY-MM-DD HH:MM:SS[.f]`.
pub fn write_timestamp(f: &mut fmt::Formatter<'_>, value: i64, unit: TimestampUnit) -> fmt::Result {
    let (days, units_of_day) = split_timestamp(value, unit);
    let (year, month, day) = civil_from_days(days);
    let secs = units_of_day / unit.per_second();
    let fraction = units_of_day % unit.per_second();
    write!(
        f,
        "{year:04}-{month:02}-{day:02} {:02}:{:02}:{:02}",
        secs / 3_600,
        secs / 60 % 60,
        secs % 60
    )?;
    match unit {
        TimestampUnit::Seconds => Ok(()),
        TimestampUnit::Millis => write_fraction(f, (fraction * 1_000) as u32),
        TimestampUnit::Micros => write_fraction(f, fraction as u32),
        TimestampUnit::Nanos => {
            if fraction == 0 {
                return Ok(());
            }
            let digits = format!("{fraction:09}");
            write!(f, ".{}", digits.trim_end_matches('0'))
        }
    }
}

/// Months/days/microseconds interval.
///
/// The fields are stored as given; 45 days and 1 month 15 days are distinct
/// payloads. Equality and hashing compare the [`normalized`](Self::normalized)
/// form, so two intervals spanning the same months/days/time are equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interval {
    months: i32,
    days: i32,
    micros: i64,
}

impl Interval {
    /// Interval with the fields kept verbatim; `None` if months or days do
    /// not fit in 32 bits.
    pub fn new(months: i64, days: i64, micros: i64) -> Option<Self> {
        Some(Self {
            months: i32::try_from(months).ok()?,
            days: i32::try_from(days).ok()?,
            micros,
        })
    }

    pub fn from_micros(micros: i64) -> Self {
        Self {
            months: 0,
            days: 0,
            micros,
        }
    }

    pub fn months(self) -> i32 {
        self.months
    }

    pub fn days(self) -> i32 {
        self.days
    }

    pub fn micros(self) -> i64 {
        self.micros
    }

    /// Negated interval, `None` on overflow.
    pub fn checked_neg(self) -> Option<Self> {
        Some(Self {
            months: self.months.checked_neg()?,
            days: self.days.checked_neg()?,
            micros: self.micros.checked_neg()?,
        })
    }

    /// `(months, days, micros)` with whole days carried out of the micros and
    /// then whole months out of the days, truncating toward zero. The result
    /// has `|days| < 30` and `|micros| < 1 day`, and normalising it again
    /// leaves it unchanged.
    pub fn normalized(self) -> (i64, i64, i64) {
        let days = i64::from(self.days) + self.micros / MICROS_PER_DAY;
        let micros = self.micros % MICROS_PER_DAY;
        let months = i64::from(self.months) + days / DAYS_PER_MONTH;
        (months, days % DAYS_PER_MONTH, micros)
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Interval {}

impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let years = self.months / 12;
        let months = self.months % 12;
        let plural = |n: i32, unit: &str| {
            if n.abs() == 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        };
        if years != 0 {
            parts.push(plural(years, "year"));
        }
        if months != 0 {
            parts.push(plural(months, "month"));
        }
        if self.days != 0 {
            parts.push(plural(self.days, "day"));
        }
        if self.micros != 0 || parts.is_empty() {
            let sign = if self.micros < 0 { "-" } else { "" };
            let abs = self.micros.unsigned_abs();
            let secs = abs / MICROS_PER_SEC as u64;
            let mut clock = format!(
                "{sign}{:02}:{:02}:{:02}",
                secs / 3_600,
                secs / 60 % 60,
                secs % 60
            );
            let fraction = abs % MICROS_PER_SEC as u64;
            if fraction != 0 {
                let digits = format!("{fraction:06}");
                clock.push('.');
                clock.push_str(digits.trim_end_matches('0'));
            }
            parts.push(clock);
        }
        f.write_str(&parts.join(" "))
    }
}
