//! Duration codec for chaos configuration.
//!
//! # Wire format
//! - Decode: a JSON number (nanoseconds) or a duration string such as
//!   `"250ms"`, `"2s"`, `"1m30s"`, `"1.5h"`.
//! - Encode: always the canonical duration string (`"100ms"`, `"1m30s"`,
//!   `"0s"`).
//!
//! Canonical strings survive a decode/encode cycle unchanged, so hand-written
//! JSON and the output of `GET /_chaos/config` stay interchangeable.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Largest representable duration, about 292 years.
const MAX_NANOS: u128 = i64::MAX as u128;

/// Errors produced while decoding a duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration string")]
    Empty,

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("negative duration {0:?} is not allowed")]
    Negative(String),

    #[error("duration {0:?} overflows")]
    Overflow(String),
}

/// A non-negative duration with the chaos wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChaosDuration(Duration);

impl ChaosDuration {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(Duration::from_nanos(nanos))
    }

    /// The underlying std duration.
    pub const fn as_std(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for ChaosDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl From<ChaosDuration> for Duration {
    fn from(d: ChaosDuration) -> Self {
        d.0
    }
}

impl fmt::Display for ChaosDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl FromStr for ChaosDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Self)
    }
}

/// Render a duration in canonical form.
///
/// Sub-second values use the largest fitting unit among `ns`, `µs` and `ms`
/// with a trimmed decimal fraction. Longer values are written as
/// hours/minutes/seconds, dropping leading zero units (`"1m30s"`,
/// `"1h0m0s"`, `"2.5s"`).
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos / NANOS_PER_MICRO, nanos % NANOS_PER_MICRO, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos / NANOS_PER_MILLI, nanos % NANOS_PER_MILLI, 6));
    }

    let total_secs = nanos / NANOS_PER_SEC;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    out.push_str(&decimal(seconds, nanos % NANOS_PER_SEC, 9));
    out.push('s');
    out
}

/// `whole.fraction` with the fraction zero-padded to `digits` and trailing
/// zeros removed.
fn decimal(whole: u128, fraction: u128, digits: usize) -> String {
    if fraction == 0 {
        return whole.to_string();
    }
    let padded = format!("{fraction:0digits$}");
    format!("{whole}.{}", padded.trim_end_matches('0'))
}

/// Parse a duration string: a sequence of decimal numbers, each with an
/// optional fraction and a mandatory unit (`ns`, `us`, `µs`, `ms`, `s`, `m`,
/// `h`). A bare `"0"` is accepted. A leading `+` is allowed, `-` is not.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(DurationError::Empty);
    }
    if let Some(stripped) = rest.strip_prefix('-') {
        // "-0" still means zero.
        if stripped.chars().all(|c| c == '0') && !stripped.is_empty() {
            return Ok(Duration::ZERO);
        }
        return Err(DurationError::Negative(input.to_string()));
    }
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let overflow = || DurationError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
                tail.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_len = after_number
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map_or(after_number.len(), |(i, _)| i);
        let (unit, tail) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let mut whole: u128 = 0;
        for digit in int_part.bytes() {
            whole = whole
                .checked_mul(10)
                .and_then(|w| w.checked_add(u128::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }
        let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

        // Digits beyond nanosecond resolution for every unit are dropped.
        let mut fraction: u128 = 0;
        let mut divisor: u128 = 1;
        for digit in frac_part.bytes().take(18) {
            fraction = fraction * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }
        value += fraction * scale / divisor;

        total = total.checked_add(value).ok_or_else(overflow)?;
        if total > MAX_NANOS {
            return Err(overflow());
        }
        rest = tail;
    }

    Ok(nanos_to_duration(total))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    let secs = (nanos / NANOS_PER_SEC) as u64;
    let sub = (nanos % NANOS_PER_SEC) as u32;
    Duration::new(secs, sub)
}

impl Serialize for ChaosDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(self.0))
    }
}

impl<'de> Deserialize<'de> for ChaosDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ChaosDurationVisitor)
    }
}

struct ChaosDurationVisitor;

impl<'de> Visitor<'de> for ChaosDurationVisitor {
    type Value = ChaosDuration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration as nanoseconds or a string like \"250ms\"")
    }

    fn visit_u64<E: de::Error>(self, nanos: u64) -> Result<Self::Value, E> {
        if u128::from(nanos) > MAX_NANOS {
            return Err(E::custom(DurationError::Overflow(nanos.to_string())));
        }
        Ok(ChaosDuration::from_nanos(nanos))
    }

    fn visit_i64<E: de::Error>(self, nanos: i64) -> Result<Self::Value, E> {
        u64::try_from(nanos)
            .map(ChaosDuration::from_nanos)
            .map_err(|_| E::custom(DurationError::Negative(nanos.to_string())))
    }

    fn visit_f64<E: de::Error>(self, nanos: f64) -> Result<Self::Value, E> {
        if !nanos.is_finite() || nanos >= MAX_NANOS as f64 {
            return Err(E::custom(DurationError::Overflow(nanos.to_string())));
        }
        if nanos <= -1.0 {
            return Err(E::custom(DurationError::Negative(nanos.to_string())));
        }
        // Fractional nanoseconds truncate toward zero.
        Ok(ChaosDuration::from_nanos(nanos.max(0.0) as u64))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        s.parse().map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ChaosDuration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Duration {
        parse_duration(s).unwrap()
    }

    #[test]
    fn parses_single_units() {
        assert_eq!(parse("100ms"), Duration::from_millis(100));
        assert_eq!(parse("2s"), Duration::from_secs(2));
        assert_eq!(parse("3m"), Duration::from_secs(180));
        assert_eq!(parse("1h"), Duration::from_secs(3600));
        assert_eq!(parse("750ns"), Duration::from_nanos(750));
        assert_eq!(parse("5us"), Duration::from_micros(5));
        assert_eq!(parse("5µs"), Duration::from_micros(5));
        assert_eq!(parse("0"), Duration::ZERO);
    }

    #[test]
    fn parses_compound_and_fractional() {
        assert_eq!(parse("1m30s"), Duration::from_secs(90));
        assert_eq!(parse("1.5s"), Duration::from_millis(1500));
        assert_eq!(parse("1h2m3.25s"), Duration::from_millis(3_723_250));
        assert_eq!(parse(".5ms"), Duration::from_micros(500));
        assert_eq!(parse("+2s"), Duration::from_secs(2));
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("100"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(parse_duration("5d"), Err(DurationError::UnknownUnit { .. })));
        assert!(matches!(parse_duration("-1s"), Err(DurationError::Negative(_))));
        assert!(matches!(parse_duration("ms"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("."), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("9999999999h"), Err(DurationError::Overflow(_))));
    }

    #[test]
    fn formats_canonically() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(42)), "42ns");
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_millis(100)), "100ms");
        assert_eq!(format_duration(Duration::from_micros(2_250)), "2.25ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_nanos(3_723_000_000_001)), "1h2m3.000000001s");
    }

    #[test]
    fn canonical_strings_round_trip() {
        for s in ["0s", "1ns", "1.5µs", "100ms", "2s", "1m30s", "1h0m0s", "30s", "2.000001s"] {
            assert_eq!(format_duration(parse(s)), s);
        }
    }

    #[test]
    fn decodes_numbers_as_nanoseconds() {
        let d: ChaosDuration = serde_json::from_str("100000000").unwrap();
        assert_eq!(d.as_std(), Duration::from_millis(100));

        let d: ChaosDuration = serde_json::from_str("1.5e9").unwrap();
        assert_eq!(d.as_std(), Duration::from_millis(1500));

        assert!(serde_json::from_str::<ChaosDuration>("-5").is_err());
        assert!(serde_json::from_str::<ChaosDuration>("true").is_err());
    }

    #[test]
    fn decodes_strings_and_encodes_as_string() {
        let d: ChaosDuration = serde_json::from_str("\"250ms\"").unwrap();
        assert_eq!(d, ChaosDuration::from_millis(250));
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"250ms\"");

        assert!(serde_json::from_str::<ChaosDuration>("\"fast\"").is_err());
    }
}
