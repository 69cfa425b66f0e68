//! Timestamp: wall-clock log timestamps to epoch seconds.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::model::ParseError;

/// How a wall-clock timestamp is anchored to an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBasis {
    /// Host time zone
    #[default]
    Local,
    /// A fixed offset, regardless of what the line says
    Fixed(FixedOffset),
    /// A named IANA zone such as `Europe/Berlin`
    Zone(Tz),
    /// The offset written in the line; lines without one fall back to `Local`
    Logged,
}

impl TimeBasis {
    pub fn utc() -> Self {
        TimeBasis::Fixed(Utc.fix())
    }

    /// Epoch seconds for a wall-clock time that carries no offset of its own.
    pub fn epoch_seconds(&self, naive: NaiveDateTime) -> Result<f64, ParseError> {
        let resolved = match self {
            TimeBasis::Local | TimeBasis::Logged => resolve_wall_clock(&Local, naive)?,
            TimeBasis::Fixed(offset) => resolve_wall_clock(offset, naive)?,
            TimeBasis::Zone(tz) => resolve_wall_clock(tz, naive)?,
        };
        Ok(resolved as f64)
    }

    /// Epoch seconds for a wall-clock time logged together with `logged` offset.
    pub fn epoch_seconds_with_offset(&self, naive: NaiveDateTime, logged: FixedOffset) -> Result<f64, ParseError> {
        match self {
            TimeBasis::Logged => Ok(resolve_wall_clock(&logged, naive)? as f64),
            _ => self.epoch_seconds(naive),
        }
    }
}

/// Resolve a wall-clock time in `tz` to epoch seconds, never rejecting a
/// well-formed time.
///
/// A repeated time (clocks turned back) resolves to its earlier instant. A
/// skipped time (clocks turned forward) is read with the offset in force
/// before the gap, landing the same distance past the jump.
fn resolve_wall_clock<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> Result<i64, ParseError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.timestamp()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.timestamp()),
        LocalResult::None => {
            let before_gap = naive
                .checked_sub_signed(Duration::days(1))
                .ok_or_else(|| ParseError::TimestampOutOfRange(naive.to_string()))?;
            let offset = tz.offset_from_utc_datetime(&before_gap).fix();
            Ok(naive.and_utc().timestamp() - i64::from(offset.local_minus_utc()))
        }
    }
}

/// Parse `naive` with `format`, mapping chrono's error into a [`ParseError`].
pub fn parse_naive(text: &str, format: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(text, format)
        .map_err(|e| ParseError::Timestamp(format!("{text:?}: {e}")))
}

/// Parse a `+HHMM` / `-HHMM` offset as written by Nginx.
pub fn parse_offset(text: &str) -> Result<FixedOffset, ParseError> {
    let invalid = || ParseError::Timestamp(format!("invalid offset {text:?}"));

    let (sign, digits) = match text.as_bytes().first() {
        Some(b'+') => (1, &text[1..]),
        Some(b'-') => (-1, &text[1..]),
        _ => return Err(invalid()),
    };
    let digits = digits.replace(':', "");
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

impl fmt::Display for TimeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBasis::Local => f.write_str("local"),
            TimeBasis::Logged => f.write_str("logged"),
            TimeBasis::Fixed(offset) if offset.local_minus_utc() == 0 => f.write_str("utc"),
            TimeBasis::Fixed(offset) => write!(f, "{offset}"),
            TimeBasis::Zone(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for TimeBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(TimeBasis::Local),
            "logged" => Ok(TimeBasis::Logged),
            "utc" | "z" => Ok(TimeBasis::utc()),
            other if other.starts_with(['+', '-']) => parse_offset(other)
                .map(TimeBasis::Fixed)
                .map_err(|_| format!("invalid time_basis offset {s:?}, expected e.g. +02:00")),
            _ => s.trim().parse::<Tz>().map(TimeBasis::Zone).map_err(|_| {
                format!("time_basis must be local, logged, utc, an offset like +02:00 or a zone like Europe/Berlin, got {s:?}")
            }),
        }
    }
}

impl Serialize for TimeBasis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeBasis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus_two() -> TimeBasis {
        "+02:00".parse().unwrap()
    }

    #[test]
    fn test_fixed_offset_epoch_seconds() {
        let naive = parse_naive("28/Oct/2015:15:18:14", "%d/%b/%Y:%H:%M:%S").unwrap();
        assert_eq!(plus_two().epoch_seconds(naive).unwrap(), 1446038294.0);
        assert_eq!(TimeBasis::utc().epoch_seconds(naive).unwrap(), 1446045494.0);
    }

    #[test]
    fn test_logged_offset_wins_only_for_logged_basis() {
        let naive = parse_naive("28/Oct/2015:15:18:14", "%d/%b/%Y:%H:%M:%S").unwrap();
        let logged = parse_offset("+0000").unwrap();
        assert_eq!(TimeBasis::Logged.epoch_seconds_with_offset(naive, logged).unwrap(), 1446045494.0);
        assert_eq!(plus_two().epoch_seconds_with_offset(naive, logged).unwrap(), 1446038294.0);
    }

    #[test]
    fn test_local_basis_matches_chrono_local() {
        let naive = parse_naive("2015-10-31 18:32:03", "%Y-%m-%d %H:%M:%S").unwrap();
        let expected = Local.from_local_datetime(&naive).single().map(|d| d.timestamp() as f64);
        if let Some(expected) = expected {
            assert_eq!(TimeBasis::Local.epoch_seconds(naive).unwrap(), expected);
        }
    }

    #[test]
    fn test_repeated_hour_resolves_to_earlier_instant() {
        // Clocks went back from 03:00 CEST to 02:00 CET
        let naive = parse_naive("2015-10-25 02:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let berlin = TimeBasis::Zone(chrono_tz::Europe::Berlin);
        assert_eq!(berlin.epoch_seconds(naive).unwrap(), 1445736600.0);
    }

    #[test]
    fn test_skipped_hour_reads_pre_gap_offset() {
        // Clocks jumped from 02:00 CET to 03:00 CEST
        let naive = parse_naive("2015-03-29 02:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let berlin = TimeBasis::Zone(chrono_tz::Europe::Berlin);
        assert_eq!(berlin.epoch_seconds(naive).unwrap(), 1427592600.0);

        let after = parse_naive("2015-03-29 03:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(berlin.epoch_seconds(after).unwrap(), 1427592600.0);
    }

    #[test]
    fn test_zone_outside_transition() {
        let naive = parse_naive("28/Oct/2015:15:18:14", "%d/%b/%Y:%H:%M:%S").unwrap();
        let berlin = TimeBasis::Zone(chrono_tz::Europe::Berlin);
        // CET, one hour east of UTC
        assert_eq!(berlin.epoch_seconds(naive).unwrap(), 1446041894.0);
    }

    #[test]
    fn test_parse_naive_rejects_garbage() {
        let err = parse_naive("Borked", "%Y-%m-%d %H:%M:%S").unwrap_err();
        assert!(matches!(err, ParseError::Timestamp(_)));
    }

    #[test]
    fn test_parse_offset_forms() {
        assert_eq!(parse_offset("+0000").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_offset("-0730").unwrap().local_minus_utc(), -(7 * 3600 + 30 * 60));
        assert_eq!(parse_offset("+02:00").unwrap().local_minus_utc(), 7200);
        assert!(parse_offset("0000").is_err());
        assert!(parse_offset("+00").is_err());
        assert!(parse_offset("+ab00").is_err());
    }

    #[test]
    fn test_time_basis_from_str() {
        assert_eq!("local".parse::<TimeBasis>().unwrap(), TimeBasis::Local);
        assert_eq!("LOGGED".parse::<TimeBasis>().unwrap(), TimeBasis::Logged);
        assert_eq!("utc".parse::<TimeBasis>().unwrap(), TimeBasis::utc());
        assert_eq!(plus_two().to_string(), "+02:00");
        assert_eq!(
            "Europe/Berlin".parse::<TimeBasis>().unwrap(),
            TimeBasis::Zone(chrono_tz::Europe::Berlin)
        );
        assert!("mars".parse::<TimeBasis>().is_err());
        assert!("+25:00".parse::<TimeBasis>().is_err());
    }

    #[test]
    fn test_time_basis_display_round_trip() {
        for basis in [
            TimeBasis::Local,
            TimeBasis::Logged,
            TimeBasis::utc(),
            plus_two(),
            TimeBasis::Zone(chrono_tz::America::New_York),
        ] {
            assert_eq!(basis.to_string().parse::<TimeBasis>().unwrap(), basis);
        }
    }
}
