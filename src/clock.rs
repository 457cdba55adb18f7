//! spec §6 clock-derived datetime suggestions.
//!
//! A suggestion declaration's `pattern` (e.g. `\d{6}Z`) is not compiled as a
//! regex here; it is read as a tiny template of digit runs and literal
//! separators and filled in from the current time, so the editor can offer
//! "what today's DDHHMM would be" as a suggestion rather than a blank. Two
//! shapes carry extra rules spec §6 calls out by name:
//!
//! - `\d{6}Z` (a bare observation/valid time): minutes are rounded up to the
//!   nearest `:00`/`:30`, rolling the hour and day over when rounding up
//!   past `:45` of hour 23.
//! - `\d{2}/\d{4}Z` (a day/time with an offset): an `+Nh` substring in the
//!   declaration's `description` (`+6h`, `+12h`, `+18h`) shifts the instant
//!   forward by that many hours and forces its minutes to `:00`; with no
//!   such substring the current time is used unchanged.
//!
//! Any other digit-and-literal pattern (e.g. `\d{8}/\d{4}Z`, a validity
//! period) is filled in directly from the current time with no rounding.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

/// Collaborator seam so tests can supply a fixed instant instead of
/// `Utc::now()` (mirrors the teacher's pattern of trait-based collaborators
/// kept thin enough to fake in a unit test).
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, PartialEq)]
enum Part {
    Digits(usize),
    Literal(char),
}

fn parse_pattern(pattern: &str) -> Option<Vec<Part>> {
    let mut parts = Vec::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'d') {
            chars.next();
            if chars.next() != Some('{') {
                return None;
            }
            let mut digits = String::new();
            for d in chars.by_ref() {
                if d == '}' {
                    break;
                }
                digits.push(d);
            }
            let n: usize = digits.parse().ok()?;
            parts.push(Part::Digits(n));
        } else {
            parts.push(Part::Literal(c));
        }
    }
    Some(parts)
}

/// `DDHHMM` for `instant`, followed by `DDHHMM` for `instant + 24h`: twelve
/// digits, chronologically ordered, enough to fill any of the three shapes
/// the grammar packs use (`\d{6}Z`, `\d{8}/\d{4}Z`, `\d{2}/\d{4}Z`).
fn digit_source(instant: DateTime<Utc>) -> String {
    let next = instant + Duration::hours(24);
    format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}",
        instant.day(),
        instant.hour(),
        instant.minute(),
        next.day(),
        next.hour(),
        next.minute(),
    )
}

fn render_digits(parts: &[Part], source: &str) -> Option<String> {
    let mut cursor = 0;
    let mut out = String::new();
    for part in parts {
        match part {
            Part::Digits(n) => {
                let end = cursor + n;
                out.push_str(source.get(cursor..end)?);
                cursor = end;
            }
            Part::Literal(c) => out.push(*c),
        }
    }
    Some(out)
}

/// Rounds `instant`'s minutes up to the nearest `:00`/`:30`, leaving it
/// unchanged if already on one. Uses `chrono`'s own `Duration` arithmetic to
/// add the rounding delta, which rolls the hour and day over for free (e.g.
/// `26 23:50` rounds to `27 00:00`).
fn round_up_to_half_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    let instant = instant.with_second(0).unwrap().with_nanosecond(0).unwrap();
    let delta = match instant.minute() {
        0 | 30 => 0,
        m if m < 30 => 30 - m,
        m => 60 - m,
    };
    instant + Duration::minutes(delta as i64)
}

/// Parses a `+6h`/`+12h`/`+18h` substring out of a suggestion declaration's
/// `description` (spec §6 `\d{2}/\d{4}Z` offset rule).
fn parse_offset_hours(description: Option<&str>) -> i64 {
    let Some(text) = description else { return 0 };
    for (marker, hours) in [("+18h", 18), ("+12h", 12), ("+6h", 6)] {
        if text.contains(marker) {
            return hours;
        }
    }
    0
}

/// Renders `pattern` against `clock`'s current time, honoring `description`
/// for the `+Nh`-offset `\d{2}/\d{4}Z` shape. Returns `None` if the pattern
/// is not a digits-and-literals template (i.e. a real regex), or if it asks
/// for more digits than the underlying source can supply.
pub fn datetime_suggestion(pattern: &str, clock: &dyn Clock, description: Option<&str>) -> Option<String> {
    let parts = parse_pattern(pattern)?;

    if matches!(parts.as_slice(), [Part::Digits(6), Part::Literal('Z')]) {
        let source = digit_source(round_up_to_half_hour(clock.now()));
        return render_digits(&parts, &source);
    }

    if matches!(
        parts.as_slice(),
        [Part::Digits(2), Part::Literal('/'), Part::Digits(4), Part::Literal('Z')]
    ) {
        let offset_hours = parse_offset_hours(description);
        let mut instant = clock.now() + Duration::hours(offset_hours);
        if offset_hours != 0 {
            instant = instant.with_minute(0).unwrap().with_second(0).unwrap().with_nanosecond(0).unwrap();
        }
        let source = digit_source(instant);
        return render_digits(&parts, &source);
    }

    let source = digit_source(clock.now());
    render_digits(&parts, &source)
}
