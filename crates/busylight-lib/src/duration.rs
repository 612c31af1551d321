//! Human-entered durations ("90m", "2h", "45") and their display forms.

use std::time::Duration;

/// Longest countdown accepted anywhere: one week.
pub const MAX_DURATION: Duration = Duration::from_secs(7 * 24 * 3600);

/// Parse a duration string.
///
/// Format: a run of ASCII digits followed by an optional unit, `s`
/// (seconds, the default), `m` (minutes) or `h` (hours). Surrounding
/// whitespace is ignored.
///
/// Returns `None` for zero, empty, malformed or out-of-range input
/// (above [`MAX_DURATION`]), which callers treat as "do nothing".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, multiplier) = match s.as_bytes().last()? {
        b'h' => (&s[..s.len() - 1], 3600),
        b'm' => (&s[..s.len() - 1], 60),
        b's' => (&s[..s.len() - 1], 1),
        _ => (s, 1),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs = digits.parse::<u64>().ok()?.checked_mul(multiplier)?;
    let d = Duration::from_secs(secs);
    (secs > 0 && d <= MAX_DURATION).then_some(d)
}

/// Menu label for a preset duration, e.g. "30 Minutes", "1 Hour", "1.5 Hours".
pub fn duration_label(d: Duration) -> String {
    let secs = d.as_secs();
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    if secs >= 3600 && secs % 3600 == 0 {
        plural(secs / 3600, "Hour")
    } else if secs > 3600 && secs % 1800 == 0 {
        format!("{}.5 Hours", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        plural(secs / 60, "Minute")
    } else {
        plural(secs, "Second")
    }
}

/// Countdown display: `"M:SS"` below an hour, `"H:MM:SS"` above.
///
/// Sub-second remainders round up so a countdown never shows `0:00`
/// while still armed.
pub fn format_remaining(d: Duration) -> String {
    let mut secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs += 1;
    }
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
