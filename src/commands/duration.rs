//! Restriction lengths: parsing `10m`-style arguments and rendering them as text.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Parses `45s`, `10m`, `2h`, `1d`; a bare number means minutes.
#[must_use]
pub fn parse_duration(arg: &str) -> Option<Duration> {
    let arg = arg.trim().to_lowercase();
    let split = arg.find(|c: char| !c.is_ascii_digit()).unwrap_or(arg.len());
    let (number, unit) = arg.split_at(split);

    let value: u64 = number.parse().ok()?;
    let multiplier = match unit {
        "s" | "sec" | "secs" => 1,
        "" | "m" | "min" | "mins" => MINUTE,
        "h" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        _ => return None,
    };

    let secs = value.checked_mul(multiplier)?;
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Renders a duration as human readable text, e.g. `1 hour 30 minutes`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if secs == 0 {
        return "0 seconds".to_owned();
    }

    let mut parts = Vec::new();
    for (unit, name) in [(DAY, "day"), (HOUR, "hour"), (MINUTE, "minute"), (1, "second")] {
        let count = secs / unit;
        secs %= unit;
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            parts.push(format!("{count} {name}{plural}"));
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("10m"), Some(Duration::from_secs(600)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(600)));
        assert_eq!(parse_duration("2H"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86400)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration("m"), None);
        assert_eq!(parse_duration("10w"), None);
        assert_eq!(parse_duration("-5"), None);
        assert_eq!(parse_duration("99999999999999999999d"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(600)), "10 minutes");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1 hour");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1 hour 30 minutes");
        assert_eq!(format_duration(Duration::from_secs(90061)), "1 day 1 hour 1 minute 1 second");
        assert_eq!(format_duration(Duration::ZERO), "0 seconds");
    }
}
