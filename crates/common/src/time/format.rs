//! Human-readable duration formatting
//!
//! Stopwatch-style rendering for running timers plus a compact form used in
//! log fields.

use std::time::Duration;

/// Render elapsed seconds as a stopwatch reading.
///
/// Uses `H:MM:SS` once at least one hour has elapsed, `M:SS` otherwise.
///
/// # Examples
///
/// ```
/// use workpulse_common::time::format_clock;
///
/// assert_eq!(format_clock(125), "2:05");
/// assert_eq!(format_clock(3725), "1:02:05");
/// assert_eq!(format_clock(0), "0:00");
/// ```
pub fn format_clock(elapsed_seconds: u64) -> String {
    let hours = elapsed_seconds / 3600;
    let minutes = (elapsed_seconds % 3600) / 60;
    let seconds = elapsed_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Whole minutes rounded up, so a partially worked minute counts.
///
/// ```
/// use workpulse_common::time::ceil_minutes;
///
/// assert_eq!(ceil_minutes(0), 0);
/// assert_eq!(ceil_minutes(61), 2);
/// assert_eq!(ceil_minutes(120), 2);
/// ```
pub fn ceil_minutes(elapsed_seconds: u64) -> u64 {
    elapsed_seconds.div_ceil(60)
}

/// Format a duration into a compact string such as `1h 1m 5s`.
///
/// Sub-second durations render in milliseconds.
///
/// ```
/// use std::time::Duration;
///
/// use workpulse_common::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    if total_secs == 0 {
        return format!("{}ms", duration.as_millis());
    }

    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let components = [(hours, "h"), (minutes, "m"), (seconds, "s")];
    let start_index =
        components.iter().position(|(value, _)| *value > 0).unwrap_or(components.len() - 1);

    components[start_index..]
        .iter()
        .map(|(value, suffix)| format!("{value}{suffix}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    //! Unit tests for time::format.
    use super::*;

    /// Validates `format_clock` behavior for the sub-hour scenario.
    ///
    /// Assertions:
    /// - Confirms seconds are zero padded and minutes are not.
    #[test]
    fn test_format_clock_sub_hour() {
        assert_eq!(format_clock(5), "0:05");
        assert_eq!(format_clock(125), "2:05");
        assert_eq!(format_clock(3599), "59:59");
    }

    /// Validates `format_clock` behavior for the hour boundary scenario.
    ///
    /// Assertions:
    /// - Confirms exactly one hour switches to `H:MM:SS`.
    /// - Confirms minutes are zero padded in the long form.
    #[test]
    fn test_format_clock_hours() {
        assert_eq!(format_clock(3600), "1:00:00");
        assert_eq!(format_clock(3725), "1:02:05");
        assert_eq!(format_clock(36_061), "10:01:01");
    }

    /// Validates `ceil_minutes` behavior at minute boundaries.
    ///
    /// Assertions:
    /// - Confirms partial minutes round up.
    #[test]
    fn test_ceil_minutes_boundaries() {
        assert_eq!(ceil_minutes(1), 1);
        assert_eq!(ceil_minutes(59), 1);
        assert_eq!(ceil_minutes(60), 1);
        assert_eq!(ceil_minutes(3725), 63);
    }

    /// Validates `format_duration` behavior for mixed components.
    ///
    /// Assertions:
    /// - Confirms leading zero components are dropped.
    #[test]
    fn test_format_duration_components() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1h 1m 5s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h 0m 0s");
    }
}
