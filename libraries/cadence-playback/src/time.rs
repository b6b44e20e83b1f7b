//! Time and progress arithmetic shared by the engine and state machine

/// Format seconds as `M:SS`
///
/// Minutes are not padded and keep growing past 59. Negative or non-finite
/// input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Round to one decimal place
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Playback position as a percentage of `duration`, one decimal place
///
/// Returns 0 when the duration is unknown or zero.
pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
    if !is_known_duration(duration) || !current_time.is_finite() {
        return 0.0;
    }
    round_tenth((current_time * 100.0 / duration).clamp(0.0, 100.0))
}

/// Whether `duration` can be seeked into
///
/// Browsers report NaN before metadata and infinity for live streams.
pub fn is_known_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Clamp a user-supplied percentage into 0-100; NaN maps to 0
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(5.0), "0:05");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.99), "0:59");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3725.4), "62:05");
    }

    #[test]
    fn formats_invalid_input_as_zero() {
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn progress_rounds_to_one_decimal() {
        assert_eq!(progress_percent(30.0, 180.0), 16.7);
        assert_eq!(progress_percent(90.0, 180.0), 50.0);
        assert_eq!(progress_percent(180.0, 180.0), 100.0);
    }

    #[test]
    fn progress_without_duration_is_zero() {
        assert_eq!(progress_percent(12.0, 0.0), 0.0);
        assert_eq!(progress_percent(12.0, f64::NAN), 0.0);
        assert_eq!(progress_percent(12.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn clamps_percent() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(150.0), 100.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(42.5), 42.5);
    }
}
