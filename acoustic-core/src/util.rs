/// Convert a number of seconds to a string in the format "HH:MM:SS".
/// If the number of hours is 0, it will be omitted. Fractions are truncated;
/// negative and non-finite values are treated as zero.
pub fn seconds_to_hms_string(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format a position and an optional duration, both in seconds, as
/// `position / duration`.
pub fn progress_string(position: f64, duration: Option<f64>) -> String {
    match duration {
        Some(duration) => format!(
            "{} / {}",
            seconds_to_hms_string(position),
            seconds_to_hms_string(duration)
        ),
        None => seconds_to_hms_string(position),
    }
}
