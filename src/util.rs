/// Formats a timestamp in seconds as "MM:SSs".
///
/// Fractional seconds are truncated and negative or non-finite values are rendered as zero.
pub fn format_time(t: f64) -> String {
    let t = if t.is_finite() && t > 0.0 { t as u64 } else { 0 };
    let minutes = t / 60;
    let seconds = t % 60;
    format!("{:02}:{:02}s", minutes, seconds)
}

/// Formats a `(start, end)` pair as "MM:SSs-MM:SSs".
pub fn format_span(start: f64, end: f64) -> String {
    format!("{}-{}", format_time(start), format_time(end))
}
