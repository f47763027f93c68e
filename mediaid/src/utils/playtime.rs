/// Formats a duration as `H:MM:SS`, or `M:SS` when under an hour.
///
/// Seconds are rounded, so 59.6 s reads as `1:00`.
pub fn playtime_string(sec: f64) -> String {
    let total = sec.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Formats a duration as `HH:MM:SS.mmm`.
pub fn time_str(sec: f64) -> String {
    let ms = sec * 1000f64;
    let hours = (ms / 3600000f64) as u64;
    let minutes = ((ms % 3600000f64) / 60000f64) as u64;
    let seconds = ((ms % 60000f64) / 1000f64) as u64;
    let milliseconds = (ms % 1000f64) as u64;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}

/// Rounds to `places` decimal digits.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[test]
fn playtime_formats() {
    assert_eq!(playtime_string(1.0), "0:01");
    assert_eq!(playtime_string(59.6), "1:00");
    assert_eq!(playtime_string(3725.2), "1:02:05");
    assert_eq!(time_str(3725.25), "01:02:05.250");
    assert_eq!(round_to(23.976023976, 3), 23.976);
}
