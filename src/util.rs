/// Format seconds as MM:SS for the mission clock.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Population standard deviation; the mission-complete screen shows
/// this as the typing consistency figure.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let variance = data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}
