use itertools::{Itertools, MinMaxResult};

/// Compute X (seconds) and Y (WPM) axis bounds for the live speed
/// chart in the network graph window.
pub fn wpm_chart_bounds(wpm_coords: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let duration = wpm_coords.last().map(|p| p.0).unwrap_or(1.0).max(1.0);

    let top = match wpm_coords.iter().map(|p| p.1).minmax() {
        MinMaxResult::NoElements => 10.0,
        MinMaxResult::OneElement(only) => only.max(10.0),
        MinMaxResult::MinMax(_, max) => max.max(10.0),
    };

    ([0.0, duration], [0.0, top.round()])
}

/// Axis label without trailing noise for whole numbers.
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.1}")
    }
}
