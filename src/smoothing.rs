/// One-pass 1-2-1 filter. Endpoints average with their single neighbor.
pub fn smooth(series: &[f64]) -> Vec<f64> {
    let n = series.len();
    if n < 2 {
        return series.to_vec();
    }

    (0..n)
        .map(|i| {
            if i == 0 {
                (series[0] + series[1]) / 2.0
            } else if i == n - 1 {
                (series[n - 2] + series[n - 1]) / 2.0
            } else {
                0.25 * series[i - 1] + 0.5 * series[i] + 0.25 * series[i + 1]
            }
        })
        .collect()
}

/// Scales raw category weights to whole percentages.
///
/// Each entry is rounded independently, so the total can land a point or
/// two away from 100.
pub fn normalize_split(values: &[f64]) -> Vec<u32> {
    let sum: f64 = values.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return vec![0; values.len()];
    }

    values
        .iter()
        .map(|value| (100.0 * value / sum).round().max(0.0) as u32)
        .collect()
}

/// Whole percentage of `count` in `total`, 0 when there is nothing to count.
pub fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * count as f64 / total as f64).round() as u32
}
