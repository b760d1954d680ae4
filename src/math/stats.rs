//! Descriptive statistics for the summary block and the correlation matrix.
//!
//! Conventions (chosen to match the tabular-analytics results users expect):
//!
//! - `mean`/`min`/`max` are NaN on empty input, never an error
//! - `sample_std` uses the n-1 denominator and is NaN below two values
//! - quantiles use linear interpolation between order statistics
//! - Pearson correlation is NaN below two pairs or at zero variance

/// Arithmetic mean; NaN on empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator); NaN below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Linearly interpolated quantile over a **sorted** slice; `q` in `[0, 1]`.
///
/// NaN on empty input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }

    let pos = q.clamp(0.0, 1.0) * (n as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Pearson correlation coefficient over paired values.
///
/// NaN when fewer than two pairs are supplied or either side has zero
/// variance — undefined correlation is a value here, not an error.
pub fn pearson(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }

    let mx = mean(&pairs.iter().map(|p| p.0).collect::<Vec<_>>());
    let my = mean(&pairs.iter().map(|p| p.1).collect::<Vec<_>>());

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(x, y) in pairs {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    cov / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_basic() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&xs) - 5.0).abs() < 1e-12);
        // Sample std of the classic example: sqrt(32/7).
        assert!((sample_std(&xs) - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs_are_nan_not_errors() {
        assert!(mean(&[]).is_nan());
        assert!(sample_std(&[1.0]).is_nan());
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile_sorted(&xs, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile_sorted(&xs, 1.0) - 4.0).abs() < 1e-12);
        // pos = 0.5 * 3 = 1.5 -> halfway between 2 and 3.
        assert!((quantile_sorted(&xs, 0.5) - 2.5).abs() < 1e-12);
        // pos = 0.25 * 3 = 0.75 -> 1 + 0.75.
        assert!((quantile_sorted(&xs, 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let up: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        assert!((pearson(&up) - 1.0).abs() < 1e-12);

        let down: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, -3.0 * i as f64)).collect();
        assert!((pearson(&down) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_undefined_cases_are_nan() {
        assert!(pearson(&[(1.0, 2.0)]).is_nan());
        // Zero variance on one side.
        assert!(pearson(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]).is_nan());
    }
}
