use crate::report::{quantile, sample_sd};

/// Tukey box: quartiles, whiskers at the most extreme values within
/// 1.5 IQR of the box, everything beyond as outliers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let q1 = quantile(values, 0.25);
    let median = quantile(values, 0.5);
    let q3 = quantile(values, 0.75);
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;

    let inside = values
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence);
    let whisker_low = inside.clone().fold(f64::INFINITY, f64::min);
    let whisker_high = inside.fold(f64::NEG_INFINITY, f64::max);
    let mut outliers = values
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect::<Vec<_>>();
    outliers.sort_by(|a, b| a.total_cmp(b));

    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

/// Gaussian kernel density on `grid` points spanning the data padded by two
/// bandwidths, using Scott's rule. Returns `(value, density)` pairs.
pub fn kde(values: &[f64], grid: usize) -> Vec<(f64, f64)> {
    if values.is_empty() || grid < 2 {
        return Vec::new();
    }
    let n = values.len() as f64;
    let sd = sample_sd(values).unwrap_or(0.0);
    let mut bandwidth = sd * n.powf(-0.2);
    if bandwidth <= f64::EPSILON {
        bandwidth = 0.01;
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min) - 2.0 * bandwidth;
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 2.0 * bandwidth;
    let step = (hi - lo) / (grid - 1) as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    (0..grid)
        .map(|i| {
            let y = lo + step * i as f64;
            let density = values
                .iter()
                .map(|v| {
                    let z = (y - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            (y, density)
        })
        .collect()
}

/// Counts per bin for ascending `edges`. Bins are half-open except the last,
/// which includes its right edge. Values outside the edges are not counted.
pub fn histogram(values: &[f64], edges: &[f64]) -> Vec<u64> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let n_bins = edges.len() - 1;
    let mut counts = vec![0u64; n_bins];
    let last = edges[n_bins];
    for &v in values {
        if v < edges[0] || v > last {
            continue;
        }
        let bin = if v == last {
            n_bins - 1
        } else {
            edges.windows(2).position(|w| v >= w[0] && v < w[1]).unwrap_or(n_bins - 1)
        };
        counts[bin] += 1;
    }
    counts
}

/// Value range with a 5% margin, widened when all values coincide.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span <= f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - span * 0.05, hi + span * 0.05)
}

#[cfg(test)]
#[path = "../../tests/src_inline/render/geometry.rs"]
mod tests;
