//! Whole-column statistics used by the cleaning stage.
//!
//! Everything here ignores NaN inputs the way the cleaning pipeline expects:
//! a NaN is a missing observation, not a value.

/// Arithmetic mean over finite values. `None` for an empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    let kept: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if kept.is_empty() {
        return None;
    }
    let sum: f64 = kept.iter().sum();
    Some(sum / kept.len() as f64)
}

/// Median over non-NaN values, averaging the two middle order statistics
/// for even-length input. `None` when nothing is observed.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Percentile `p` in [0, 100] with linear interpolation between order
/// statistics: position = p/100 × (n−1). NaN inputs are skipped.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if !(0.0..=100.0).contains(&p) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Most frequent value. Ties go to the value encountered first in input
/// order, so the result is deterministic for a given row order.
pub fn mode<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<&'a str> = Vec::new();
    let mut counts: std::collections::HashMap<&'a str, usize> = std::collections::HashMap::new();
    for v in values {
        let entry = counts.entry(v).or_insert(0);
        if *entry == 0 {
            order.push(v);
        }
        *entry += 1;
    }
    let mut best: Option<(&'a str, usize)> = None;
    for v in &order {
        let count = counts[v];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((v, count));
        }
    }
    best.map(|(v, _)| v)
}
