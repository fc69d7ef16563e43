//! Trailing-window primitives shared by the indicators.
//!
//! Window semantics: the window ending at index `i` covers
//! `values[i+1-window ..= i]` (or fewer at the start of the series). A value
//! is emitted only once the window holds at least `min_periods` non-NaN
//! observations; otherwise the output is NaN.

use std::collections::VecDeque;

/// Trailing mean over `window` values, NaN-skipping.
///
/// Each window is summed from scratch so a value that has left the window
/// leaves no floating-point residue behind (a flat stretch averages to
/// exactly zero change).
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 {
        return result;
    }
    let min_periods = min_periods.max(1);

    for i in 0..n {
        let start = (i + 1).saturating_sub(window);
        let mut sum = 0.0;
        let mut count = 0usize;
        for &v in &values[start..=i] {
            if !v.is_nan() {
                sum += v;
                count += 1;
            }
        }
        if count >= min_periods {
            result[i] = sum / count as f64;
        }
    }

    result
}

/// Trailing maximum over `window` values.
///
/// Uses a monotonic deque of indices, so the whole series costs O(n).
/// Input values are expected to be finite.
pub fn rolling_max(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 {
        return result;
    }
    let min_periods = min_periods.max(1);
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window.min(n));

    for i in 0..n {
        while let Some(&back) = deque.back() {
            if values[back] <= values[i] {
                deque.pop_back();
            } else {
                break;
            }
        }
        deque.push_back(i);

        while let Some(&front) = deque.front() {
            if front + window <= i {
                deque.pop_front();
            } else {
                break;
            }
        }

        let observed = (i + 1).min(window);
        if observed >= min_periods {
            if let Some(&front) = deque.front() {
                result[i] = values[front];
            }
        }
    }

    result
}

/// Running maximum over the whole history to date.
pub fn expanding_max(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            peak
        })
        .collect()
}
