//! Relative strength index over simple trailing means.
//!
//! Gains and losses are averaged with a plain `period`-bar mean, not Wilder
//! smoothing. Bar 0 has no prior close and enters the window as a zero
//! change, so `rsi_14` is first defined on the 14th bar (index 13).
//!
//! A window without any loss has no defined RSI; a flat window included.

use super::rolling::rolling_mean;
use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

/// Close-to-close moves split into (gain, loss) magnitudes, bar 0 as zero.
fn split_moves(bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let moves = std::iter::once(0.0).chain(bars.windows(2).map(|w| w[1].close - w[0].close));
    moves
        .take(bars.len())
        .map(|m| (m.max(0.0), (-m).max(0.0)))
        .unzip()
}

fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || !(avg_loss > 0.0) {
        return f64::NAN;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_defined(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (gains, losses) = split_moves(bars);
        let avg_gain = rolling_mean(&gains, self.period, self.period);
        let avg_loss = rolling_mean(&losses, self.period, self.period);
        avg_gain
            .into_iter()
            .zip(avg_loss)
            .map(|(g, l)| strength_index(g, l))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    const TOL: f64 = 1e-9;

    #[test]
    fn one_up_one_down_is_fifty() {
        // window at index 2: moves [0, +1, -1]
        let out = Rsi::new(3).compute(&make_bars(&[10.0, 11.0, 10.0]));
        assert!(out[0].is_nan() && out[1].is_nan());
        assert_approx(out[2], 50.0, TOL);
    }

    #[test]
    fn hand_computed_window() {
        // moves: 0, +0.34, -0.25, -0.48, +0.72
        let out = Rsi::new(3).compute(&make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]));
        assert_approx(out[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), TOL);
        assert_approx(out[4], 100.0 - 100.0 / (1.0 + 0.72 / 0.73), TOL);
    }

    #[test]
    fn steady_decline_pins_to_zero() {
        let out = Rsi::new(3).compute(&make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0]));
        for v in &out[2..] {
            assert_approx(*v, 0.0, TOL);
        }
    }

    #[test]
    fn no_losses_means_undefined() {
        let rising = Rsi::new(3).compute(&make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let flat = Rsi::new(14).compute(&make_bars(&[100.0; 30]));
        assert!(rising.iter().chain(&flat).all(|v| v.is_nan()));
    }

    #[test]
    fn stays_within_0_100() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let out = Rsi::new(3).compute(&bars);
        assert!(out
            .iter()
            .filter(|v| !v.is_nan())
            .all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn rsi_first_defined_on_bar_14() {
        let rsi = Rsi::new(14);
        assert_eq!(rsi.first_defined(), 13);
        let zigzag: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 50.0 } else { 51.0 }).collect();
        let out = rsi.compute(&make_bars(&zigzag));
        assert!(out[12].is_nan());
        assert!(out[13].is_finite());
    }

    #[test]
    fn empty_history() {
        assert!(Rsi::new(14).compute(&[]).is_empty());
    }
}
