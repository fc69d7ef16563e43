//! Simple moving averages over close or volume.
//!
//! Full windows only: `sma_50` is first defined on the 50th bar.

use super::rolling::rolling_mean;
use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Which bar field an average reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Close,
    Volume,
}

impl Source {
    fn read(self, bar: &Bar) -> f64 {
        match self {
            Source::Close => bar.close,
            Source::Volume => bar.volume as f64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    source: Source,
    period: usize,
    name: String,
}

impl Sma {
    /// Mean close over `period` bars, stored as `sma_{period}`.
    pub fn close(period: usize) -> Self {
        Self::build(Source::Close, period, format!("sma_{period}"))
    }

    /// Mean volume over `period` bars, stored as `volume_ma_{period}`.
    pub fn volume(period: usize) -> Self {
        Self::build(Source::Volume, period, format!("volume_ma_{period}"))
    }

    fn build(source: Source, period: usize, name: String) -> Self {
        assert!(period >= 1, "moving average period must be >= 1");
        Self {
            source,
            period,
            name,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_defined(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let input: Vec<f64> = bars.iter().map(|b| self.source.read(b)).collect();
        rolling_mean(&input, self.period, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn close_average_waits_for_full_window() {
        let bars = make_bars(&[4.0, 8.0, 6.0, 10.0, 2.0]);
        let out = Sma::close(3).compute(&bars);

        assert!(out[0].is_nan() && out[1].is_nan());
        assert_approx(out[2], 6.0, DEFAULT_EPSILON);
        assert_approx(out[3], 8.0, DEFAULT_EPSILON);
        assert_approx(out[4], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_close_gives_constant_average() {
        let bars = make_bars(&[100.0; 260]);
        let sma50 = Sma::close(50).compute(&bars);
        let sma200 = Sma::close(200).compute(&bars);
        assert!(sma50[48].is_nan());
        assert!(sma200[198].is_nan());
        assert_approx(sma50[49], 100.0, DEFAULT_EPSILON);
        assert_approx(sma200[259], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn volume_average_reads_volume() {
        let mut bars = make_bars(&[10.0, 10.0, 10.0]);
        for (bar, v) in bars.iter_mut().zip([100, 200, 600]) {
            bar.volume = v;
        }
        let ma = Sma::volume(3);
        let out = ma.compute(&bars);

        assert!(out[1].is_nan());
        assert_approx(out[2], 300.0, DEFAULT_EPSILON);
        assert_eq!(ma.name(), "volume_ma_3");
        assert_eq!(ma.source(), Source::Volume);
    }

    #[test]
    fn names_and_first_defined() {
        assert_eq!(Sma::close(200).name(), "sma_200");
        assert_eq!(Sma::close(50).first_defined(), 49);
        assert_eq!(Sma::volume(20).first_defined(), 19);
    }

    #[test]
    fn short_history_is_all_undefined() {
        let out = Sma::close(5).compute(&make_bars(&[10.0, 11.0]));
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
