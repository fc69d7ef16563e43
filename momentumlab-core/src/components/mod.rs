//! Component traits.
//!
//! - Indicator: bar history in, numeric series out
//! - Signal rule: indicator record in, boolean trade signal out

pub mod indicator;
pub mod signal;

pub use indicator::{Indicator, IndicatorFrame};
pub use signal::{MomentumSignal, SignalRule};
