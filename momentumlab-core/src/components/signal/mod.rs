//! Signal rules — turn an indicator record into a trade signal.
//!
//! A rule sees exactly one `IndicatorRecord` and nothing else: no bar
//! history, no portfolio. That keeps signals a pure per-date function that
//! can be evaluated before the simulator runs.

pub mod crossover;
pub mod momentum;
pub mod predicate;

pub use crossover::{cross_direction, scan_crosses, CrossDirection, CrossEvent};
pub use momentum::MomentumSignal;
pub use predicate::{Comparison, Field, Operand, Predicate};

use crate::indicators::IndicatorRecord;

/// A boolean signal over one indicator record.
///
/// Implementations must return false rather than fail when a required
/// value is undefined.
pub trait SignalRule: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, record: &IndicatorRecord) -> bool;
}

impl SignalRule for Predicate {
    fn name(&self) -> &str {
        "predicate"
    }

    fn evaluate(&self, record: &IndicatorRecord) -> bool {
        Predicate::evaluate(self, record)
    }
}
