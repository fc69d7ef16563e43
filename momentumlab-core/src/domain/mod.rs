//! Plain data types shared by the indicator engine and the simulator.

pub mod bar;
pub mod equity;
pub mod portfolio;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use equity::EquitySnapshot;
pub use portfolio::Portfolio;
pub use position::Position;
pub use trade::{ExitReason, TradeRecord};
