//! Input gate for price history.

pub mod validate;

pub use validate::{clean_history, CleanHistory, HistoryError};
