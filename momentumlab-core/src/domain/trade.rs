//! TradeRecord — a completed round-trip trade.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Position;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Close at or below the entry-time stop.
    StopLoss,
    /// Momentum signal no longer true.
    SignalExit,
    /// Forced liquidation after the last simulated date.
    FinalExit,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::SignalExit => "SIGNAL_EXIT",
            ExitReason::FinalExit => "FINAL_EXIT",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,

    // ── Entry ──
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    pub shares: u64,

    // ── PnL ──
    pub pnl: f64,
    /// PnL as a percentage of the entry cost (5.0 = +5%).
    pub pnl_pct: f64,

    pub exit_reason: ExitReason,
}

impl TradeRecord {
    /// Close `position` at `exit_price` on `exit_date`.
    ///
    /// PnL is always measured from the entry price, never from the stop.
    pub fn close(
        position: Position,
        exit_date: NaiveDate,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let cost = position.cost_basis();
        let pnl = position.shares as f64 * (exit_price - position.entry_price);
        let pnl_pct = if cost > 0.0 { pnl / cost * 100.0 } else { 0.0 };
        Self {
            symbol: position.symbol,
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date,
            exit_price,
            shares: position.shares,
            pnl,
            pnl_pct,
            exit_reason,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }

    /// Calendar days between entry and exit.
    pub fn days_held(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
