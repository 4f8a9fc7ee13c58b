// 4.0: rolling decaying accumulators. one snapshot tracks one quantity
// (ask volume, bid volume, net minted) as a value that bleeds away linearly
// over its window. settlement is lazy: nothing ticks in the background, the
// next transform() recomputes decay from elapsed time.

use crate::types::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp_last: Timestamp,
    pub window_last: Decimal,
    pub value_last: Decimal,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::cold()
    }
}

impl Snapshot {
    // cold state: no prior contribution. window 0 / timestamp 0 both mean cold.
    pub fn cold() -> Self {
        Self {
            timestamp_last: Timestamp::from_secs(0),
            window_last: Decimal::ZERO,
            value_last: Decimal::ZERO,
        }
    }

    /// Already-settled read. Callers that need the decayed-to-now value must
    /// transform() with a zero contribution first.
    pub fn cumulative(&self) -> Decimal {
        self.value_last
    }

    /// Fold a new (window, value) contribution into the snapshot at `now`.
    /// Values are signed; the window of the blended snapshot is the
    /// magnitude-weighted average of the surviving old window and the new one.
    pub fn transform(&self, now: Timestamp, window: Decimal, value: Decimal) -> Snapshot {
        let dt = now.elapsed(self.timestamp_last);

        // cold snapshot, or the old contribution has fully decayed
        if self.window_last.is_zero() || self.timestamp_last.is_zero() || dt >= self.window_last {
            return Snapshot {
                timestamp_last: now,
                window_last: window,
                value_last: value,
            };
        }

        let decayed = self.value_last * (Decimal::ONE - dt / self.window_last);
        let value_now = decayed + value;
        let window_now = if value_now.is_zero() {
            // covers the |decayed| + |value| == 0 denominator as well
            window
        } else {
            let weight = decayed.abs() + value.abs();
            ((self.window_last - dt) * decayed.abs() + window * value.abs()) / weight
        };

        Snapshot {
            timestamp_last: now,
            window_last: window_now,
            value_last: value_now,
        }
    }
}
