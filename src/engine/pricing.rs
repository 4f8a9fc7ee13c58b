//! Execution pricing. Quotes start from the worse of the two TWAPs for the
//! trade direction, then widen by a static spread plus a market-impact
//! premium proportional to recent rolling volume.

use super::core::Market;
use super::results::EngineError;
use crate::feed::{FeedData, PriceFeed};
use crate::fixed_point::{exp_down, exp_up, EXP_MAX_INPUT};
use crate::roller::Snapshot;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// 10.0: feed-derived reference prices

/// Mid price used for position bookkeeping: average of the micro and macro
/// TWAPs, deliberately insensitive to which one is currently higher.
pub fn mid_from_feed(data: &FeedData) -> Decimal {
    (data.price_micro + data.price_macro) / dec!(2)
}

/// Open interest contracted at a given mid price.
pub fn oi_from_notional(notional: Decimal, mid: Decimal) -> Decimal {
    notional / mid
}

// 10.1: circuit breaker

/// Scale the notional cap down when recent net minting runs hot. At or below
/// the target the cap is untouched; at twice the target (or beyond) it is
/// zero; linear in between. The two-times check comes first so a zero target
/// never divides by zero.
pub fn circuit_breaker(snapshot: &Snapshot, cap: Decimal, target: Decimal) -> Decimal {
    let minted = snapshot.cumulative();
    if minted <= target {
        cap
    } else if minted >= dec!(2) * target {
        Decimal::ZERO
    } else {
        cap * (dec!(2) - minted / target)
    }
}

impl<F: PriceFeed> Market<F> {
    // 10.2: impact quotes

    /// Price a sell: the worse (lower) TWAP, pushed further down by the
    /// static spread and the bid-side volume premium.
    pub fn bid(&self, data: &FeedData, volume: Decimal) -> Result<Decimal, EngineError> {
        let pow = self.params.delta + self.params.lambda * volume;
        if pow > EXP_MAX_INPUT {
            return Err(EngineError::SlippageOverflow);
        }
        let base = data.price_micro.min(data.price_macro);
        Ok(base * exp_down(-pow)?)
    }

    /// Price a buy: the worse (higher) TWAP, pushed further up by the static
    /// spread and the ask-side volume premium.
    pub fn ask(&self, data: &FeedData, volume: Decimal) -> Result<Decimal, EngineError> {
        let pow = self.params.delta + self.params.lambda * volume;
        if pow > EXP_MAX_INPUT {
            return Err(EngineError::SlippageOverflow);
        }
        let base = data.price_micro.max(data.price_macro);
        Ok(base * exp_up(pow)?)
    }

    // 10.3: notional cap adjustments

    /// The static cap, tightened by the front-run and back-run bounds when
    /// the feed reports the spot pool's reserve. Without reserve data the
    /// static cap stands alone.
    pub(super) fn cap_notional_with_bounds(&self, data: &FeedData) -> Decimal {
        let mut cap = self.params.cap_notional;
        if data.has_reserve {
            // front-run bound: arbitrage profit from trading ahead of the
            // TWAP is capped by lambda times the pool depth
            cap = cap.min(self.params.lambda * data.reserve_micro);
            // back-run bound: profit from trading behind the macro window
            if self.params.average_block_time > Decimal::ZERO {
                let backrun = dec!(2) * self.params.delta * data.reserve_micro
                    * data.macro_window
                    / self.params.average_block_time;
                cap = cap.min(backrun);
            }
        }
        cap
    }
}
