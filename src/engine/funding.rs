//! Funding as open-interest decay. Instead of cash payments between sides,
//! the overweight side continuously loses open interest and the underweight
//! side gains a smaller amount, pulling the imbalance toward zero while
//! bleeding total OI. The imbalance halves on a timescale set by k.

use super::core::Market;
use super::results::EngineError;
use crate::events::{EventPayload, FundingSettledEvent};
use crate::feed::PriceFeed;
use crate::fixed_point::{exp_down, sqrt, sub_floor, MathError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// 11.0: the decay law

/// Advance a funding period of `elapsed` seconds over the (overweight,
/// underweight) OI pair. The imbalance decays exponentially at rate 2k and
/// the product of the sides is preserved, which keeps the geometry of the
/// payoff pool intact:
///
///   imb' = imb * e^(-2k dt)
///   tot' = sqrt(tot^2 - imb^2 + imb'^2)
///
/// Rounding on the exponential is downward so funding never manufactures OI.
pub fn oi_after_funding(
    over: Decimal,
    under: Decimal,
    elapsed: Decimal,
    k: Decimal,
) -> Result<(Decimal, Decimal), MathError> {
    let total = over + under;
    let imbalance = over - under;

    let imbalance_now = imbalance * exp_down(dec!(-2) * k * elapsed)?;
    let total_now = sqrt(
        total * total - imbalance * imbalance + imbalance_now * imbalance_now,
    )?;

    let over_now = (total_now + imbalance_now) / dec!(2);
    // sqrt is approximate; floor so a one-sided market cannot round negative
    let under_now = sub_floor(total_now, imbalance_now) / dec!(2);
    Ok((over_now, under_now))
}

impl<F: PriceFeed> Market<F> {
    // 11.1: applying it to the market aggregates

    /// Settle funding from the last update to the engine clock. Skipped when
    /// no time has passed, when there is no OI, or before the first update
    /// (a cold market has nothing to fund).
    pub(super) fn settle_funding(&mut self) -> Result<(), EngineError> {
        if self.timestamp_update_last.is_zero() {
            return Ok(());
        }
        let elapsed = self.current_time.elapsed(self.timestamp_update_last);
        if elapsed.is_zero() {
            return Ok(());
        }
        let total = self.oi_long + self.oi_short;
        if total.is_zero() {
            return Ok(());
        }

        let long_before = self.oi_long;
        let short_before = self.oi_short;
        let long_overweight = self.oi_long >= self.oi_short;
        let (over, under) = if long_overweight {
            (self.oi_long, self.oi_short)
        } else {
            (self.oi_short, self.oi_long)
        };

        let (over_now, under_now) = oi_after_funding(over, under, elapsed, self.params.k)?;
        if long_overweight {
            self.oi_long = over_now;
            self.oi_short = under_now;
        } else {
            self.oi_short = over_now;
            self.oi_long = under_now;
        }

        if self.oi_long != long_before || self.oi_short != short_before {
            self.emit_event(EventPayload::FundingSettled(FundingSettledEvent {
                oi_long_before: long_before,
                oi_short_before: short_before,
                oi_long_after: self.oi_long,
                oi_short_after: self.oi_short,
                elapsed,
            }));
        }
        Ok(())
    }
}
