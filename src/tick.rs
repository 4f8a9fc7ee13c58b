// 3.0: tick math. prices are stored as integer indexes into a log-base-1.0001
// grid, so a tick is roughly one basis point of price. conversion is lossy to
// ~1bp; the bounds keep every in-domain price representable in
// Decimal at 18 fraction digits.

use crate::fixed_point::{self, MathError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

/// One tick = a factor of 1.0001 in price.
pub const TICK_BASE: Decimal = dec!(1.0001);

/// Lowest tick: prices below ~1e-18 vanish at 18 fraction digits.
pub const MIN_TICK: i32 = -414_000;

/// Highest tick: 660_000·ln(1.0001) stays under the exp domain ceiling, so
/// 1.0001^660_000 (~4.6e28) is the largest representable grid price.
pub const MAX_TICK: i32 = 660_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    #[error("tick {0} outside [{MIN_TICK}, {MAX_TICK}]")]
    TickOutOfBounds(i32),

    #[error("price {0} outside the tick domain")]
    PriceOutOfBounds(Decimal),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Floor of log_1.0001(price). Fails for non-positive prices and prices whose
/// tick would land outside the fixed domain.
pub fn price_to_tick(price: Decimal) -> Result<i32, TickError> {
    if price <= Decimal::ZERO {
        return Err(TickError::PriceOutOfBounds(price));
    }
    let log = fixed_point::log_down(price, TICK_BASE)?;
    let tick = log
        .floor()
        .to_i64()
        .ok_or(TickError::PriceOutOfBounds(price))?;
    if tick < MIN_TICK as i64 || tick > MAX_TICK as i64 {
        return Err(TickError::PriceOutOfBounds(price));
    }
    Ok(tick as i32)
}

/// 1.0001^tick, bounds-checked against the tick domain.
pub fn tick_to_price(tick: i32) -> Result<Decimal, TickError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(TickError::TickOutOfBounds(tick));
    }
    let price = fixed_point::pow_down(TICK_BASE, Decimal::from(tick))?;
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1bp relative tolerance for round trips
    fn within_one_bp(a: Decimal, b: Decimal) -> bool {
        ((a - b) / b).abs() <= dec!(0.0001)
    }

    #[test]
    fn unit_price_is_tick_zero() {
        assert_eq!(price_to_tick(Decimal::ONE).unwrap(), 0);
        assert_eq!(tick_to_price(0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn round_trip_everyday_prices() {
        for p in [dec!(0.001), dec!(0.5), dec!(1), dec!(42.7), dec!(50000), dec!(1234567.89)] {
            let t = price_to_tick(p).unwrap();
            let back = tick_to_price(t).unwrap();
            assert!(within_one_bp(back, p), "price {p} -> tick {t} -> {back}");
        }
    }

    #[test]
    fn tick_floors_downward() {
        // 1.0001^10 is ~1.0010004; a price just above tick 10 must still floor to 10
        let p = tick_to_price(10).unwrap() + dec!(0.00001);
        assert_eq!(price_to_tick(p).unwrap(), 10);
    }

    #[test]
    fn negative_ticks_for_sub_unit_prices() {
        let t = price_to_tick(dec!(0.9)).unwrap();
        assert!(t < 0);
        let back = tick_to_price(t).unwrap();
        assert!(within_one_bp(back, dec!(0.9)));
    }

    #[test]
    fn rejects_out_of_domain() {
        assert!(price_to_tick(Decimal::ZERO).is_err());
        assert!(price_to_tick(dec!(-1)).is_err());
        assert!(tick_to_price(MAX_TICK + 1).is_err());
        assert!(tick_to_price(MIN_TICK - 1).is_err());
    }

    #[test]
    fn domain_extremes_are_representable() {
        assert!(tick_to_price(MAX_TICK).unwrap() > Decimal::ZERO);
        assert!(tick_to_price(MIN_TICK).unwrap() >= Decimal::ZERO);
    }
}
