// 15.0: price feed integration.
//
// The engine is agnostic to where TWAPs come from - Uniswap V3, Balancer V2,
// Chainlink rounds, or a test fixture. Everything a market consumes is the
// FeedData contract below; concrete adapters implement the PriceFeed trait
// and the engine is generic over that capability alone.

use crate::fixed_point::{self, MathError};
use crate::types::{FeedFactoryId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One read of the external price source. Two TWAP horizons: a short micro
/// window for responsiveness and a longer macro window for manipulation
/// resistance. The reserve signal is optional; markets degrade to their
/// static caps without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedData {
    pub timestamp: Timestamp,
    /// Micro TWAP horizon in seconds.
    pub micro_window: Decimal,
    /// Macro TWAP horizon in seconds.
    pub macro_window: Decimal,
    pub price_micro: Decimal,
    pub price_macro: Decimal,
    /// Macro TWAP as of one macro window ago, for the drift check.
    pub price_macro_window_ago: Decimal,
    /// Liquidity depth over the micro window, in notional terms.
    pub reserve_micro: Decimal,
    pub has_reserve: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("feed reported non-positive price")]
    NonPositivePrice,

    #[error("feed reported non-positive window")]
    NonPositiveWindow,

    #[error("macro drift ratio {ratio} outside [{lower}, {upper}]")]
    DriftExceeded {
        ratio: Decimal,
        lower: Decimal,
        upper: Decimal,
    },

    #[error(transparent)]
    Math(#[from] MathError),
}

impl FeedData {
    /// Anti-manipulation validity check: prices and windows must be positive
    /// and the macro TWAP cannot have drifted faster than the configured
    /// per-second limit over one macro window.
    pub fn validate(&self, drift_upper_limit: Decimal) -> Result<(), FeedError> {
        if self.price_micro <= Decimal::ZERO
            || self.price_macro <= Decimal::ZERO
            || self.price_macro_window_ago <= Decimal::ZERO
        {
            return Err(FeedError::NonPositivePrice);
        }
        if self.micro_window <= Decimal::ZERO || self.macro_window <= Decimal::ZERO {
            return Err(FeedError::NonPositiveWindow);
        }

        let pow = drift_upper_limit * self.macro_window;
        let upper = fixed_point::exp_up(pow)?;
        let lower = fixed_point::exp_down(-pow)?;
        let ratio = self.price_macro / self.price_macro_window_ago;
        if ratio < lower || ratio > upper {
            return Err(FeedError::DriftExceeded { ratio, lower, upper });
        }
        Ok(())
    }
}

/// The one capability a market needs from the outside world.
pub trait PriceFeed {
    fn latest(&self) -> FeedData;

    /// Which feed factory deployed this feed. Governance allowlists
    /// factories, not individual feeds.
    fn factory_id(&self) -> FeedFactoryId;
}

/// Deterministic in-memory feed for tests and simulation. Both TWAPs move
/// together unless explicitly split.
#[derive(Debug, Clone)]
pub struct MockFeed {
    pub factory_id: FeedFactoryId,
    pub data: FeedData,
}

impl MockFeed {
    pub fn new(price: Decimal) -> Self {
        Self {
            factory_id: FeedFactoryId(1),
            data: FeedData {
                timestamp: Timestamp::from_secs(0),
                micro_window: Decimal::from(600),
                macro_window: Decimal::from(3600),
                price_micro: price,
                price_macro: price,
                price_macro_window_ago: price,
                reserve_micro: Decimal::ZERO,
                has_reserve: false,
            },
        }
    }

    pub fn with_reserve(mut self, reserve: Decimal) -> Self {
        self.data.reserve_micro = reserve;
        self.data.has_reserve = true;
        self
    }

    /// Move both TWAPs to `price`, leaving the window-ago price in place so
    /// drift checks see the move.
    pub fn set_price(&mut self, price: Decimal) {
        self.data.price_micro = price;
        self.data.price_macro = price;
    }

    /// Settle the drift baseline: pretend a full macro window has passed at
    /// the current price.
    pub fn settle_history(&mut self) {
        self.data.price_macro_window_ago = self.data.price_macro;
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.data.timestamp = timestamp;
    }
}

impl PriceFeed for MockFeed {
    fn latest(&self) -> FeedData {
        self.data
    }

    fn factory_id(&self) -> FeedFactoryId {
        self.factory_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn valid_data_passes() {
        let feed = MockFeed::new(dec!(1800));
        assert!(feed.latest().validate(dec!(0.00001)).is_ok());
    }

    #[test]
    fn zero_price_rejected() {
        let mut feed = MockFeed::new(dec!(1800));
        feed.data.price_micro = Decimal::ZERO;
        assert_eq!(
            feed.latest().validate(dec!(0.00001)),
            Err(FeedError::NonPositivePrice)
        );
    }

    #[test]
    fn drift_within_bound_passes() {
        let mut feed = MockFeed::new(dec!(1000));
        // bound is e^(0.00001 * 3600) ~ 1.0367; a 3% move is fine
        feed.data.price_macro = dec!(1030);
        assert!(feed.latest().validate(dec!(0.00001)).is_ok());
    }

    #[test]
    fn drift_past_bound_rejected() {
        let mut feed = MockFeed::new(dec!(1000));
        // 5% move in one macro window exceeds the ~3.7% bound
        feed.data.price_macro = dec!(1050);
        assert!(matches!(
            feed.latest().validate(dec!(0.00001)),
            Err(FeedError::DriftExceeded { .. })
        ));
    }

    #[test]
    fn downward_drift_also_bounded() {
        let mut feed = MockFeed::new(dec!(1000));
        feed.data.price_macro = dec!(950);
        assert!(matches!(
            feed.latest().validate(dec!(0.00001)),
            Err(FeedError::DriftExceeded { .. })
        ));
    }
}
