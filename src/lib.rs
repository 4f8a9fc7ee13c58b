// ovm-core: synthetic perpetuals venue. market accounting and risk engine.
// inverted-payoff design: no order book, every position trades against the
// market at feed-derived quotes, and pnl is settled by minting and burning
// the venue's own collateral token.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MarketId, AccountId, Side, Timestamp
//   2.x  fixed_point.rs: directional-rounding decimal math (exp/log/pow)
//   3.x  tick.rs: log-base-1.0001 price quantization
//   4.x  roller.rs: rolling decaying accumulators (volume, minted)
//   5.x  params.rs: the 15 governed risk parameters, bounds, guard
//   6.x  position.rs: position records, valuation, liquidation test
//   7.x  token.rs: collateral token ledger (mint/burn/transfer)
//   8.x  events.rs: state transition events for audit
//   9.x  engine/: market state machine
//   10.x engine/pricing.rs: bid/ask impact quotes, caps, circuit breaker
//   11.x engine/funding.rs: oi imbalance decay
//   12.x engine/positions.rs: build and unwind
//   13.x engine/liquidations.rs: permissionless liquidation
//   14.x factory.rs: governance: deployment, allowlist, param edits
//   15.x feed.rs: price feed trait, drift validation, mock feed

// market accounting
pub mod engine;
pub mod events;
pub mod position;
pub mod roller;
pub mod types;

// numerics
pub mod fixed_point;
pub mod tick;

// risk and governance
pub mod factory;
pub mod params;

// external surfaces
pub mod feed;
pub mod token;

pub use engine::{
    BuildResult, EngineConfig, EngineError, LiquidateResult, Market, UnwindResult,
};
pub use factory::{Factory, FactoryError};
pub use feed::{FeedData, FeedError, MockFeed, PriceFeed};
pub use params::{RiskParamKind, RiskParams, PARAM_COUNT};
pub use position::Position;
pub use token::{Token, TokenError};
pub use types::{AccountId, FeedFactoryId, MarketId, PositionId, Side, Timestamp};
