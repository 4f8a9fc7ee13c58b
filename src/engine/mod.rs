// 9.0 engine/: the market state machine, split by operation.
//   core.rs         market struct, update loop, shutdown, param edits
//   pricing.rs      bid/ask impact pricing, caps, circuit breaker
//   funding.rs      oi imbalance decay between sides
//   positions.rs    build and unwind
//   liquidations.rs permissionless liquidation
//   results.rs      operation results and the error taxonomy
//   config.rs       engine housekeeping knobs

pub mod config;
pub mod core;
pub mod funding;
pub mod liquidations;
pub mod positions;
pub mod pricing;
pub mod results;

pub use config::EngineConfig;
pub use core::Market;
pub use funding::oi_after_funding;
pub use pricing::{circuit_breaker, mid_from_feed, oi_from_notional};
pub use results::{BuildResult, EngineError, LiquidateResult, UnwindResult};
