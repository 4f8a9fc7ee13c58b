// 9.1 engine/core.rs: the market singleton. every mutable piece of market
// state lives on this struct and every state transition happens through a
// &mut method, which is what serializes position and aggregate-OI updates.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::events::{Event, EventId, EventPayload, RiskParamSetEvent, ShutdownEvent};
use crate::feed::{FeedData, PriceFeed};
use crate::params::{ParamError, RiskParamKind, RiskParams};
use crate::position::Position;
use crate::roller::Snapshot;
use crate::types::{AccountId, MarketId, PositionId, Side, Timestamp};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Market<F: PriceFeed> {
    pub(super) config: EngineConfig,
    pub(super) id: MarketId,
    pub(super) feed: F,
    pub(super) params: RiskParams,

    /// Ledger account the market itself controls: holds collateral and is
    /// the mint/burn authority.
    pub(super) market_account: AccountId,
    pub(super) fee_recipient: AccountId,

    // aggregate open interest and its share pools, per side
    pub(super) oi_long: Decimal,
    pub(super) oi_short: Decimal,
    pub(super) oi_long_shares: Decimal,
    pub(super) oi_short_shares: Decimal,

    // rolling accumulators: trade volume per quote side, net minted supply
    pub(super) snapshot_volume_ask: Snapshot,
    pub(super) snapshot_volume_bid: Snapshot,
    pub(super) snapshot_minted: Snapshot,

    pub(super) timestamp_update_last: Timestamp,
    pub(super) is_shutdown: bool,

    pub(super) positions: HashMap<(AccountId, PositionId), Position>,
    pub(super) next_position_id: u64,

    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl<F: PriceFeed> Market<F> {
    pub fn new(
        id: MarketId,
        feed: F,
        params: RiskParams,
        market_account: AccountId,
        fee_recipient: AccountId,
        config: EngineConfig,
    ) -> Self {
        Self {
            config,
            id,
            feed,
            params,
            market_account,
            fee_recipient,
            oi_long: Decimal::ZERO,
            oi_short: Decimal::ZERO,
            oi_long_shares: Decimal::ZERO,
            oi_short_shares: Decimal::ZERO,
            snapshot_volume_ask: Snapshot::cold(),
            snapshot_volume_bid: Snapshot::cold(),
            snapshot_minted: Snapshot::cold(),
            timestamp_update_last: Timestamp::from_secs(0),
            is_shutdown: false,
            positions: HashMap::new(),
            next_position_id: 1,
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_secs(0),
        }
    }

    // deterministic engine-held clock, set by the caller
    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn advance_time(&mut self, secs: u32) {
        self.current_time = Timestamp::from_secs(self.current_time.as_secs().wrapping_add(secs));
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn id(&self) -> MarketId {
        self.id
    }

    pub fn params(&self) -> &RiskParams {
        &self.params
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    pub fn market_account(&self) -> AccountId {
        self.market_account
    }

    pub fn fee_recipient(&self) -> AccountId {
        self.fee_recipient
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown
    }

    pub fn oi(&self, side: Side) -> Decimal {
        match side {
            Side::Long => self.oi_long,
            Side::Short => self.oi_short,
        }
    }

    pub fn oi_shares(&self, side: Side) -> Decimal {
        match side {
            Side::Long => self.oi_long_shares,
            Side::Short => self.oi_short_shares,
        }
    }

    pub fn minted_snapshot(&self) -> Snapshot {
        self.snapshot_minted
    }

    pub fn position(&self, owner: AccountId, id: PositionId) -> Option<&Position> {
        self.positions.get(&(owner, id))
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.values().filter(|p| p.is_open()).count()
    }

    /// Pull the latest feed data, validate it, and settle funding up to now.
    /// Every price-dependent operation goes through this first, so stale or
    /// drifting feed data blocks builds, unwinds and liquidations alike.
    pub fn update(&mut self) -> Result<FeedData, EngineError> {
        let data = self.feed.latest();
        data.validate(self.params.price_drift_upper_limit)?;
        self.settle_funding()?;
        self.timestamp_update_last = self.current_time;
        Ok(data)
    }

    /// One-way switch: no new builds, ever. Unwind and liquidate stay live so
    /// funds are never trapped.
    pub fn shutdown(&mut self, triggered_by: AccountId) {
        if self.is_shutdown {
            return;
        }
        self.is_shutdown = true;
        self.emit_event(EventPayload::Shutdown(ShutdownEvent { triggered_by }));
    }

    /// Apply a governance parameter edit. Bounds are the factory's job; the
    /// engine re-checks only the instant-liquidation guard, and only for the
    /// parameters that feed it.
    pub fn set_risk_param(
        &mut self,
        kind: RiskParamKind,
        value: Decimal,
    ) -> Result<(), EngineError> {
        let previous = self.params.get(kind);
        self.params.set(kind, value);

        let guarded = matches!(
            kind,
            RiskParamKind::Delta
                | RiskParamKind::CapLeverage
                | RiskParamKind::MaintenanceMarginFraction
        );
        if guarded && !self.params.max_leverage_is_safe() {
            self.params.set(kind, previous);
            return Err(EngineError::Param(ParamError::MaxLeverageUnsafe));
        }

        self.emit_event(EventPayload::RiskParamSet(RiskParamSetEvent { kind, value }));
        Ok(())
    }

    pub(super) fn side_aggregates(&self, is_long: bool) -> (Decimal, Decimal) {
        if is_long {
            (self.oi_long, self.oi_long_shares)
        } else {
            (self.oi_short, self.oi_short_shares)
        }
    }

    pub(super) fn add_to_side(&mut self, is_long: bool, oi: Decimal, shares: Decimal) {
        if is_long {
            self.oi_long += oi;
            self.oi_long_shares += shares;
        } else {
            self.oi_short += oi;
            self.oi_short_shares += shares;
        }
    }

    // removal floors at zero so rounding dust cannot leave a phantom negative
    pub(super) fn sub_from_side(&mut self, is_long: bool, oi: Decimal, shares: Decimal) {
        use crate::fixed_point::sub_floor;
        if is_long {
            self.oi_long = sub_floor(self.oi_long, oi);
            self.oi_long_shares = sub_floor(self.oi_long_shares, shares);
        } else {
            self.oi_short = sub_floor(self.oi_short, oi);
            self.oi_short_shares = sub_floor(self.oi_short_shares, shares);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
