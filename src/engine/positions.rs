// 12.0: build and unwind, the two trader-initiated transitions.
// both follow the same shape: validate inputs, update feed + funding, price
// the trade, move tokens, and only then mutate market state, so a failure at
// any step leaves the market exactly as it was.

use super::core::Market;
use super::pricing::{circuit_breaker, mid_from_feed, oi_from_notional};
use super::results::{BuildResult, EngineError, UnwindResult};
use crate::events::{BuildEvent, EventPayload, UnwindEvent};
use crate::feed::PriceFeed;
use crate::position::{entry_to_mid_ratio, Position};
use crate::tick::price_to_tick;
use crate::token::Token;
use crate::types::{AccountId, PositionId};
use rust_decimal::Decimal;

impl<F: PriceFeed> Market<F> {
    // 12.1: build

    /// Open a position. The trader pays `collateral + trading_fee` up front;
    /// the fee is charged on notional and forwarded to the fee recipient.
    pub fn build(
        &mut self,
        token: &mut Token,
        owner: AccountId,
        collateral: Decimal,
        leverage: Decimal,
        is_long: bool,
        price_limit: Decimal,
    ) -> Result<BuildResult, EngineError> {
        if self.is_shutdown {
            return Err(EngineError::Shutdown);
        }
        if leverage < Decimal::ONE || leverage > self.params.cap_leverage {
            return Err(EngineError::LeverageOutOfBounds {
                leverage,
                max: self.params.cap_leverage,
            });
        }
        if collateral < self.params.min_collateral {
            return Err(EngineError::CollateralBelowMinimum {
                collateral,
                minimum: self.params.min_collateral,
            });
        }

        let data = self.update()?;
        let mid = mid_from_feed(&data);

        let notional = collateral * leverage;
        let debt = notional - collateral;
        let trading_fee = notional * self.params.trading_fee_rate;
        let oi = oi_from_notional(notional, mid);

        // cap pipeline: static cap, feed-reserve bounds, then the circuit
        // breaker over minted supply decayed to now
        let cap = self.cap_notional_with_bounds(&data);
        let minted = self.snapshot_minted.transform(
            self.current_time,
            self.params.circuit_breaker_window,
            Decimal::ZERO,
        );
        let cap = circuit_breaker(&minted, cap, self.params.circuit_breaker_mint_target);

        let cap_oi = oi_from_notional(cap, mid);
        let (side_oi, side_shares) = self.side_aggregates(is_long);
        if side_oi + oi > cap_oi {
            return Err(EngineError::OiAboveCap {
                oi: side_oi + oi,
                cap: cap_oi,
            });
        }

        // register volume on the side being taken; the rolled snapshot is only
        // persisted once the build is certain to succeed
        let snapshot = if is_long {
            self.snapshot_volume_ask
        } else {
            self.snapshot_volume_bid
        };
        let rolled = snapshot.transform(self.current_time, data.micro_window, notional / cap);
        let volume = rolled.cumulative();

        let price = if is_long {
            self.ask(&data, volume)?
        } else {
            self.bid(&data, volume)?
        };
        let breaches = if is_long {
            price > price_limit
        } else {
            price < price_limit
        };
        if breaches {
            return Err(EngineError::SlippageExceeded {
                price,
                limit: price_limit,
            });
        }

        // rejects entries so far above mid that they would quantize to
        // nothing downstream
        let _ = entry_to_mid_ratio(price, mid)?;
        let entry_tick = price_to_tick(price)?;
        let mid_tick = price_to_tick(mid)?;

        let shares = if side_shares.is_zero() || side_oi.is_zero() {
            oi
        } else {
            oi * side_shares / side_oi
        };

        // token flow first: collateral and fee leave the trader together, so
        // an underfunded account aborts before any state has moved
        token.transfer(owner, self.market_account, collateral + trading_fee)?;
        token.transfer(self.market_account, self.fee_recipient, trading_fee)?;

        let position_id = PositionId(self.next_position_id);
        self.next_position_id += 1;
        self.positions.insert(
            (owner, position_id),
            Position::new(notional, debt, mid_tick, entry_tick, is_long, shares),
        );
        self.add_to_side(is_long, oi, shares);
        if is_long {
            self.snapshot_volume_ask = rolled;
        } else {
            self.snapshot_volume_bid = rolled;
        }

        self.emit_event(EventPayload::Build(BuildEvent {
            owner,
            position_id,
            is_long,
            collateral,
            notional,
            oi,
            price,
            trading_fee,
        }));

        Ok(BuildResult {
            position_id,
            price,
            oi,
            debt,
            collateral,
            trading_fee,
        })
    }

    // 12.2: unwind

    /// Close `fraction` of what remains of a position. Exits stay open after
    /// shutdown and are never blocked by the notional cap: the unwound volume
    /// is normalized against the static cap so a vanished feed reserve cannot
    /// trap a trader in.
    pub fn unwind(
        &mut self,
        token: &mut Token,
        owner: AccountId,
        position_id: PositionId,
        fraction: Decimal,
        price_limit: Decimal,
    ) -> Result<UnwindResult, EngineError> {
        if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
            return Err(EngineError::InvalidFraction(fraction));
        }
        let pos = self
            .positions
            .get(&(owner, position_id))
            .ok_or(EngineError::PositionNotFound(owner, position_id))?
            .clone();
        if pos.liquidated {
            return Err(EngineError::PositionLiquidated(position_id));
        }

        let data = self.update()?;
        let mid = mid_from_feed(&data);
        let (side_oi, side_shares) = self.side_aggregates(pos.is_long);

        let oi_unwound = pos.oi_current(fraction, side_oi, side_shares);
        let shares_unwound = pos.oi_shares_current(fraction);

        // closing a long sells into the bid, closing a short buys the ask
        let snapshot = if pos.is_long {
            self.snapshot_volume_bid
        } else {
            self.snapshot_volume_ask
        };
        let rolled = snapshot.transform(
            self.current_time,
            data.micro_window,
            oi_unwound * mid / self.params.cap_notional,
        );
        let volume = rolled.cumulative();

        let price = if pos.is_long {
            self.bid(&data, volume)?
        } else {
            self.ask(&data, volume)?
        };
        let breaches = if pos.is_long {
            price < price_limit
        } else {
            price > price_limit
        };
        if breaches {
            return Err(EngineError::SlippageExceeded {
                price,
                limit: price_limit,
            });
        }

        let cap_payoff = self.params.cap_payoff;
        let value = pos.value(fraction, side_oi, side_shares, price, cap_payoff)?;
        let cost = pos.cost(fraction);
        let trading_fee = pos
            .trading_fee(
                fraction,
                side_oi,
                side_shares,
                price,
                cap_payoff,
                self.params.trading_fee_rate,
            )?
            .min(value);
        let mint = value - cost - trading_fee;

        // settle the supply delta on the market's own balance, then pay out
        if value > cost {
            token.mint(self.market_account, value - cost)?;
        } else {
            token.burn(self.market_account, cost - value)?;
        }
        token.transfer(self.market_account, owner, value - trading_fee)?;
        token.transfer(self.market_account, self.fee_recipient, trading_fee)?;

        self.snapshot_minted = self.snapshot_minted.transform(
            self.current_time,
            self.params.circuit_breaker_window,
            mint,
        );
        if pos.is_long {
            self.snapshot_volume_bid = rolled;
        } else {
            self.snapshot_volume_ask = rolled;
        }
        self.sub_from_side(pos.is_long, oi_unwound, shares_unwound);

        let fraction_remaining = pos.fraction_remaining_after(fraction);
        let closed = fraction_remaining == 0;
        if closed {
            self.positions.remove(&(owner, position_id));
        } else if let Some(stored) = self.positions.get_mut(&(owner, position_id)) {
            stored.fraction_remaining = fraction_remaining;
        }

        self.emit_event(EventPayload::Unwind(UnwindEvent {
            owner,
            position_id,
            fraction,
            price,
            mint,
            trading_fee,
        }));

        Ok(UnwindResult {
            price,
            value,
            cost,
            trading_fee,
            mint,
            closed,
        })
    }
}
