// 13.0: permissionless liquidation. anyone may close an underwater position;
// the caller earns a cut of the remaining value, part of the rest is burned,
// and the remainder goes to the fee recipient. the owner gets nothing.

use super::core::Market;
use super::results::{EngineError, LiquidateResult};
use crate::events::{EventPayload, LiquidateEvent};
use crate::feed::PriceFeed;
use crate::token::Token;
use crate::types::{AccountId, PositionId};
use rust_decimal::Decimal;

impl<F: PriceFeed> Market<F> {
    /// Liquidate someone else's position. Priced at the zero-volume exit
    /// quote and registers no volume: a forced close must not widen the very
    /// spread it executes at. Works after shutdown.
    pub fn liquidate(
        &mut self,
        token: &mut Token,
        caller: AccountId,
        owner: AccountId,
        position_id: PositionId,
    ) -> Result<LiquidateResult, EngineError> {
        let pos = self
            .positions
            .get(&(owner, position_id))
            .ok_or(EngineError::PositionNotFound(owner, position_id))?
            .clone();
        if pos.liquidated {
            return Err(EngineError::PositionLiquidated(position_id));
        }

        let data = self.update()?;
        let price = if pos.is_long {
            self.bid(&data, Decimal::ZERO)?
        } else {
            self.ask(&data, Decimal::ZERO)?
        };

        let (side_oi, side_shares) = self.side_aggregates(pos.is_long);
        let cap_payoff = self.params.cap_payoff;
        let eligible = pos.liquidatable(
            side_oi,
            side_shares,
            price,
            cap_payoff,
            self.params.maintenance_margin_fraction,
            self.params.liquidation_fee_rate,
        )?;
        if !eligible {
            return Err(EngineError::NotLiquidatable(position_id));
        }

        let value = pos.value(Decimal::ONE, side_oi, side_shares, price, cap_payoff)?;
        let cost = pos.cost(Decimal::ONE);

        let liquidation_fee = value * self.params.liquidation_fee_rate;
        let margin_remaining = value - liquidation_fee;
        let margin_burned = margin_remaining * self.params.maintenance_margin_burn_rate;
        let margin_to_fee_recipient = margin_remaining - margin_burned;
        let mint = value - cost - margin_burned;

        let oi_removed = pos.oi_current(Decimal::ONE, side_oi, side_shares);
        let shares_removed = pos.oi_shares_current(Decimal::ONE);

        // settle the supply delta, then burn the margin share and pay out
        if value > cost {
            token.mint(self.market_account, value - cost)?;
        } else {
            token.burn(self.market_account, cost - value)?;
        }
        token.burn(self.market_account, margin_burned)?;
        token.transfer(self.market_account, caller, liquidation_fee)?;
        token.transfer(self.market_account, self.fee_recipient, margin_to_fee_recipient)?;

        // burns count against the circuit breaker; no volume is registered
        self.snapshot_minted = self.snapshot_minted.transform(
            self.current_time,
            self.params.circuit_breaker_window,
            mint,
        );
        self.sub_from_side(pos.is_long, oi_removed, shares_removed);

        // the record stays behind as a tombstone
        if let Some(stored) = self.positions.get_mut(&(owner, position_id)) {
            stored.liquidated = true;
            stored.oi_shares = Decimal::ZERO;
            stored.fraction_remaining = 0;
        }

        self.emit_event(EventPayload::Liquidate(LiquidateEvent {
            owner,
            position_id,
            liquidator: caller,
            price,
            mint,
            liquidation_fee,
            margin_burned,
            margin_to_fee_recipient,
        }));

        Ok(LiquidateResult {
            price,
            value,
            cost,
            liquidation_fee,
            margin_burned,
            margin_to_fee_recipient,
            mint,
        })
    }

    /// Scan for liquidatable positions at current quotes. Read-only helper
    /// for keepers; prices both sides once and tests every open record.
    pub fn liquidatable_positions(
        &self,
    ) -> Result<Vec<(AccountId, PositionId)>, EngineError> {
        let data = self.feed.latest();
        data.validate(self.params.price_drift_upper_limit)?;
        let bid = self.bid(&data, Decimal::ZERO)?;
        let ask = self.ask(&data, Decimal::ZERO)?;

        let mut out = Vec::new();
        for (&(owner, id), pos) in &self.positions {
            let (side_oi, side_shares) = self.side_aggregates(pos.is_long);
            let price = if pos.is_long { bid } else { ask };
            if pos.liquidatable(
                side_oi,
                side_shares,
                price,
                self.params.cap_payoff,
                self.params.maintenance_margin_fraction,
                self.params.liquidation_fee_rate,
            )? {
                out.push((owner, id));
            }
        }
        Ok(out)
    }
}
