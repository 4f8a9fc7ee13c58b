// 14.0: the factory is the governance surface. it owns the token and every
// deployed market, gates deployment on an approved feed-factory allowlist,
// and is the only path through which risk parameters change.

use crate::engine::{EngineConfig, EngineError, Market};
use crate::feed::PriceFeed;
use crate::params::{ParamError, RiskParamKind, RiskParams};
use crate::token::Token;
use crate::types::{AccountId, FeedFactoryId, MarketId};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("caller {0:?} is not the governor")]
    NotGovernor(AccountId),

    #[error("feed factory {0:?} is not approved")]
    FeedFactoryNotApproved(FeedFactoryId),

    #[error("market {0:?} not found")]
    MarketNotFound(MarketId),

    #[error(transparent)]
    Param(#[from] ParamError),
}

#[derive(Debug)]
pub struct Factory<F: PriceFeed> {
    governor: AccountId,
    fee_recipient: AccountId,
    token: Token,
    markets: HashMap<MarketId, Market<F>>,
    feed_factories: HashSet<FeedFactoryId>,
    next_market_id: u32,
    engine_config: EngineConfig,
}

impl<F: PriceFeed> Factory<F> {
    pub fn new(governor: AccountId, fee_recipient: AccountId) -> Self {
        Self::with_config(governor, fee_recipient, EngineConfig::default())
    }

    pub fn with_config(
        governor: AccountId,
        fee_recipient: AccountId,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            governor,
            fee_recipient,
            token: Token::new(),
            markets: HashMap::new(),
            feed_factories: HashSet::new(),
            next_market_id: 1,
            engine_config,
        }
    }

    pub fn governor(&self) -> AccountId {
        self.governor
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }

    pub fn market(&self, id: MarketId) -> Option<&Market<F>> {
        self.markets.get(&id)
    }

    pub fn market_mut(&mut self, id: MarketId) -> Option<&mut Market<F>> {
        self.markets.get_mut(&id)
    }

    /// Split borrow for trading calls, which need the market and the ledger
    /// at the same time.
    pub fn market_and_token_mut(
        &mut self,
        id: MarketId,
    ) -> Option<(&mut Market<F>, &mut Token)> {
        let token = &mut self.token;
        self.markets.get_mut(&id).map(|market| (market, token))
    }

    pub fn market_ids(&self) -> Vec<MarketId> {
        let mut ids: Vec<_> = self.markets.keys().copied().collect();
        ids.sort();
        ids
    }

    fn require_governor(&self, caller: AccountId) -> Result<(), FactoryError> {
        if caller != self.governor {
            return Err(FactoryError::NotGovernor(caller));
        }
        Ok(())
    }

    // 14.1: feed-factory allowlist

    pub fn approve_feed_factory(
        &mut self,
        caller: AccountId,
        id: FeedFactoryId,
    ) -> Result<(), FactoryError> {
        self.require_governor(caller)?;
        self.feed_factories.insert(id);
        Ok(())
    }

    pub fn revoke_feed_factory(
        &mut self,
        caller: AccountId,
        id: FeedFactoryId,
    ) -> Result<(), FactoryError> {
        self.require_governor(caller)?;
        self.feed_factories.remove(&id);
        Ok(())
    }

    pub fn is_feed_factory_approved(&self, id: FeedFactoryId) -> bool {
        self.feed_factories.contains(&id)
    }

    // 14.2: deployment

    /// Deploy a market on an approved feed. The market gets a reserved ledger
    /// account with mint/burn authority; parameters are validated in full,
    /// including the cross-parameter leverage guard, before anything exists.
    pub fn deploy_market(
        &mut self,
        caller: AccountId,
        feed: F,
        params: RiskParams,
    ) -> Result<MarketId, FactoryError> {
        self.require_governor(caller)?;
        if !self.feed_factories.contains(&feed.factory_id()) {
            return Err(FactoryError::FeedFactoryNotApproved(feed.factory_id()));
        }
        params.validate()?;

        let id = MarketId(self.next_market_id);
        self.next_market_id += 1;

        // reserved account space at the top of the id range, one per market
        let market_account = AccountId(u64::MAX - u64::from(id.0));
        self.token.grant_authority(market_account);

        let market = Market::new(
            id,
            feed,
            params,
            market_account,
            self.fee_recipient,
            self.engine_config.clone(),
        );
        self.markets.insert(id, market);
        Ok(id)
    }

    // 14.3: governance passthroughs

    /// Bounds-check and apply a parameter edit on a deployed market. The
    /// market re-checks the leverage guard itself and rolls back on failure.
    pub fn set_risk_param(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        kind: RiskParamKind,
        value: Decimal,
    ) -> Result<(), FactoryError> {
        self.require_governor(caller)?;
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(FactoryError::MarketNotFound(market_id))?;

        let (min, max) = kind.bounds();
        if value < min || value > max {
            return Err(FactoryError::Param(ParamError::OutOfBounds {
                kind,
                value,
                min,
                max,
            }));
        }
        match market.set_risk_param(kind, value) {
            Ok(()) => Ok(()),
            Err(EngineError::Param(e)) => Err(FactoryError::Param(e)),
            // set_risk_param only fails with a param error
            Err(_) => Err(FactoryError::MarketNotFound(market_id)),
        }
    }

    pub fn shutdown_market(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
    ) -> Result<(), FactoryError> {
        self.require_governor(caller)?;
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(FactoryError::MarketNotFound(market_id))?;
        market.shutdown(caller);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MockFeed;
    use rust_decimal_macros::dec;

    const GOV: AccountId = AccountId(1);
    const FEES: AccountId = AccountId(2);
    const RANDO: AccountId = AccountId(3);

    fn factory_with_feed() -> Factory<MockFeed> {
        let mut f = Factory::new(GOV, FEES);
        f.approve_feed_factory(GOV, FeedFactoryId(1)).unwrap();
        f
    }

    #[test]
    fn only_governor_touches_the_allowlist() {
        let mut f: Factory<MockFeed> = Factory::new(GOV, FEES);
        assert_eq!(
            f.approve_feed_factory(RANDO, FeedFactoryId(1)).unwrap_err(),
            FactoryError::NotGovernor(RANDO)
        );
        f.approve_feed_factory(GOV, FeedFactoryId(1)).unwrap();
        assert!(f.is_feed_factory_approved(FeedFactoryId(1)));
        f.revoke_feed_factory(GOV, FeedFactoryId(1)).unwrap();
        assert!(!f.is_feed_factory_approved(FeedFactoryId(1)));
    }

    #[test]
    fn deploy_requires_approved_feed_factory() {
        let mut f: Factory<MockFeed> = Factory::new(GOV, FEES);
        let err = f
            .deploy_market(GOV, MockFeed::new(dec!(100)), RiskParams::default())
            .unwrap_err();
        assert_eq!(err, FactoryError::FeedFactoryNotApproved(FeedFactoryId(1)));
    }

    #[test]
    fn deploy_rejects_invalid_params() {
        let mut f = factory_with_feed();
        let mut params = RiskParams::default();
        params.cap_leverage = dec!(500);
        assert!(matches!(
            f.deploy_market(GOV, MockFeed::new(dec!(100)), params),
            Err(FactoryError::Param(_))
        ));
    }

    #[test]
    fn deployed_market_gets_authority_and_unique_account() {
        let mut f = factory_with_feed();
        let a = f
            .deploy_market(GOV, MockFeed::new(dec!(100)), RiskParams::default())
            .unwrap();
        let b = f
            .deploy_market(GOV, MockFeed::new(dec!(50)), RiskParams::default())
            .unwrap();
        assert_ne!(a, b);

        let acct_a = f.market(a).unwrap().market_account();
        let acct_b = f.market(b).unwrap().market_account();
        assert_ne!(acct_a, acct_b);
        assert!(f.token().is_authority(acct_a));
        assert!(f.token().is_authority(acct_b));
    }

    #[test]
    fn param_edits_are_bounds_checked_at_the_gate() {
        let mut f = factory_with_feed();
        let id = f
            .deploy_market(GOV, MockFeed::new(dec!(100)), RiskParams::default())
            .unwrap();

        f.set_risk_param(GOV, id, RiskParamKind::TradingFeeRate, dec!(0.001))
            .unwrap();
        assert_eq!(
            f.market(id).unwrap().params().trading_fee_rate,
            dec!(0.001)
        );

        assert!(matches!(
            f.set_risk_param(GOV, id, RiskParamKind::TradingFeeRate, dec!(0.9)),
            Err(FactoryError::Param(ParamError::OutOfBounds { .. }))
        ));
        assert_eq!(
            f.set_risk_param(RANDO, id, RiskParamKind::TradingFeeRate, dec!(0.001))
                .unwrap_err(),
            FactoryError::NotGovernor(RANDO)
        );
    }

    #[test]
    fn leverage_guard_rolls_back_unsafe_edit() {
        let mut f = factory_with_feed();
        let id = f
            .deploy_market(GOV, MockFeed::new(dec!(100)), RiskParams::default())
            .unwrap();
        let mmf_before = f.market(id).unwrap().params().maintenance_margin_fraction;

        // maintenance margin at its upper bound makes 5x leverage unsafe
        let err = f
            .set_risk_param(GOV, id, RiskParamKind::MaintenanceMarginFraction, dec!(0.2))
            .unwrap_err();
        assert_eq!(err, FactoryError::Param(ParamError::MaxLeverageUnsafe));
        assert_eq!(
            f.market(id).unwrap().params().maintenance_margin_fraction,
            mmf_before
        );
    }

    #[test]
    fn shutdown_is_governor_only() {
        let mut f = factory_with_feed();
        let id = f
            .deploy_market(GOV, MockFeed::new(dec!(100)), RiskParams::default())
            .unwrap();
        assert_eq!(
            f.shutdown_market(RANDO, id).unwrap_err(),
            FactoryError::NotGovernor(RANDO)
        );
        f.shutdown_market(GOV, id).unwrap();
        assert!(f.market(id).unwrap().is_shutdown());
    }
}
