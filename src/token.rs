// 7.0: the fungible settlement ledger. the engine's only monetary primitives
// are mint, burn, and transfer; mint/burn are restricted to registered market
// authorities so supply can only move through position pnl.

use crate::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("account {0:?} has insufficient balance: needed {1}, have {2}")]
    InsufficientBalance(AccountId, Decimal, Decimal),

    #[error("account {0:?} is not a market authority")]
    NotAuthorized(AccountId),

    #[error("amount must be non-negative")]
    NegativeAmount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Token {
    balances: HashMap<AccountId, Decimal>,
    total_supply: Decimal,
    /// Accounts allowed to mint and burn (markets, registered by the factory).
    authorities: HashSet<AccountId>,
}

impl Token {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: AccountId) -> Decimal {
        self.balances.get(&account).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn total_supply(&self) -> Decimal {
        self.total_supply
    }

    pub fn grant_authority(&mut self, account: AccountId) {
        self.authorities.insert(account);
    }

    pub fn revoke_authority(&mut self, account: AccountId) {
        self.authorities.remove(&account);
    }

    pub fn is_authority(&self, account: AccountId) -> bool {
        self.authorities.contains(&account)
    }

    /// Seed balance outside the mint-authority path. Test and simulation
    /// setup only; production supply enters through market pnl.
    pub fn credit(&mut self, account: AccountId, amount: Decimal) {
        *self.balances.entry(account).or_insert(Decimal::ZERO) += amount;
        self.total_supply += amount;
    }

    pub fn mint(&mut self, authority: AccountId, amount: Decimal) -> Result<(), TokenError> {
        if amount < Decimal::ZERO {
            return Err(TokenError::NegativeAmount);
        }
        if !self.authorities.contains(&authority) {
            return Err(TokenError::NotAuthorized(authority));
        }
        *self.balances.entry(authority).or_insert(Decimal::ZERO) += amount;
        self.total_supply += amount;
        Ok(())
    }

    /// Burn from the authority's own balance.
    pub fn burn(&mut self, authority: AccountId, amount: Decimal) -> Result<(), TokenError> {
        if amount < Decimal::ZERO {
            return Err(TokenError::NegativeAmount);
        }
        if !self.authorities.contains(&authority) {
            return Err(TokenError::NotAuthorized(authority));
        }
        self.debit(authority, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<(), TokenError> {
        if amount < Decimal::ZERO {
            return Err(TokenError::NegativeAmount);
        }
        self.debit(from, amount)?;
        *self.balances.entry(to).or_insert(Decimal::ZERO) += amount;
        Ok(())
    }

    fn debit(&mut self, from: AccountId, amount: Decimal) -> Result<(), TokenError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance(from, amount, balance));
        }
        self.balances.insert(from, balance - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MARKET: AccountId = AccountId(1);
    const ALICE: AccountId = AccountId(10);
    const BOB: AccountId = AccountId(11);

    #[test]
    fn transfer_moves_balance() {
        let mut token = Token::new();
        token.credit(ALICE, dec!(100));
        token.transfer(ALICE, BOB, dec!(30)).unwrap();
        assert_eq!(token.balance_of(ALICE), dec!(70));
        assert_eq!(token.balance_of(BOB), dec!(30));
        assert_eq!(token.total_supply(), dec!(100));
    }

    #[test]
    fn transfer_fails_on_shortfall() {
        let mut token = Token::new();
        token.credit(ALICE, dec!(10));
        let err = token.transfer(ALICE, BOB, dec!(11));
        assert!(matches!(err, Err(TokenError::InsufficientBalance(..))));
        // nothing moved
        assert_eq!(token.balance_of(ALICE), dec!(10));
        assert_eq!(token.balance_of(BOB), Decimal::ZERO);
    }

    #[test]
    fn mint_and_burn_require_authority() {
        let mut token = Token::new();
        assert!(matches!(
            token.mint(MARKET, dec!(5)),
            Err(TokenError::NotAuthorized(_))
        ));

        token.grant_authority(MARKET);
        token.mint(MARKET, dec!(5)).unwrap();
        assert_eq!(token.total_supply(), dec!(5));

        token.burn(MARKET, dec!(2)).unwrap();
        assert_eq!(token.total_supply(), dec!(3));
        assert_eq!(token.balance_of(MARKET), dec!(3));
    }

    #[test]
    fn burn_cannot_exceed_authority_balance() {
        let mut token = Token::new();
        token.grant_authority(MARKET);
        token.mint(MARKET, dec!(1)).unwrap();
        assert!(token.burn(MARKET, dec!(2)).is_err());
    }
}
