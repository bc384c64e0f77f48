// Token balance book for the in-process chain
// Holds fungible balances and spender allowances; every mutation is checked
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError};
use crate::types::{Address, Amount};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    balances: HashMap<(Address, Address), Amount>,
    allowances: HashMap<(Address, Address, Address), Amount>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, token: Address, owner: Address) -> Amount {
        self.balances.get(&(token, owner)).copied().unwrap_or(0)
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// Credit `amount` out of thin air. Genesis and token contracts only.
    pub fn mint(&mut self, token: Address, to: Address, amount: Amount) -> Result<()> {
        let balance = self.balances.entry((token, to)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(RouterError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn burn(&mut self, token: Address, from: Address, amount: Amount) -> Result<()> {
        self.debit(token, from, amount)
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(token, owner, spender));
        } else {
            self.allowances.insert((token, owner, spender), amount);
        }
    }

    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 || from == to {
            // Still require the sender to hold the amount for self transfers.
            let balance = self.balance_of(token, from);
            if balance < amount {
                return Err(RouterError::InsufficientBalance {
                    token,
                    holder: from,
                    balance,
                    needed: amount,
                });
            }
            return Ok(());
        }
        // Check the credit side first so a failed transfer leaves no trace.
        self.balance_of(token, to)
            .checked_add(amount)
            .ok_or(RouterError::ArithmeticOverflow)?;
        self.debit(token, from, amount)?;
        self.mint(token, to, amount)
    }

    /// Move `amount` from `owner` to `to` on behalf of `spender`, spending its allowance.
    pub fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        let allowance = self.allowance(token, owner, spender);
        if allowance < amount {
            return Err(RouterError::InsufficientAllowance {
                token,
                allowance,
                needed: amount,
            });
        }
        self.transfer(token, owner, to, amount)?;
        if allowance != Amount::MAX {
            self.approve(token, owner, spender, allowance - amount);
        }
        Ok(())
    }

    fn debit(&mut self, token: Address, from: Address, amount: Amount) -> Result<()> {
        let balance = self.balance_of(token, from);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(RouterError::InsufficientBalance {
                token,
                holder: from,
                balance,
                needed: amount,
            })?;
        if remaining == 0 {
            self.balances.remove(&(token, from));
        } else {
            self.balances.insert((token, from), remaining);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: Address = Address::repeat_byte(0xaa);
    const ALICE: Address = Address::repeat_byte(0x01);
    const BOB: Address = Address::repeat_byte(0x02);
    const ROUTER: Address = Address::repeat_byte(0x0f);

    #[test]
    fn transfer_moves_exact_amount() {
        let mut bank = Bank::new();
        bank.mint(TOKEN, ALICE, 100).unwrap();
        bank.transfer(TOKEN, ALICE, BOB, 40).unwrap();
        assert_eq!(bank.balance_of(TOKEN, ALICE), 60);
        assert_eq!(bank.balance_of(TOKEN, BOB), 40);
    }

    #[test]
    fn overdraw_fails_without_side_effects() {
        let mut bank = Bank::new();
        bank.mint(TOKEN, ALICE, 10).unwrap();
        let before = bank.clone();
        let err = bank.transfer(TOKEN, ALICE, BOB, 11).unwrap_err();
        assert!(matches!(err, RouterError::InsufficientBalance { balance: 10, needed: 11, .. }));
        assert_eq!(bank, before);
    }

    #[test]
    fn credit_overflow_is_rejected() {
        let mut bank = Bank::new();
        bank.mint(TOKEN, ALICE, 1).unwrap();
        bank.mint(TOKEN, BOB, Amount::MAX).unwrap();
        assert_eq!(
            bank.transfer(TOKEN, ALICE, BOB, 1).unwrap_err(),
            RouterError::ArithmeticOverflow
        );
        assert_eq!(bank.balance_of(TOKEN, ALICE), 1);
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut bank = Bank::new();
        bank.mint(TOKEN, ALICE, 100).unwrap();
        bank.approve(TOKEN, ALICE, ROUTER, 50);
        bank.transfer_from(TOKEN, ROUTER, ALICE, BOB, 30).unwrap();
        assert_eq!(bank.allowance(TOKEN, ALICE, ROUTER), 20);
        let err = bank.transfer_from(TOKEN, ROUTER, ALICE, BOB, 21).unwrap_err();
        assert!(matches!(err, RouterError::InsufficientAllowance { allowance: 20, .. }));
    }

    #[test]
    fn infinite_allowance_is_not_decremented() {
        let mut bank = Bank::new();
        bank.mint(TOKEN, ALICE, 100).unwrap();
        bank.approve(TOKEN, ALICE, ROUTER, Amount::MAX);
        bank.transfer_from(TOKEN, ROUTER, ALICE, BOB, 100).unwrap();
        assert_eq!(bank.allowance(TOKEN, ALICE, ROUTER), Amount::MAX);
    }
}
