// Transfer-authorization ledger
// Tracks how much of the caller's input token may still be pulled during the
// current call, and which tokens the router may push out of its own float.
// Every movement of caller funds or router-held funds goes through here.
//
// Numan Thabit 2025 Nov

use crate::chain::Chain;
use crate::errors::{Result, RouterError};
use crate::router::transient::{SlotKey, TransientStorage, Word};
use crate::types::{Address, Amount, TransferType};
use tracing::debug;

/// A view of the call's authorization state bound to the host chain.
pub struct TransferLedger<'a> {
    transient: &'a mut TransientStorage,
    chain: &'a mut Chain,
    router: Address,
}

impl<'a> TransferLedger<'a> {
    pub fn new(transient: &'a mut TransientStorage, chain: &'a mut Chain, router: Address) -> Self {
        Self {
            transient,
            chain,
            router,
        }
    }

    /// Establish the call's pull allowance. With `pull_allowed == false` the
    /// allowance is zero and every later `TransferFrom` fails.
    pub fn init_authorization(
        &mut self,
        token: Address,
        amount: Amount,
        uses_permit: bool,
        pull_allowed: bool,
        payer: Address,
    ) {
        let allowed = if pull_allowed { amount } else { 0 };
        self.transient.store(SlotKey::AuthToken, Word::Address(token));
        self.transient.store(SlotKey::AuthAmount, Word::Amount(allowed));
        self.transient
            .store(SlotKey::AuthUsesPermit, Word::Flag(uses_permit));
        self.transient.store(SlotKey::AuthPayer, Word::Address(payer));
        debug!(token = %token, allowed, uses_permit, payer = %payer, "transfer authorization set");
    }

    pub fn remaining_allowance(&self) -> Amount {
        self.transient.load_amount(SlotKey::AuthAmount)
    }

    pub fn authorized_token(&self) -> Address {
        self.transient.load_address(SlotKey::AuthToken)
    }

    pub fn is_unlocked(&self, token: Address) -> bool {
        self.transient.load_flag(SlotKey::Unlocked(token))
    }

    /// What the router received in `token` since it was unlocked.
    pub fn float(&self, token: Address) -> Amount {
        if !self.is_unlocked(token) {
            return 0;
        }
        let baseline = self.transient.load_amount(SlotKey::Baseline(token));
        self.chain
            .bank
            .balance_of(token, self.router)
            .saturating_sub(baseline)
    }

    /// Snapshot the router's balance of `token` ahead of a verified inbound
    /// transfer and allow pushes against whatever arrives on top of it.
    pub fn unlock(&mut self, token: Address) -> Result<()> {
        if self.is_unlocked(token) {
            return Err(RouterError::RouterAlreadyUnlocked(token));
        }
        let baseline = self.chain.bank.balance_of(token, self.router);
        self.open(token, baseline);
        debug!(token = %token, baseline, "router unlocked");
        Ok(())
    }

    /// Unlock `token` unless a previous leg already did; further inbound
    /// amounts simply grow the float.
    pub fn expect_inbound(&mut self, token: Address) {
        if !self.is_unlocked(token) {
            let baseline = self.chain.bank.balance_of(token, self.router);
            self.open(token, baseline);
            debug!(token = %token, baseline, "router expecting inbound");
        }
    }

    /// Let `spender` pull up to `amount` of the router's float in `token`.
    pub fn approve_from_float(
        &mut self,
        spender: Address,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        if spender.is_zero() {
            return Err(RouterError::AddressZero);
        }
        if !self.is_unlocked(token) {
            return Err(RouterError::RouterLocked(token));
        }
        let float = self.float(token);
        if float < amount {
            return Err(RouterError::AmountNotTransferredToRouter {
                token,
                available: float,
                requested: amount,
            });
        }
        self.chain.bank.approve(token, self.router, spender, amount);
        debug!(token = %token, spender = %spender, amount, "router approved spender");
        Ok(())
    }

    fn open(&mut self, token: Address, baseline: Amount) {
        self.transient
            .store(SlotKey::Unlocked(token), Word::Flag(true));
        self.transient
            .store(SlotKey::Baseline(token), Word::Amount(baseline));
    }

    fn relock(&mut self, token: Address) {
        self.transient.clear_slot(SlotKey::Unlocked(token));
        self.transient.clear_slot(SlotKey::Baseline(token));
        debug!(token = %token, "router relocked");
    }

    pub fn execute_transfer(
        &mut self,
        receiver: Address,
        transfer_type: TransferType,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        if let Some(declared) = self.transient.load_transfer_type(SlotKey::LegTransferType) {
            if declared != transfer_type {
                return Err(RouterError::TransferTypeMismatch {
                    declared,
                    requested: transfer_type,
                });
            }
        }
        match transfer_type {
            TransferType::TransferFrom => self.pull(receiver, token, amount),
            TransferType::Transfer => self.push(receiver, token, amount),
            TransferType::None => Ok(()),
        }
    }

    fn pull(&mut self, receiver: Address, token: Address, amount: Amount) -> Result<()> {
        if receiver.is_zero() {
            return Err(RouterError::AddressZero);
        }
        let allowed = self.remaining_allowance();
        if amount > allowed {
            return Err(RouterError::ExceededTransferFromAllowance {
                allowed,
                attempted: amount,
            });
        }
        let authorized = self.authorized_token();
        if token != authorized {
            return Err(RouterError::DifferentTokenIn {
                token_in: token,
                authorized,
            });
        }
        let into_router = receiver == self.router;
        if into_router && self.is_unlocked(token) {
            return Err(RouterError::RouterAlreadyUnlocked(token));
        }
        let baseline = self.chain.bank.balance_of(token, self.router);

        // nothing below is committed until the funds have moved
        let payer = self.transient.load_address(SlotKey::AuthPayer);
        if self.transient.load_flag(SlotKey::AuthUsesPermit) {
            let block = self.chain.block_number();
            self.chain
                .permits
                .check_spend(payer, self.router, token, amount, block)?;
            self.chain.bank.transfer(token, payer, receiver, amount)?;
            self.chain
                .permits
                .spend(payer, self.router, token, amount, block)?;
        } else {
            self.chain
                .bank
                .transfer_from(token, self.router, payer, receiver, amount)?;
        }
        self.transient
            .store(SlotKey::AuthAmount, Word::Amount(allowed - amount));
        if into_router {
            self.open(token, baseline);
        }
        debug!(
            token = %token,
            payer = %payer,
            receiver = %receiver,
            amount,
            remaining = allowed - amount,
            "pulled from payer"
        );
        Ok(())
    }

    fn push(&mut self, receiver: Address, token: Address, amount: Amount) -> Result<()> {
        if receiver.is_zero() {
            return Err(RouterError::AddressZero);
        }
        if !self.is_unlocked(token) {
            return Err(RouterError::RouterLocked(token));
        }
        let float = self.float(token);
        if float < amount {
            return Err(RouterError::AmountNotTransferredToRouter {
                token,
                available: float,
                requested: amount,
            });
        }
        self.chain.bank.transfer(token, self.router, receiver, amount)?;
        debug!(token = %token, receiver = %receiver, amount, float, "pushed from router");
        if float == amount {
            self.relock(token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::permit::{address_from_secret, sign_permit, PermitDetails, PermitSingle};
    use proptest::prelude::*;

    const ROUTER: Address = Address::repeat_byte(0x0f);
    const USER: Address = Address::repeat_byte(0x01);
    const POOL: Address = Address::repeat_byte(0x50);
    const TOKEN_A: Address = Address::repeat_byte(0xaa);
    const TOKEN_B: Address = Address::repeat_byte(0xbb);

    fn funded_chain(balance: Amount) -> Chain {
        let mut chain = Chain::new(10);
        chain.bank.mint(TOKEN_A, USER, balance).unwrap();
        chain.bank.approve(TOKEN_A, USER, ROUTER, Amount::MAX);
        chain
    }

    #[test]
    fn pull_is_capped_and_decrements() {
        let mut chain = funded_chain(1_000);
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 100, false, true, USER);

        ledger
            .execute_transfer(POOL, TransferType::TransferFrom, TOKEN_A, 60)
            .unwrap();
        assert_eq!(ledger.remaining_allowance(), 40);
        assert_eq!(
            ledger.execute_transfer(POOL, TransferType::TransferFrom, TOKEN_A, 41),
            Err(RouterError::ExceededTransferFromAllowance {
                allowed: 40,
                attempted: 41
            })
        );
        assert_eq!(chain.bank.balance_of(TOKEN_A, POOL), 60);
    }

    #[test]
    fn pull_of_other_token_is_rejected() {
        let mut chain = funded_chain(1_000);
        chain.bank.mint(TOKEN_B, USER, 1_000).unwrap();
        chain.bank.approve(TOKEN_B, USER, ROUTER, Amount::MAX);
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 100, false, true, USER);

        assert_eq!(
            ledger.execute_transfer(POOL, TransferType::TransferFrom, TOKEN_B, 10),
            Err(RouterError::DifferentTokenIn {
                token_in: TOKEN_B,
                authorized: TOKEN_A
            })
        );
        assert_eq!(chain.bank.balance_of(TOKEN_B, POOL), 0);
    }

    #[test]
    fn disallowed_pull_means_zero_allowance() {
        let mut chain = funded_chain(1_000);
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 100, false, false, USER);
        assert_eq!(
            ledger.execute_transfer(POOL, TransferType::TransferFrom, TOKEN_A, 1),
            Err(RouterError::ExceededTransferFromAllowance {
                allowed: 0,
                attempted: 1
            })
        );
    }

    #[test]
    fn push_requires_unlock() {
        let mut chain = funded_chain(0);
        chain.bank.mint(TOKEN_A, ROUTER, 500).unwrap();
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        // the router holds 500 but none of it arrived during this call
        assert_eq!(
            ledger.execute_transfer(POOL, TransferType::Transfer, TOKEN_A, 1),
            Err(RouterError::RouterLocked(TOKEN_A))
        );
    }

    #[test]
    fn pull_into_router_unlocks_then_split_pushes_relock() {
        let mut chain = funded_chain(1_000);
        chain.bank.mint(TOKEN_A, ROUTER, 7).unwrap(); // pre-existing dust
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 100, false, true, USER);

        ledger
            .execute_transfer(ROUTER, TransferType::TransferFrom, TOKEN_A, 100)
            .unwrap();
        assert!(ledger.is_unlocked(TOKEN_A));
        assert_eq!(ledger.float(TOKEN_A), 100);

        ledger
            .execute_transfer(POOL, TransferType::Transfer, TOKEN_A, 60)
            .unwrap();
        assert!(ledger.is_unlocked(TOKEN_A));
        let err = ledger
            .execute_transfer(POOL, TransferType::Transfer, TOKEN_A, 41)
            .unwrap_err();
        assert_eq!(
            err,
            RouterError::AmountNotTransferredToRouter {
                token: TOKEN_A,
                available: 40,
                requested: 41
            }
        );
        ledger
            .execute_transfer(POOL, TransferType::Transfer, TOKEN_A, 40)
            .unwrap();
        assert!(!ledger.is_unlocked(TOKEN_A));
        // dust stays put
        assert_eq!(chain.bank.balance_of(TOKEN_A, ROUTER), 7);
    }

    #[test]
    fn double_unlock_is_an_accounting_bug() {
        let mut chain = funded_chain(1_000);
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 100, false, true, USER);
        ledger
            .execute_transfer(ROUTER, TransferType::TransferFrom, TOKEN_A, 50)
            .unwrap();
        assert_eq!(
            ledger.execute_transfer(ROUTER, TransferType::TransferFrom, TOKEN_A, 50),
            Err(RouterError::RouterAlreadyUnlocked(TOKEN_A))
        );
    }

    #[test]
    fn failed_pull_keeps_allowance_and_lock() {
        let mut chain = funded_chain(1_000);
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 2_000, false, true, USER);

        assert!(matches!(
            ledger.execute_transfer(ROUTER, TransferType::TransferFrom, TOKEN_A, 2_000),
            Err(RouterError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.remaining_allowance(), 2_000);
        assert!(!ledger.is_unlocked(TOKEN_A));

        ledger
            .execute_transfer(ROUTER, TransferType::TransferFrom, TOKEN_A, 1_000)
            .unwrap();
        assert_eq!(ledger.remaining_allowance(), 1_000);
        assert_eq!(ledger.float(TOKEN_A), 1_000);
    }

    #[test]
    fn failed_permit_pull_keeps_permit_allowance() {
        const SECRET: &str = "0707070707070707070707070707070707070707070707070707070707070707";
        let owner = address_from_secret(SECRET).unwrap();
        let p = PermitSingle {
            details: PermitDetails {
                token: TOKEN_A,
                amount: 500,
                expiration: 0,
                nonce: 0,
            },
            spender: ROUTER,
            sig_deadline: 10,
        };
        let mut chain = Chain::new(10);
        chain.bank.mint(TOKEN_A, owner, 100).unwrap();
        let sig = sign_permit(&p, SECRET).unwrap();
        chain.permits.permit(owner, &p, &sig, 10).unwrap();

        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 500, true, true, owner);
        assert!(matches!(
            ledger.execute_transfer(POOL, TransferType::TransferFrom, TOKEN_A, 500),
            Err(RouterError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.remaining_allowance(), 500);

        ledger
            .execute_transfer(POOL, TransferType::TransferFrom, TOKEN_A, 100)
            .unwrap();
        assert_eq!(ledger.remaining_allowance(), 400);
        assert_eq!(chain.permits.allowance(owner, TOKEN_A, ROUTER).amount, 400);
        assert_eq!(chain.bank.balance_of(TOKEN_A, POOL), 100);
    }

    #[test]
    fn expect_inbound_accumulates_float() {
        let mut chain = funded_chain(0);
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.expect_inbound(TOKEN_B);
        ledger.chain.bank.mint(TOKEN_B, ROUTER, 30).unwrap();
        ledger.expect_inbound(TOKEN_B);
        ledger.chain.bank.mint(TOKEN_B, ROUTER, 12).unwrap();
        assert_eq!(ledger.float(TOKEN_B), 42);
    }

    #[test]
    fn declared_leg_type_is_enforced() {
        let mut chain = funded_chain(1_000);
        let mut transient = TransientStorage::default();
        transient.store(
            SlotKey::LegTransferType,
            Word::Transfer(TransferType::Transfer),
        );
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger.init_authorization(TOKEN_A, 100, false, true, USER);
        assert_eq!(
            ledger.execute_transfer(POOL, TransferType::TransferFrom, TOKEN_A, 1),
            Err(RouterError::TransferTypeMismatch {
                declared: TransferType::Transfer,
                requested: TransferType::TransferFrom
            })
        );
    }

    #[test]
    fn approval_is_bounded_by_float() {
        let mut chain = funded_chain(0);
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        assert_eq!(
            ledger.approve_from_float(POOL, TOKEN_B, 1),
            Err(RouterError::RouterLocked(TOKEN_B))
        );
        ledger.expect_inbound(TOKEN_B);
        ledger.chain.bank.mint(TOKEN_B, ROUTER, 20).unwrap();
        assert!(ledger.approve_from_float(POOL, TOKEN_B, 21).is_err());
        ledger.approve_from_float(POOL, TOKEN_B, 20).unwrap();
        assert_eq!(chain.bank.allowance(TOKEN_B, ROUTER, POOL), 20);
    }

    #[test]
    fn none_moves_nothing() {
        let mut chain = funded_chain(1_000);
        let before = chain.bank.clone();
        let mut transient = TransientStorage::default();
        let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
        ledger
            .execute_transfer(POOL, TransferType::None, TOKEN_A, 1_000_000)
            .unwrap();
        assert_eq!(chain.bank, before);
    }

    proptest! {
        #[test]
        fn pulls_never_exceed_allowance(
            allowed in 1u128..1_000_000,
            pulls in proptest::collection::vec(1u128..200_000, 1..12),
        ) {
            let mut chain = funded_chain(10_000_000);
            let mut transient = TransientStorage::default();
            let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
            ledger.init_authorization(TOKEN_A, allowed, false, true, USER);

            let mut pulled = 0u128;
            for amount in pulls {
                let remaining = ledger.remaining_allowance();
                let result = ledger.execute_transfer(POOL, TransferType::TransferFrom, TOKEN_A, amount);
                if amount <= remaining {
                    prop_assert!(result.is_ok());
                    pulled += amount;
                    prop_assert_eq!(ledger.remaining_allowance(), remaining - amount);
                } else {
                    prop_assert_eq!(
                        result,
                        Err(RouterError::ExceededTransferFromAllowance { allowed: remaining, attempted: amount })
                    );
                    prop_assert_eq!(ledger.remaining_allowance(), remaining);
                }
            }
            prop_assert!(pulled <= allowed);
            prop_assert_eq!(chain.bank.balance_of(TOKEN_A, POOL), pulled);
        }

        #[test]
        fn pushes_never_exceed_deposit(
            deposit in 1u128..1_000_000,
            pushes in proptest::collection::vec(1u128..400_000, 1..12),
        ) {
            let mut chain = funded_chain(10_000_000);
            let mut transient = TransientStorage::default();
            let mut ledger = TransferLedger::new(&mut transient, &mut chain, ROUTER);
            ledger.init_authorization(TOKEN_A, deposit, false, true, USER);
            ledger.execute_transfer(ROUTER, TransferType::TransferFrom, TOKEN_A, deposit).unwrap();

            let mut pushed = 0u128;
            for amount in pushes {
                let before = ledger.chain.bank.balance_of(TOKEN_A, POOL);
                match ledger.execute_transfer(POOL, TransferType::Transfer, TOKEN_A, amount) {
                    Ok(()) => pushed += amount,
                    Err(_) => prop_assert_eq!(ledger.chain.bank.balance_of(TOKEN_A, POOL), before),
                }
            }
            prop_assert!(pushed <= deposit);
            prop_assert_eq!(chain.bank.balance_of(TOKEN_A, POOL), pushed);
        }
    }
}
