// Dispatch and callback engine
// Runs one swap step on an approved executor with the router's identity, and
// routes venue callbacks back to whichever executor is currently in flight
//
// Numan Thabit 2025 Nov

use crate::chain::Chain;
use crate::errors::{Result, RouterError};
use crate::metrics::{DISPATCH_ERRORS, DISPATCH_LATENCY};
use crate::router::ledger::TransferLedger;
use crate::router::router::{CallEnv, Router, SwapGraph, SwapParams};
use crate::router::transient::{SlotKey, Word};
use crate::types::{Address, Amount, TransferType};
use tracing::{debug, warn};

/// What an executor sees while it runs: the router's transfer rules, read
/// access to balances, and a way to call external contracts.
pub struct ExecutionContext<'a> {
    router: &'a mut Router,
    chain: &'a mut Chain,
    caller: Address,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(router: &'a mut Router, chain: &'a mut Chain, caller: Address) -> Self {
        Self {
            router,
            chain,
            caller,
        }
    }

    pub fn router_address(&self) -> Address {
        self.router.address()
    }

    /// Account that entered the router for this frame.
    pub fn caller(&self) -> Address {
        self.caller
    }

    pub fn block_number(&self) -> u64 {
        self.chain.block_number()
    }

    pub fn balance_of(&self, token: Address, owner: Address) -> Amount {
        self.chain.bank.balance_of(token, owner)
    }

    fn ledger(&mut self) -> TransferLedger<'_> {
        let router = self.router.address();
        TransferLedger::new(&mut self.router.transient, self.chain, router)
    }

    /// Move funds under the router's authorization rules.
    pub fn transfer(
        &mut self,
        receiver: Address,
        transfer_type: TransferType,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        self.ledger()
            .execute_transfer(receiver, transfer_type, token, amount)
    }

    /// Announce that `token` is about to be paid into the router.
    pub fn expect_inbound(&mut self, token: Address) {
        self.ledger().expect_inbound(token);
    }

    /// Run `f` as the contract at `target`.
    pub fn call_external<R>(
        &mut self,
        target: Address,
        f: impl FnOnce(&mut ExternalFrame<'_>) -> Result<R>,
    ) -> Result<R> {
        if !self.chain.has_code(target) {
            return Err(RouterError::revert(format!("call to non-contract {target}")));
        }
        let mut frame = ExternalFrame {
            address: target,
            router: &mut *self.router,
            chain: &mut *self.chain,
        };
        f(&mut frame)
    }
}

/// A call the router accepts from an external contract mid-swap.
#[derive(Debug, Clone)]
pub enum InboundCall {
    Fallback(Vec<u8>),
    UnlockCallback(Vec<u8>),
    Swap(SwapParams, SwapGraph),
}

/// Execution frame of an external contract called by an executor.
pub struct ExternalFrame<'a> {
    address: Address,
    router: &'a mut Router,
    chain: &'a mut Chain,
}

impl ExternalFrame<'_> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn router_address(&self) -> Address {
        self.router.address()
    }

    pub fn balance_of(&self, token: Address, owner: Address) -> Amount {
        self.chain.bank.balance_of(token, owner)
    }

    /// Move this contract's own funds.
    pub fn transfer(&mut self, token: Address, to: Address, amount: Amount) -> Result<()> {
        self.chain.bank.transfer(token, self.address, to, amount)
    }

    /// Spend an allowance another account granted this contract.
    pub fn transfer_from(
        &mut self,
        token: Address,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.chain
            .bank
            .transfer_from(token, self.address, owner, to, amount)
    }

    /// Call into the router as this contract.
    pub fn call_router(&mut self, call: InboundCall) -> Result<Vec<u8>> {
        match call {
            InboundCall::Fallback(data) => self.router.fallback(self.chain, self.address, &data),
            InboundCall::UnlockCallback(data) => {
                self.router.unlock_callback(self.chain, self.address, &data)
            }
            InboundCall::Swap(params, graph) => {
                let env = CallEnv {
                    caller: self.address,
                    value: 0,
                };
                self.router
                    .swap(self.chain, env, &params, &graph)
                    .map(|out| out.to_be_bytes().to_vec())
            }
        }
    }
}

/// Run one swap step on `executor`. The in-flight marker is set for the
/// duration of the call and cleared however it ends.
pub(crate) fn dispatch_swap(
    router: &mut Router,
    chain: &mut Chain,
    caller: Address,
    executor: Address,
    amount_in: Amount,
    data: &[u8],
) -> Result<Amount> {
    router
        .registry
        .ensure_active(executor, chain.block_number())?;
    let module = chain
        .executor_at(executor)
        .ok_or(RouterError::NonContractExecutor(executor))?;

    router
        .transient
        .store(SlotKey::InFlightExecutor, Word::Address(executor));
    debug!(executor = %executor, venue = module.name(), amount_in, "dispatching swap");

    let timer = DISPATCH_LATENCY.with_label_values(&["swap"]).start_timer();
    let result = {
        let mut ctx = ExecutionContext::new(router, chain, caller);
        module.swap(&mut ctx, amount_in, data)
    };
    timer.observe_duration();
    router.transient.clear_slot(SlotKey::InFlightExecutor);

    result.map_err(|err| {
        let err = match err {
            RouterError::Revert(None) => RouterError::ExecutionFailed,
            other => other,
        };
        DISPATCH_ERRORS.with_label_values(&["swap"]).inc();
        warn!(executor = %executor, venue = module.name(), error = %err, "executor swap failed");
        err
    })
}

/// Let the in-flight executor settle a venue callback. Succeeds at most once
/// per dispatch.
pub(crate) fn handle_callback(
    router: &mut Router,
    chain: &mut Chain,
    caller: Address,
    data: &[u8],
) -> Result<Vec<u8>> {
    let executor = router.transient.load_address(SlotKey::InFlightExecutor);
    if !router.registry.is_active(executor, chain.block_number()) {
        return Err(RouterError::UnapprovedExecutor(executor));
    }
    let module = chain
        .executor_at(executor)
        .ok_or(RouterError::UnapprovedExecutor(executor))?;

    // a failed callback must not leave its settlement behind
    let snapshot = chain.snapshot();
    let scratch = router.transient.clone();
    let timer = DISPATCH_LATENCY
        .with_label_values(&["callback"])
        .start_timer();
    let result = settle_callback(router, chain, caller, module.as_ref(), data);
    timer.observe_duration();

    match result {
        Ok(out) => {
            router.transient.clear_slot(SlotKey::InFlightExecutor);
            debug!(executor = %executor, caller = %caller, "callback settled");
            Ok(out)
        }
        Err(err) => {
            chain.restore(snapshot);
            router.transient = scratch;
            let err = match err {
                RouterError::Revert(None) => RouterError::CallbackFailed,
                other => other,
            };
            DISPATCH_ERRORS.with_label_values(&["callback"]).inc();
            warn!(executor = %executor, caller = %caller, error = %err, "callback failed");
            Err(err)
        }
    }
}

fn settle_callback(
    router: &mut Router,
    chain: &mut Chain,
    caller: Address,
    module: &dyn crate::venues::adapter::Executor,
    data: &[u8],
) -> Result<Vec<u8>> {
    if let Some(payment) = module.callback_transfer_data(data)? {
        let address = router.address();
        let mut ledger = TransferLedger::new(&mut router.transient, chain, address);
        if payment.approval_needed {
            ledger.approve_from_float(payment.receiver, payment.token, payment.amount)?;
        }
        ledger.execute_transfer(
            payment.receiver,
            payment.transfer_type,
            payment.token,
            payment.amount,
        )?;
    }
    let mut ctx = ExecutionContext::new(router, chain, caller);
    module.handle_callback(&mut ctx, data)
}
