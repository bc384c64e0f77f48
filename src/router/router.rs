// Router orchestrator
// Top-level swap entry points, venue callback entry points and the
// role-gated administration surface. Every swap is all-or-nothing: a failure
// anywhere restores balances and drops the call's events
//
// Numan Thabit 2025 Nov

use crate::chain::{Chain, PermitSingle};
use crate::errors::{Result, RouterError};
use crate::metrics::SWAPS_TOTAL;
use crate::router::access::{AccessControl, Role};
use crate::router::dispatch::{dispatch_swap, handle_callback};
use crate::router::encoding::{
    validate_split_plan, SequentialSwaps, SplitSwaps, SwapStep, SPLIT_DENOMINATOR,
};
use crate::router::events::{EventLog, RouterEvent};
use crate::router::ledger::TransferLedger;
use crate::router::registry::ExecutorRegistry;
use crate::router::transient::{CallScope, HasTransient, SlotKey, TransientStorage, Word};
use crate::types::{de_amount, hex_bytes, Address, Amount, ADDRESS_LEN, NATIVE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Caller identity and attached native value of a top-level call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEnv {
    pub caller: Address,
    pub value: Amount,
}

impl CallEnv {
    pub fn new(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Parameters shared by every swap entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    #[serde(deserialize_with = "de_amount")]
    pub amount_in: Amount,
    /// `NATIVE` for the native asset.
    pub token_in: Address,
    pub token_out: Address,
    #[serde(deserialize_with = "de_amount")]
    pub min_amount_out: Amount,
    #[serde(default)]
    pub wrap: bool,
    #[serde(default)]
    pub unwrap: bool,
    pub receiver: Address,
}

/// An encoded swap graph together with its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SwapGraph {
    Single {
        #[serde(with = "hex_bytes")]
        swaps: Vec<u8>,
    },
    Sequential {
        #[serde(with = "hex_bytes")]
        swaps: Vec<u8>,
    },
    Split {
        n_tokens: u8,
        #[serde(with = "hex_bytes")]
        swaps: Vec<u8>,
    },
}

impl SwapGraph {
    pub fn variant(&self) -> &'static str {
        match self {
            SwapGraph::Single { .. } => "single",
            SwapGraph::Sequential { .. } => "sequential",
            SwapGraph::Split { .. } => "split",
        }
    }
}

/// Signed pre-authorization consumed on entry.
#[derive(Debug, Clone, Copy)]
pub struct Permit2<'a> {
    pub permit: &'a PermitSingle,
    pub signature: &'a [u8],
}

#[derive(Debug)]
pub struct Router {
    address: Address,
    wrapped_native: Address,
    default_activation_delay: u64,
    pub(crate) registry: ExecutorRegistry,
    pub(crate) access: AccessControl,
    pub(crate) transient: TransientStorage,
    events: EventLog,
}

impl HasTransient for Router {
    fn transient_mut(&mut self) -> &mut TransientStorage {
        &mut self.transient
    }
}

impl Router {
    pub fn new(address: Address, wrapped_native: Address, admin: Address) -> Result<Self> {
        if address.is_zero() || wrapped_native.is_zero() {
            return Err(RouterError::AddressZero);
        }
        Ok(Self {
            address,
            wrapped_native,
            default_activation_delay: 0,
            registry: ExecutorRegistry::default(),
            access: AccessControl::new(admin)?,
            transient: TransientStorage::default(),
            events: EventLog::default(),
        })
    }

    /// Blocks a newly set executor waits before it can be dispatched to,
    /// unless `set_executors` is given an explicit delay.
    pub fn with_activation_delay(mut self, blocks: u64) -> Self {
        self.default_activation_delay = blocks;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    // -----------------------------------------------------------------------
    // Swap entry points
    // -----------------------------------------------------------------------

    pub fn single_swap(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        swaps: &[u8],
    ) -> Result<Amount> {
        self.run(chain, env, params, None, Graph::Single(swaps))
    }

    pub fn single_swap_permit2(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        permit: Permit2<'_>,
        swaps: &[u8],
    ) -> Result<Amount> {
        self.run(chain, env, params, Some(permit), Graph::Single(swaps))
    }

    pub fn sequential_swap(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        swaps: &[u8],
    ) -> Result<Amount> {
        self.run(chain, env, params, None, Graph::Sequential(swaps))
    }

    pub fn sequential_swap_permit2(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        permit: Permit2<'_>,
        swaps: &[u8],
    ) -> Result<Amount> {
        self.run(chain, env, params, Some(permit), Graph::Sequential(swaps))
    }

    pub fn split_swap(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        n_tokens: u8,
        swaps: &[u8],
    ) -> Result<Amount> {
        self.run(chain, env, params, None, Graph::Split(n_tokens, swaps))
    }

    pub fn split_swap_permit2(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        permit: Permit2<'_>,
        n_tokens: u8,
        swaps: &[u8],
    ) -> Result<Amount> {
        self.run(chain, env, params, Some(permit), Graph::Split(n_tokens, swaps))
    }

    /// Route to the entry point matching `graph`'s shape.
    pub fn swap(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        graph: &SwapGraph,
    ) -> Result<Amount> {
        self.run(chain, env, params, None, Graph::from(graph))
    }

    pub fn swap_permit2(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        permit: Permit2<'_>,
        graph: &SwapGraph,
    ) -> Result<Amount> {
        self.run(chain, env, params, Some(permit), Graph::from(graph))
    }

    #[tracing::instrument(skip_all, fields(variant = graph.variant(), caller = %env.caller))]
    fn run(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        permit: Option<Permit2<'_>>,
        graph: Graph<'_>,
    ) -> Result<Amount> {
        let variant = graph.variant();
        let snapshot = chain.snapshot();
        let events_before = self.events.len();

        let result = self.execute(chain, env, params, permit, graph);
        match &result {
            Ok(amount_out) => {
                SWAPS_TOTAL.with_label_values(&[variant, "ok"]).inc();
                info!(
                    amount_in = params.amount_in,
                    amount_out = *amount_out,
                    "swap settled"
                );
            }
            Err(err) => {
                chain.restore(snapshot);
                self.events.truncate(events_before);
                SWAPS_TOTAL.with_label_values(&[variant, err.label()]).inc();
                warn!(error = %err, "swap reverted");
            }
        }
        result
    }

    fn execute(
        &mut self,
        chain: &mut Chain,
        env: CallEnv,
        params: &SwapParams,
        permit: Option<Permit2<'_>>,
        graph: Graph<'_>,
    ) -> Result<Amount> {
        let mut scope = CallScope::enter(self)?;
        let router: &mut Router = &mut scope;

        if router.access.is_paused() {
            return Err(RouterError::Paused);
        }
        validate_params(env, params)?;

        let address = router.address;
        let wrapped = router.wrapped_native;
        let uses_permit = permit.is_some();
        if let Some(p) = permit {
            if p.permit.details.token != params.token_in {
                return Err(RouterError::DifferentTokenIn {
                    token_in: p.permit.details.token,
                    authorized: params.token_in,
                });
            }
            let block = chain.block_number();
            chain
                .permits
                .permit(env.caller, p.permit, p.signature, block)?;
        }

        let token_in = if params.wrap { wrapped } else { params.token_in };
        let token_out = if params.unwrap { wrapped } else { params.token_out };
        let pull_allowed = !params.wrap && params.token_in != NATIVE;
        {
            let mut ledger = TransferLedger::new(&mut router.transient, chain, address);
            ledger.init_authorization(token_in, params.amount_in, uses_permit, pull_allowed, env.caller);
            if env.value > 0 {
                ledger.unlock(NATIVE)?;
            }
        }
        if env.value > 0 {
            chain
                .bank
                .transfer(NATIVE, env.caller, address, env.value)?;
        }
        if params.wrap {
            TransferLedger::new(&mut router.transient, chain, address).unlock(wrapped)?;
            chain.wrap_native(wrapped, address, params.amount_in)?;
        }

        let balance_before = chain.bank.balance_of(params.token_out, params.receiver);

        let amount_out = match graph {
            Graph::Single(swaps) => single(router, chain, env.caller, params.amount_in, swaps)?,
            Graph::Sequential(swaps) => {
                sequential(router, chain, env.caller, params.amount_in, swaps)?
            }
            Graph::Split(n_tokens, swaps) => {
                split(router, chain, env.caller, params.amount_in, n_tokens, swaps)?
            }
        };

        if amount_out < params.min_amount_out {
            return Err(RouterError::NegativeSlippage {
                amount: amount_out,
                min_amount: params.min_amount_out,
            });
        }

        if params.unwrap {
            chain.unwrap_native(wrapped, address, amount_out)?;
            chain
                .bank
                .transfer(NATIVE, address, params.receiver, amount_out)?;
        }

        if token_in != token_out {
            let received = chain
                .bank
                .balance_of(params.token_out, params.receiver)
                .saturating_sub(balance_before);
            if received != amount_out {
                return Err(RouterError::AmountOutNotFullyReceived {
                    expected: amount_out,
                    received,
                });
            }
        }

        router.events.emit(RouterEvent::Swapped {
            sender: env.caller,
            receiver: params.receiver,
            token_in: params.token_in,
            token_out: params.token_out,
            amount_in: params.amount_in,
            amount_out,
        });
        Ok(amount_out)
    }

    // -----------------------------------------------------------------------
    // Callback entry points
    // -----------------------------------------------------------------------

    /// Default handler venues call back into mid-swap.
    pub fn fallback(&mut self, chain: &mut Chain, caller: Address, data: &[u8]) -> Result<Vec<u8>> {
        handle_callback(self, chain, caller, data)
    }

    /// Unlock-then-callback handshake used by pool-manager style venues. The
    /// payload starts with the executor-specific 20-byte header.
    pub fn unlock_callback(
        &mut self,
        chain: &mut Chain,
        caller: Address,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        if data.len() < ADDRESS_LEN {
            return Err(RouterError::InvalidDataLength);
        }
        handle_callback(self, chain, caller, data)
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Approve a batch of executors. Either all of them are set or none.
    pub fn set_executors(
        &mut self,
        chain: &Chain,
        sender: Address,
        executors: &[Address],
        delay: Option<u64>,
    ) -> Result<()> {
        self.access.check(Role::ExecutorSetter, sender).or_else(|_| {
            self.access.check(Role::Admin, sender)
        })?;
        let delay = delay.unwrap_or(self.default_activation_delay);
        let mut registry = self.registry.clone();
        let mut events = Vec::with_capacity(executors.len());
        for &executor in executors {
            let record = registry.set(chain, executor, Some(delay))?;
            events.push(RouterEvent::ExecutorSet {
                executor,
                activation_block: record.activation_block,
            });
        }
        self.registry = registry;
        for event in events {
            self.events.emit(event);
        }
        Ok(())
    }

    pub fn remove_executor(&mut self, sender: Address, executor: Address) -> Result<()> {
        self.access.check(Role::ExecutorSetter, sender).or_else(|_| {
            self.access.check(Role::Admin, sender)
        })?;
        if self.registry.remove(executor)? {
            self.events.emit(RouterEvent::ExecutorRemoved { executor });
        }
        Ok(())
    }

    pub fn pause(&mut self, sender: Address) -> Result<()> {
        self.access.check(Role::Pauser, sender)?;
        self.access.set_paused(true);
        self.events.emit(RouterEvent::Paused { account: sender });
        Ok(())
    }

    pub fn unpause(&mut self, sender: Address) -> Result<()> {
        self.access.check(Role::Unpauser, sender)?;
        self.access.set_paused(false);
        self.events.emit(RouterEvent::Unpaused { account: sender });
        Ok(())
    }

    pub fn grant_role(&mut self, sender: Address, role: Role, account: Address) -> Result<()> {
        if self.access.grant(sender, role, account)? {
            self.events.emit(RouterEvent::RoleGranted {
                role,
                account,
                sender,
            });
        }
        Ok(())
    }

    pub fn batch_grant_role(
        &mut self,
        sender: Address,
        role: Role,
        accounts: &[Address],
    ) -> Result<()> {
        self.access.check(Role::Admin, sender)?;
        if accounts.iter().any(|a| a.is_zero()) {
            return Err(RouterError::AddressZero);
        }
        for &account in accounts {
            self.grant_role(sender, role, account)?;
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, sender: Address, role: Role, account: Address) -> Result<()> {
        if self.access.revoke(sender, role, account)? {
            self.events.emit(RouterEvent::RoleRevoked {
                role,
                account,
                sender,
            });
        }
        Ok(())
    }

    /// Sweep the router's whole balance of each token to `receiver`.
    pub fn withdraw(
        &mut self,
        chain: &mut Chain,
        sender: Address,
        tokens: &[Address],
        receiver: Address,
    ) -> Result<()> {
        self.access.check(Role::FundRescuer, sender)?;
        if receiver.is_zero() {
            return Err(RouterError::AddressZero);
        }
        for &token in tokens {
            if token == NATIVE {
                return Err(RouterError::AddressZero);
            }
        }
        for &token in tokens {
            self.sweep(chain, token, receiver)?;
        }
        Ok(())
    }

    pub fn withdraw_native(
        &mut self,
        chain: &mut Chain,
        sender: Address,
        receiver: Address,
    ) -> Result<()> {
        self.access.check(Role::FundRescuer, sender)?;
        if receiver.is_zero() {
            return Err(RouterError::AddressZero);
        }
        self.sweep(chain, NATIVE, receiver)
    }

    fn sweep(&mut self, chain: &mut Chain, token: Address, receiver: Address) -> Result<()> {
        let amount = chain.bank.balance_of(token, self.address);
        if amount == 0 {
            return Ok(());
        }
        chain.bank.transfer(token, self.address, receiver, amount)?;
        self.events.emit(RouterEvent::Withdrawal {
            token,
            amount,
            receiver,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Graph<'a> {
    Single(&'a [u8]),
    Sequential(&'a [u8]),
    Split(u8, &'a [u8]),
}

impl Graph<'_> {
    fn variant(&self) -> &'static str {
        match self {
            Graph::Single(_) => "single",
            Graph::Sequential(_) => "sequential",
            Graph::Split(..) => "split",
        }
    }
}

impl<'a> From<&'a SwapGraph> for Graph<'a> {
    fn from(graph: &'a SwapGraph) -> Self {
        match graph {
            SwapGraph::Single { swaps } => Graph::Single(swaps),
            SwapGraph::Sequential { swaps } => Graph::Sequential(swaps),
            SwapGraph::Split { n_tokens, swaps } => Graph::Split(*n_tokens, swaps),
        }
    }
}

fn validate_params(env: CallEnv, params: &SwapParams) -> Result<()> {
    if params.receiver.is_zero() {
        return Err(RouterError::AddressZero);
    }
    if params.min_amount_out == 0 {
        return Err(RouterError::UndefinedMinAmountOut);
    }
    if params.wrap && params.token_in != NATIVE {
        return Err(RouterError::WrapRequiresNative);
    }
    if params.unwrap && params.token_out != NATIVE {
        return Err(RouterError::UnwrapRequiresNative);
    }
    let expected_value = if params.token_in == NATIVE {
        params.amount_in
    } else {
        0
    };
    if env.value != expected_value {
        return Err(RouterError::MessageValueMismatch {
            value: env.value,
            amount: expected_value,
        });
    }
    Ok(())
}

fn single(
    router: &mut Router,
    chain: &mut Chain,
    caller: Address,
    amount_in: Amount,
    swaps: &[u8],
) -> Result<Amount> {
    let step = SwapStep::decode(swaps)?;
    dispatch_swap(router, chain, caller, step.executor, amount_in, step.protocol_data)
}

fn sequential(
    router: &mut Router,
    chain: &mut Chain,
    caller: Address,
    amount_in: Amount,
    swaps: &[u8],
) -> Result<Amount> {
    if swaps.is_empty() {
        return Err(RouterError::InvalidDataLength);
    }
    let mut amount = amount_in;
    for step in SequentialSwaps::new(swaps) {
        let step = step?;
        amount = dispatch_swap(router, chain, caller, step.executor, amount, step.protocol_data)?;
    }
    Ok(amount)
}

/// `amount * split / SPLIT_DENOMINATOR` without intermediate overflow.
fn split_share(amount: Amount, split: u32) -> Amount {
    let denom = Amount::from(SPLIT_DENOMINATOR);
    let split = Amount::from(split);
    (amount / denom) * split + (amount % denom) * split / denom
}

fn split(
    router: &mut Router,
    chain: &mut Chain,
    caller: Address,
    amount_in: Amount,
    n_tokens: u8,
    swaps: &[u8],
) -> Result<Amount> {
    validate_split_plan(swaps, n_tokens)?;

    let n = n_tokens as usize;
    let mut amounts = vec![0 as Amount; n];
    let mut remaining = vec![0 as Amount; n];
    amounts[0] = amount_in;
    remaining[0] = amount_in;
    let mut cyclic_amount_out: Amount = 0;
    let mut last_token_out = 0usize;

    for leg in SplitSwaps::new(swaps) {
        let leg = leg?;
        let (tin, tout) = (leg.token_in as usize, leg.token_out as usize);
        let current = if leg.split > 0 {
            split_share(amounts[tin], leg.split)
        } else {
            remaining[tin]
        };
        remaining[tin] = remaining[tin]
            .checked_sub(current)
            .ok_or(RouterError::ArithmeticUnderflow)?;

        router
            .transient
            .store(SlotKey::LegTransferType, Word::Transfer(leg.action));
        let out = dispatch_swap(
            router,
            chain,
            caller,
            leg.step.executor,
            current,
            leg.step.protocol_data,
        );
        router.transient.clear_slot(SlotKey::LegTransferType);
        let out = out?;

        if tout == 0 {
            cyclic_amount_out = cyclic_amount_out
                .checked_add(out)
                .ok_or(RouterError::ArithmeticOverflow)?;
        } else {
            amounts[tout] = amounts[tout]
                .checked_add(out)
                .ok_or(RouterError::ArithmeticOverflow)?;
            remaining[tout] = remaining[tout]
                .checked_add(out)
                .ok_or(RouterError::ArithmeticOverflow)?;
        }
        last_token_out = tout;
    }

    Ok(if last_token_out == 0 {
        cyclic_amount_out
    } else {
        amounts[last_token_out]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTER: Address = Address::repeat_byte(0x0f);
    const WRAPPED: Address = Address::repeat_byte(0x77);
    const ADMIN: Address = Address::repeat_byte(0xad);
    const USER: Address = Address::repeat_byte(0x01);
    const TOKEN_A: Address = Address::repeat_byte(0xaa);
    const TOKEN_B: Address = Address::repeat_byte(0xbb);
    const EXECUTOR: Address = Address::repeat_byte(0xe1);

    fn params() -> SwapParams {
        SwapParams {
            amount_in: 100,
            token_in: TOKEN_A,
            token_out: TOKEN_B,
            min_amount_out: 1,
            wrap: false,
            unwrap: false,
            receiver: USER,
        }
    }

    fn router() -> Router {
        Router::new(ROUTER, WRAPPED, ADMIN).unwrap()
    }

    #[test]
    fn inputs_are_validated_before_any_state_change() {
        let mut router = router();
        let mut chain = Chain::new(1);
        let env = CallEnv::new(USER);
        let swaps = crate::router::encoding::encode_single(EXECUTOR, &[]);

        let mut p = params();
        p.receiver = Address::ZERO;
        assert_eq!(
            router.single_swap(&mut chain, env, &p, &swaps),
            Err(RouterError::AddressZero)
        );

        let mut p = params();
        p.min_amount_out = 0;
        assert_eq!(
            router.single_swap(&mut chain, env, &p, &swaps),
            Err(RouterError::UndefinedMinAmountOut)
        );

        let mut p = params();
        p.wrap = true;
        assert_eq!(
            router.single_swap(&mut chain, env, &p, &swaps),
            Err(RouterError::WrapRequiresNative)
        );

        assert_eq!(
            router.single_swap(&mut chain, env.with_value(5), &params(), &swaps),
            Err(RouterError::MessageValueMismatch { value: 5, amount: 0 })
        );
        assert!(router.events().is_empty());
        assert!(router.transient.is_empty());
    }

    #[test]
    fn paused_router_rejects_swaps() {
        let mut router = router();
        let mut chain = Chain::new(1);
        router.grant_role(ADMIN, Role::Pauser, ADMIN).unwrap();
        router.grant_role(ADMIN, Role::Unpauser, ADMIN).unwrap();
        router.pause(ADMIN).unwrap();
        let swaps = crate::router::encoding::encode_single(EXECUTOR, &[]);
        assert_eq!(
            router.single_swap(&mut chain, CallEnv::new(USER), &params(), &swaps),
            Err(RouterError::Paused)
        );
        router.unpause(ADMIN).unwrap();
        assert!(!router.is_paused());
    }

    #[test]
    fn set_executors_is_all_or_nothing() {
        let mut router = router();
        let mut chain = Chain::new(1);
        chain.deploy_contract(EXECUTOR);
        let missing = Address::repeat_byte(0xe2);
        assert_eq!(
            router.set_executors(&chain, ADMIN, &[EXECUTOR, missing], None),
            Err(RouterError::NonContractExecutor(missing))
        );
        assert!(router.registry().get(EXECUTOR).is_none());
        assert!(router.events().is_empty());
    }

    #[test]
    fn executor_setter_role_is_required() {
        let mut router = router();
        let mut chain = Chain::new(1);
        chain.deploy_contract(EXECUTOR);
        assert!(matches!(
            router.set_executors(&chain, USER, &[EXECUTOR], None),
            Err(RouterError::Unauthorized { .. })
        ));
        router.grant_role(ADMIN, Role::ExecutorSetter, USER).unwrap();
        router.set_executors(&chain, USER, &[EXECUTOR], Some(3)).unwrap();
        assert_eq!(
            router.events().last(),
            Some(&RouterEvent::ExecutorSet {
                executor: EXECUTOR,
                activation_block: 4
            })
        );
        router.remove_executor(USER, EXECUTOR).unwrap();
        assert!(!router.registry().is_active(EXECUTOR, 10));
    }

    #[test]
    fn withdraw_sweeps_router_balances() {
        let mut router = router();
        let mut chain = Chain::new(1);
        chain.bank.mint(TOKEN_A, ROUTER, 40).unwrap();
        chain.bank.mint(NATIVE, ROUTER, 7).unwrap();
        assert!(router
            .withdraw(&mut chain, ADMIN, &[TOKEN_A], ADMIN)
            .is_err());
        router.grant_role(ADMIN, Role::FundRescuer, ADMIN).unwrap();
        assert_eq!(
            router.withdraw(&mut chain, ADMIN, &[TOKEN_A], Address::ZERO),
            Err(RouterError::AddressZero)
        );
        router
            .withdraw(&mut chain, ADMIN, &[TOKEN_A, TOKEN_B], ADMIN)
            .unwrap();
        router.withdraw_native(&mut chain, ADMIN, ADMIN).unwrap();
        assert_eq!(chain.bank.balance_of(TOKEN_A, ADMIN), 40);
        assert_eq!(chain.bank.balance_of(NATIVE, ADMIN), 7);
        assert_eq!(
            router.events().last(),
            Some(&RouterEvent::Withdrawal {
                token: NATIVE,
                amount: 7,
                receiver: ADMIN
            })
        );
    }

    #[test]
    fn batch_grant_rejects_zero_accounts_up_front() {
        let mut router = router();
        assert_eq!(
            router.batch_grant_role(ADMIN, Role::Pauser, &[USER, Address::ZERO]),
            Err(RouterError::AddressZero)
        );
        assert!(!router.access().has_role(Role::Pauser, USER));
        router
            .batch_grant_role(ADMIN, Role::Pauser, &[USER, TOKEN_A])
            .unwrap();
        assert!(router.access().has_role(Role::Pauser, TOKEN_A));
    }

    #[test]
    fn unlock_callback_needs_a_header() {
        let mut router = router();
        let mut chain = Chain::new(1);
        assert_eq!(
            router.unlock_callback(&mut chain, USER, &[0u8; 19]),
            Err(RouterError::InvalidDataLength)
        );
        assert_eq!(
            router.unlock_callback(&mut chain, USER, &[0u8; 20]),
            Err(RouterError::UnapprovedExecutor(Address::ZERO))
        );
    }

    #[test]
    fn split_share_is_exact_for_large_amounts() {
        assert_eq!(split_share(Amount::MAX, SPLIT_DENOMINATOR), Amount::MAX);
        assert_eq!(split_share(1_000, SPLIT_DENOMINATOR / 2), 499);
        assert_eq!(split_share(0, 123), 0);
    }
}
