// Shared fixtures for the router integration tests
//
// Numan Thabit 2025 Nov

#![allow(dead_code)]

use std::sync::Arc;
use ultra_router::chain::Chain;
use ultra_router::router::{Router, SwapParams};
use ultra_router::types::{Address, Amount, TransferType, NATIVE};
use ultra_router::venues::amm::AmmSwapData;
use ultra_router::venues::settlement::{CallbackStyle, SettlementSwapData};
use ultra_router::venues::{ConstantProductExecutor, SettlementExecutor};

pub const E18: Amount = 1_000_000_000_000_000_000;
/// Output of 1 WETH through the reference WETH/DAI pool.
pub const ONE_WETH_IN_DAI: Amount = 2_659_881_924_818_443_699_787;

pub const ROUTER: Address = Address::repeat_byte(0x0f);
pub const ADMIN: Address = Address::repeat_byte(0xad);
pub const ALICE: Address = Address::repeat_byte(0x01);
pub const BOB: Address = Address::repeat_byte(0x02);

pub const WETH: Address = Address::repeat_byte(0x77);
pub const DAI: Address = Address::repeat_byte(0xda);
pub const USDC: Address = Address::repeat_byte(0xc0);

pub const AMM: Address = Address::repeat_byte(0xe1);
pub const AMM_2: Address = Address::repeat_byte(0xe3);
pub const VAULT_EXECUTOR: Address = Address::repeat_byte(0xe2);

pub const WETH_DAI: Address = Address::repeat_byte(0x51);
pub const WETH_DAI_2: Address = Address::repeat_byte(0x52);
pub const DAI_USDC: Address = Address::repeat_byte(0x53);
pub const VAULT: Address = Address::repeat_byte(0x5e);

pub const WETH_DAI_RESERVES: (Amount, Amount) = (1_000 * E18, 2_670_545_463_487_951_542_784_040);

pub struct Fixture {
    pub router: Router,
    pub chain: Chain,
}

impl Fixture {
    pub fn balance(&self, token: Address, owner: Address) -> Amount {
        self.chain.bank.balance_of(token, owner)
    }
}

fn seed_pool(chain: &mut Chain, pool: Address, a: (Address, Amount), b: (Address, Amount)) {
    chain.deploy_contract(pool);
    chain.bank.mint(a.0, pool, a.1).unwrap();
    chain.bank.mint(b.0, pool, b.1).unwrap();
    if a.0 == WETH {
        chain.bank.mint(NATIVE, WETH, a.1).unwrap();
    }
}

/// Router with two constant-product executors and one settlement executor,
/// three pools and a settlement vault. Alice holds 1 WETH approved to the router.
pub fn setup() -> Fixture {
    let mut chain = Chain::new(100);
    chain.deploy_contract(WETH);
    chain.deploy_executor(AMM, Arc::new(ConstantProductExecutor));
    chain.deploy_executor(AMM_2, Arc::new(ConstantProductExecutor));
    chain.deploy_executor(VAULT_EXECUTOR, Arc::new(SettlementExecutor));

    seed_pool(
        &mut chain,
        WETH_DAI,
        (WETH, WETH_DAI_RESERVES.0),
        (DAI, WETH_DAI_RESERVES.1),
    );
    seed_pool(
        &mut chain,
        WETH_DAI_2,
        (WETH, 500 * E18),
        (DAI, 1_400_000 * E18),
    );
    seed_pool(&mut chain, DAI_USDC, (DAI, 2_000_000 * E18), (USDC, 2_000_000 * E18));
    seed_pool(&mut chain, VAULT, (WETH, 800 * E18), (DAI, 2_100_000 * E18));

    chain.bank.mint(WETH, ALICE, E18).unwrap();
    chain.bank.mint(NATIVE, WETH, E18).unwrap();
    chain.bank.approve(WETH, ALICE, ROUTER, Amount::MAX);

    let mut router = Router::new(ROUTER, WETH, ADMIN).unwrap();
    router
        .set_executors(&chain, ADMIN, &[AMM, AMM_2, VAULT_EXECUTOR], None)
        .unwrap();
    Fixture { router, chain }
}

pub fn params(amount_in: Amount, token_in: Address, token_out: Address, min_out: Amount) -> SwapParams {
    SwapParams {
        amount_in,
        token_in,
        token_out,
        min_amount_out: min_out,
        wrap: false,
        unwrap: false,
        receiver: ALICE,
    }
}

pub fn amm(
    token_in: Address,
    token_out: Address,
    pool: Address,
    receiver: Address,
    transfer_type: TransferType,
) -> Vec<u8> {
    AmmSwapData {
        token_in,
        token_out,
        pool,
        receiver,
        transfer_type,
    }
    .encode()
}

pub fn vault(
    token_in: Address,
    token_out: Address,
    receiver: Address,
    style: CallbackStyle,
    transfer_type: TransferType,
    approval_needed: bool,
) -> Vec<u8> {
    SettlementSwapData {
        token_in,
        token_out,
        vault: VAULT,
        receiver,
        style,
        transfer_type,
        approval_needed,
    }
    .encode()
}
