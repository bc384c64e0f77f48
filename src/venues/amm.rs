// AMM venue adapter module
// Constant-product pools (x * y = k, 0.3% fee). The pool's token balances are
// its reserves; input is delivered according to the step's transfer type and
// the pool pays the output straight to the step's receiver
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError};
use crate::router::dispatch::ExecutionContext;
use crate::types::{read_address, Address, Amount, TransferType, ADDRESS_LEN};
use crate::venues::adapter::Executor;
use alloy_primitives::U256;
use tracing::debug;

const FEE_NUMERATOR: Amount = 997;
const FEE_DENOMINATOR: Amount = 1000;

/// `[token_in:20][token_out:20][pool:20][receiver:20][transfer_type:1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmSwapData {
    pub token_in: Address,
    pub token_out: Address,
    pub pool: Address,
    pub receiver: Address,
    pub transfer_type: TransferType,
}

impl AmmSwapData {
    pub const LEN: usize = 4 * ADDRESS_LEN + 1;

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != Self::LEN {
            return Err(RouterError::InvalidDataLength);
        }
        Ok(Self {
            token_in: read_address(&data[0..20])?,
            token_out: read_address(&data[20..40])?,
            pool: read_address(&data[40..60])?,
            receiver: read_address(&data[60..80])?,
            transfer_type: TransferType::try_from(data[80])?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        for a in [self.token_in, self.token_out, self.pool, self.receiver] {
            out.extend_from_slice(a.as_slice());
        }
        out.push(self.transfer_type.as_byte());
        out
    }
}

/// Output of a constant-product swap after the 0.3% fee, quoted in 256 bits.
pub fn get_amount_out(amount_in: Amount, reserve_in: Amount, reserve_out: Amount) -> Result<Amount> {
    if amount_in == 0 {
        return Err(RouterError::revert("insufficient input amount"));
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(RouterError::revert("insufficient liquidity"));
    }
    let in_with_fee = U256::from(amount_in) * U256::from(FEE_NUMERATOR);
    let numerator = in_with_fee
        .checked_mul(U256::from(reserve_out))
        .ok_or(RouterError::ArithmeticOverflow)?;
    let denominator = U256::from(reserve_in) * U256::from(FEE_DENOMINATOR) + in_with_fee;
    Amount::try_from(numerator / denominator).map_err(|_| RouterError::ArithmeticOverflow)
}

/// Executor for constant-product pools.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantProductExecutor;

impl Executor for ConstantProductExecutor {
    fn name(&self) -> &'static str {
        "constant_product"
    }

    fn swap(
        &self,
        ctx: &mut ExecutionContext<'_>,
        amount_in: Amount,
        data: &[u8],
    ) -> Result<Amount> {
        let step = AmmSwapData::decode(data)?;
        let reserve_in = ctx.balance_of(step.token_in, step.pool);
        let reserve_out = ctx.balance_of(step.token_out, step.pool);

        // a previous step already paid this pool
        let reserve_in = match step.transfer_type {
            TransferType::None => reserve_in
                .checked_sub(amount_in)
                .ok_or(RouterError::revert("input not delivered to pool"))?,
            _ => reserve_in,
        };
        let amount_out = get_amount_out(amount_in, reserve_in, reserve_out)?;

        ctx.transfer(step.pool, step.transfer_type, step.token_in, amount_in)?;
        if step.receiver == ctx.router_address() {
            ctx.expect_inbound(step.token_out);
        }
        ctx.call_external(step.pool, |pool| {
            pool.transfer(step.token_out, step.receiver, amount_out)
        })?;

        debug!(
            pool = %step.pool,
            amount_in,
            amount_out,
            reserve_in,
            reserve_out,
            "constant-product swap"
        );
        Ok(amount_out)
    }
}
