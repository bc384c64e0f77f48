// Settlement-vault venue adapter
// Vaults that pay out first and collect afterwards: the vault sends the
// output, calls back into the router, and only then checks it was paid.
// The executor answers that callback by settling the input through the router
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError};
use crate::router::dispatch::{ExecutionContext, InboundCall};
use crate::types::{read_address, Address, Amount, TransferType, ADDRESS_LEN};
use crate::venues::adapter::{CallbackTransfer, Executor};
use crate::venues::amm::get_amount_out;
use tracing::debug;

/// How the vault re-enters the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStyle {
    /// Plain call into the router's fallback handler.
    Fallback = 0,
    /// Pool-manager style `unlock_callback`.
    Unlock = 1,
}

impl TryFrom<u8> for CallbackStyle {
    type Error = RouterError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CallbackStyle::Fallback),
            1 => Ok(CallbackStyle::Unlock),
            other => Err(RouterError::revert(format!("unknown callback style {other}"))),
        }
    }
}

/// `[token_in:20][token_out:20][vault:20][receiver:20][style:1][transfer_type:1][approval:1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementSwapData {
    pub token_in: Address,
    pub token_out: Address,
    pub vault: Address,
    pub receiver: Address,
    pub style: CallbackStyle,
    /// How the router pays the vault during the callback.
    pub transfer_type: TransferType,
    /// The vault pulls its input against a router allowance.
    pub approval_needed: bool,
}

impl SettlementSwapData {
    pub const LEN: usize = 4 * ADDRESS_LEN + 3;

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != Self::LEN {
            return Err(RouterError::InvalidDataLength);
        }
        Ok(Self {
            token_in: read_address(&data[0..20])?,
            token_out: read_address(&data[20..40])?,
            vault: read_address(&data[40..60])?,
            receiver: read_address(&data[60..80])?,
            style: CallbackStyle::try_from(data[80])?,
            transfer_type: TransferType::try_from(data[81])?,
            approval_needed: data[82] != 0,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        for a in [self.token_in, self.token_out, self.vault, self.receiver] {
            out.extend_from_slice(a.as_slice());
        }
        out.push(self.style as u8);
        out.push(self.transfer_type.as_byte());
        out.push(u8::from(self.approval_needed));
        out
    }
}

/// Payload the vault hands back to the router:
/// `[vault:20][token_in:20][amount:16][transfer_type:1][approval:1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CallbackData {
    vault: Address,
    token_in: Address,
    amount: Amount,
    transfer_type: TransferType,
    approval_needed: bool,
}

impl CallbackData {
    const LEN: usize = 2 * ADDRESS_LEN + 16 + 2;

    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != Self::LEN {
            return Err(RouterError::InvalidDataLength);
        }
        let mut amount = [0u8; 16];
        amount.copy_from_slice(&data[40..56]);
        Ok(Self {
            vault: read_address(&data[0..20])?,
            token_in: read_address(&data[20..40])?,
            amount: Amount::from_be_bytes(amount),
            transfer_type: TransferType::try_from(data[56])?,
            approval_needed: data[57] != 0,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(self.vault.as_slice());
        out.extend_from_slice(self.token_in.as_slice());
        out.extend_from_slice(&self.amount.to_be_bytes());
        out.push(self.transfer_type.as_byte());
        out.push(u8::from(self.approval_needed));
        out
    }
}

/// Executor for pay-first settlement vaults. Quotes like a constant-product
/// pool over the vault's balances.
#[derive(Debug, Default, Clone, Copy)]
pub struct SettlementExecutor;

impl Executor for SettlementExecutor {
    fn name(&self) -> &'static str {
        "settlement_vault"
    }

    fn swap(
        &self,
        ctx: &mut ExecutionContext<'_>,
        amount_in: Amount,
        data: &[u8],
    ) -> Result<Amount> {
        let step = SettlementSwapData::decode(data)?;
        let amount_out = get_amount_out(
            amount_in,
            ctx.balance_of(step.token_in, step.vault),
            ctx.balance_of(step.token_out, step.vault),
        )?;
        if step.receiver == ctx.router_address() {
            ctx.expect_inbound(step.token_out);
        }

        let payload = CallbackData {
            vault: step.vault,
            token_in: step.token_in,
            amount: amount_in,
            transfer_type: step.transfer_type,
            approval_needed: step.approval_needed,
        }
        .encode();
        let call = match step.style {
            CallbackStyle::Fallback => InboundCall::Fallback(payload),
            CallbackStyle::Unlock => InboundCall::UnlockCallback(payload),
        };

        ctx.call_external(step.vault, |vault| {
            let router = vault.router_address();
            let before = vault.balance_of(step.token_in, step.vault);
            vault.transfer(step.token_out, step.receiver, amount_out)?;
            vault.call_router(call)?;
            if step.approval_needed {
                vault.transfer_from(step.token_in, router, step.vault, amount_in)?;
            }
            let paid = vault
                .balance_of(step.token_in, step.vault)
                .saturating_sub(before);
            if paid < amount_in {
                return Err(RouterError::revert("vault not settled"));
            }
            Ok(())
        })?;

        debug!(vault = %step.vault, amount_in, amount_out, "vault swap settled");
        Ok(amount_out)
    }

    fn callback_transfer_data(&self, data: &[u8]) -> Result<Option<CallbackTransfer>> {
        let cb = CallbackData::decode(data)?;
        Ok(Some(CallbackTransfer {
            transfer_type: cb.transfer_type,
            receiver: cb.vault,
            token: cb.token_in,
            amount: cb.amount,
            approval_needed: cb.approval_needed,
        }))
    }

    fn handle_callback(&self, ctx: &mut ExecutionContext<'_>, data: &[u8]) -> Result<Vec<u8>> {
        let cb = CallbackData::decode(data)?;
        if ctx.caller() != cb.vault {
            return Err(RouterError::revert("callback not from vault"));
        }
        Ok(cb.amount.to_be_bytes().to_vec())
    }
}
