// Venue adapter module
// The executor interface every venue integration implements. The router
// dispatches each swap step to an executor, which runs against the router's
// own authorization state through an `ExecutionContext`
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError};
use crate::router::dispatch::ExecutionContext;
use crate::types::{Address, Amount, TransferType};

/// A transfer an executor asks the router to settle while a pool is calling
/// back for payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackTransfer {
    pub transfer_type: TransferType,
    pub receiver: Address,
    pub token: Address,
    pub amount: Amount,
    /// The receiver pulls the funds itself and needs a router allowance.
    pub approval_needed: bool,
}

/// Executor adapter - one swap step on one venue.
///
/// Executors run with the router's identity: transfers they request are
/// checked against the caller's pull allowance and the router's unlocked
/// float, never against raw balances.
pub trait Executor: Send + Sync {
    /// Short venue label used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Perform one swap of `amount_in` and return the amount produced.
    fn swap(
        &self,
        ctx: &mut ExecutionContext<'_>,
        amount_in: Amount,
        data: &[u8],
    ) -> Result<Amount>;

    /// Decode the payment a venue callback is asking for, if any.
    fn callback_transfer_data(&self, _data: &[u8]) -> Result<Option<CallbackTransfer>> {
        Ok(None)
    }

    /// Finish handling a venue callback after payment was settled.
    fn handle_callback(&self, _ctx: &mut ExecutionContext<'_>, _data: &[u8]) -> Result<Vec<u8>> {
        Err(RouterError::Revert(None))
    }
}
