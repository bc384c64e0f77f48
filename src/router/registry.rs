// Executor registry
// Approved executor modules and the block from which each may be dispatched to.
// Mutated only through the router's role-gated administrative operations.
//
// Numan Thabit 2025 Nov

use crate::chain::Chain;
use crate::errors::{Result, RouterError};
use crate::types::Address;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutorRecord {
    pub approved: bool,
    /// First block at which the executor may be used.
    pub activation_block: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutorRegistry {
    records: BTreeMap<Address, ExecutorRecord>,
}

impl ExecutorRegistry {
    pub fn get(&self, executor: Address) -> Option<&ExecutorRecord> {
        self.records.get(&executor)
    }

    /// Approved and past its activation delay.
    pub fn is_active(&self, executor: Address, block: u64) -> bool {
        self.records
            .get(&executor)
            .is_some_and(|r| r.approved && block >= r.activation_block)
    }

    pub fn ensure_active(&self, executor: Address, block: u64) -> Result<()> {
        if self.is_active(executor, block) {
            Ok(())
        } else {
            Err(RouterError::UnapprovedExecutor(executor))
        }
    }

    pub(crate) fn set(
        &mut self,
        chain: &Chain,
        executor: Address,
        delay: Option<u64>,
    ) -> Result<ExecutorRecord> {
        if executor.is_zero() {
            return Err(RouterError::AddressZero);
        }
        if !chain.has_code(executor) {
            return Err(RouterError::NonContractExecutor(executor));
        }
        let record = ExecutorRecord {
            approved: true,
            activation_block: chain
                .block_number()
                .saturating_add(delay.unwrap_or(0)),
        };
        self.records.insert(executor, record);
        Ok(record)
    }

    /// Returns whether the executor was registered.
    pub(crate) fn remove(&mut self, executor: Address) -> Result<bool> {
        if executor.is_zero() {
            return Err(RouterError::AddressZero);
        }
        Ok(self.records.remove(&executor).is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &ExecutorRecord)> {
        self.records.iter()
    }
}
