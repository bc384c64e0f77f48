// In-process host chain
// Stands in for the execution environment the router runs in: token balances,
// signed-permit allowances, deployed code and the current block height
//
// Numan Thabit 2025 Nov

pub mod bank;
pub mod permit;
pub mod wrapped;

pub use bank::Bank;
pub use permit::{PermitDetails, PermitRegistry, PermitSingle};

use crate::types::Address;
use crate::venues::adapter::Executor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What lives at a deployed address.
#[derive(Clone)]
pub enum Code {
    /// A swap executor module the router may dispatch to.
    Executor(Arc<dyn Executor>),
    /// Any other contract (pools, tokens, settlement vaults).
    Contract,
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Executor(e) => write!(f, "Executor({})", e.name()),
            Code::Contract => write!(f, "Contract"),
        }
    }
}

/// State that a failed top-level call must roll back.
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    bank: Bank,
    permits: PermitRegistry,
}

#[derive(Debug, Default)]
pub struct Chain {
    pub bank: Bank,
    pub permits: PermitRegistry,
    code: HashMap<Address, Code>,
    block_number: u64,
}

impl Chain {
    pub fn new(block_number: u64) -> Self {
        Self {
            block_number,
            ..Self::default()
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.block_number = self.block_number.saturating_add(blocks);
    }

    pub fn deploy_contract(&mut self, address: Address) {
        self.code.insert(address, Code::Contract);
    }

    pub fn deploy_executor(&mut self, address: Address, executor: Arc<dyn Executor>) {
        self.code.insert(address, Code::Executor(executor));
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.code.contains_key(&address)
    }

    pub fn executor_at(&self, address: Address) -> Option<Arc<dyn Executor>> {
        match self.code.get(&address) {
            Some(Code::Executor(e)) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            bank: self.bank.clone(),
            permits: self.permits.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: ChainSnapshot) {
        self.bank = snapshot.bank;
        self.permits = snapshot.permits;
    }
}
