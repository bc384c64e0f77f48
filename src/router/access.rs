// Role-based access policy for privileged router operations
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Grants and revokes every role.
    Admin,
    ExecutorSetter,
    Pauser,
    Unpauser,
    FundRescuer,
}

#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    members: HashMap<Role, HashSet<Address>>,
    paused: bool,
}

impl AccessControl {
    pub fn new(admin: Address) -> Result<Self> {
        if admin.is_zero() {
            return Err(RouterError::AddressZero);
        }
        let mut ac = Self::default();
        ac.members.entry(Role::Admin).or_default().insert(admin);
        Ok(ac)
    }

    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|m| m.contains(&account))
    }

    pub fn check(&self, role: Role, account: Address) -> Result<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(RouterError::Unauthorized { account, role })
        }
    }

    /// Returns whether the account did not hold the role before.
    pub fn grant(&mut self, sender: Address, role: Role, account: Address) -> Result<bool> {
        self.check(Role::Admin, sender)?;
        if account.is_zero() {
            return Err(RouterError::AddressZero);
        }
        Ok(self.members.entry(role).or_default().insert(account))
    }

    /// Returns whether the account held the role.
    pub fn revoke(&mut self, sender: Address, role: Role, account: Address) -> Result<bool> {
        self.check(Role::Admin, sender)?;
        Ok(self
            .members
            .get_mut(&role)
            .is_some_and(|m| m.remove(&account)))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}
