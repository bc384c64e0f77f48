// Wrapped native asset
// The wrapper contract custodies native coin and issues its own token 1:1
//
// Numan Thabit 2025 Nov

use super::Chain;
use crate::errors::Result;
use crate::types::{Address, Amount, NATIVE};

impl Chain {
    /// Deposit `amount` native coin of `owner` into `wrapper`, crediting wrapped tokens.
    pub fn wrap_native(&mut self, wrapper: Address, owner: Address, amount: Amount) -> Result<()> {
        self.bank.transfer(NATIVE, owner, wrapper, amount)?;
        self.bank.mint(wrapper, owner, amount)
    }

    /// Burn `amount` wrapped tokens of `owner` and release the native coin back to it.
    pub fn unwrap_native(
        &mut self,
        wrapper: Address,
        owner: Address,
        amount: Amount,
    ) -> Result<()> {
        self.bank.burn(wrapper, owner, amount)?;
        self.bank.transfer(NATIVE, wrapper, owner, amount)
    }
}
