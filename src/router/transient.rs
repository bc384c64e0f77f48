// Call-scoped scratch storage
// Keyed slots that live for exactly one top-level router call. A `CallScope`
// guard clears them on entry and again on drop, whichever way the call exits.
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError};
use crate::types::{Address, Amount, TransferType};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Well-known slot identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    ReentrancyLock,
    InFlightExecutor,
    AuthToken,
    AuthAmount,
    AuthUsesPermit,
    AuthPayer,
    /// Transfer type declared by the split leg currently executing.
    LegTransferType,
    /// Token may be pushed out of router-held balance.
    Unlocked(Address),
    /// Router balance of the token when it was unlocked.
    Baseline(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    Address(Address),
    Amount(Amount),
    Flag(bool),
    Transfer(TransferType),
}

/// Storing a zero word is the same as clearing the slot.
#[derive(Debug, Clone, Default)]
pub struct TransientStorage {
    slots: HashMap<SlotKey, Word>,
}

impl TransientStorage {
    pub fn load(&self, key: SlotKey) -> Option<Word> {
        self.slots.get(&key).copied()
    }

    pub fn store(&mut self, key: SlotKey, word: Word) {
        let zero = match word {
            Word::Address(a) => a.is_zero(),
            Word::Amount(a) => a == 0,
            Word::Flag(f) => !f,
            Word::Transfer(_) => false,
        };
        if zero {
            self.slots.remove(&key);
        } else {
            self.slots.insert(key, word);
        }
    }

    pub fn clear_slot(&mut self, key: SlotKey) {
        self.slots.remove(&key);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn load_address(&self, key: SlotKey) -> Address {
        match self.load(key) {
            Some(Word::Address(a)) => a,
            _ => Address::ZERO,
        }
    }

    pub fn load_amount(&self, key: SlotKey) -> Amount {
        match self.load(key) {
            Some(Word::Amount(a)) => a,
            _ => 0,
        }
    }

    pub fn load_flag(&self, key: SlotKey) -> bool {
        matches!(self.load(key), Some(Word::Flag(true)))
    }

    pub fn load_transfer_type(&self, key: SlotKey) -> Option<TransferType> {
        match self.load(key) {
            Some(Word::Transfer(t)) => Some(t),
            _ => None,
        }
    }
}

/// Anything that owns the transient storage of a top-level call.
pub trait HasTransient {
    fn transient_mut(&mut self) -> &mut TransientStorage;
}

/// Reentrancy-guarded scope of one top-level call.
///
/// Entering fails with `Reentrancy` while another scope over the same owner is
/// live. Dropping the scope wipes every slot, the lock included.
pub struct CallScope<'a, T: HasTransient> {
    inner: &'a mut T,
}

impl<'a, T: HasTransient> CallScope<'a, T> {
    pub fn enter(inner: &'a mut T) -> Result<Self> {
        let transient = inner.transient_mut();
        if transient.load_flag(SlotKey::ReentrancyLock) {
            return Err(RouterError::Reentrancy);
        }
        transient.clear();
        transient.store(SlotKey::ReentrancyLock, Word::Flag(true));
        Ok(Self { inner })
    }
}

impl<T: HasTransient> Deref for CallScope<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner
    }
}

impl<T: HasTransient> DerefMut for CallScope<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner
    }
}

impl<T: HasTransient> Drop for CallScope<'_, T> {
    fn drop(&mut self) {
        self.inner.transient_mut().clear();
    }
}
