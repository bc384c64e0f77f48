// Error types and error handling module
// This file defines the structured failure reasons of the router core,
// one variant per invariant that can reject a swap
//
// Numan Thabit 2025 Nov

use crate::types::{Address, Amount, TransferType};
use std::fmt;
use thiserror::Error;

pub type Result<T, E = RouterError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    // input validation
    #[error("zero address not allowed")]
    AddressZero,
    #[error("minimum amount out must be non-zero")]
    UndefinedMinAmountOut,
    #[error("attached value {value} does not match declared amount {amount}")]
    MessageValueMismatch { value: Amount, amount: Amount },
    #[error("wrapping requires the native asset as input")]
    WrapRequiresNative,
    #[error("unwrapping requires the native asset as output")]
    UnwrapRequiresNative,
    #[error("invalid data length")]
    InvalidDataLength,
    #[error("invalid parameter length")]
    InvalidParameterLength,
    #[error("invalid split leg {index}: {violation}")]
    InvalidSplit { index: usize, violation: SplitViolation },

    // authorization
    #[error("executor {0} has no code")]
    NonContractExecutor(Address),
    #[error("executor {0} is not approved")]
    UnapprovedExecutor(Address),
    #[error("transferFrom of {attempted} exceeds allowance {allowed}")]
    ExceededTransferFromAllowance { allowed: Amount, attempted: Amount },
    #[error("token {token_in} differs from authorized token {authorized}")]
    DifferentTokenIn { token_in: Address, authorized: Address },
    #[error("unknown transfer type {0}")]
    UnknownTransferType(u8),
    #[error("leg declared {declared:?} transfers but requested {requested:?}")]
    TransferTypeMismatch {
        declared: TransferType,
        requested: TransferType,
    },
    #[error("router is locked for token {0}")]
    RouterLocked(Address),
    #[error("router already unlocked for token {0}")]
    RouterAlreadyUnlocked(Address),
    #[error("router float {available} of {token} is below requested {requested}")]
    AmountNotTransferredToRouter {
        token: Address,
        available: Amount,
        requested: Amount,
    },
    #[error("reentrant call")]
    Reentrancy,
    #[error("router is paused")]
    Paused,
    #[error("account {account} lacks role {role:?}")]
    Unauthorized { account: Address, role: crate::router::access::Role },

    // module failures
    #[error("executor call failed")]
    ExecutionFailed,
    #[error("callback failed")]
    CallbackFailed,
    #[error("{}", .0.as_deref().unwrap_or("module reverted"))]
    Revert(Option<String>),

    // post-conditions
    #[error("negative slippage: got {amount}, minimum {min_amount}")]
    NegativeSlippage { amount: Amount, min_amount: Amount },
    #[error("receiver got {received}, expected {expected}")]
    AmountOutNotFullyReceived { expected: Amount, received: Amount },

    // host environment
    #[error("{holder} holds {balance} of {token}, needs {needed}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        balance: Amount,
        needed: Amount,
    },
    #[error("allowance {allowance} of {token} below {needed}")]
    InsufficientAllowance {
        token: Address,
        allowance: Amount,
        needed: Amount,
    },
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error("arithmetic underflow")]
    ArithmeticUnderflow,
    #[error("invalid permit signature")]
    InvalidSignature,
    #[error("permit signed by {signer}, not {owner}")]
    InvalidSigner { signer: Address, owner: Address },
    #[error("permit signature deadline {deadline} passed")]
    PermitExpired { deadline: u64 },
    #[error("permit nonce {got} does not match expected {expected}")]
    InvalidNonce { expected: u64, got: u64 },
    #[error("permit allowance expired at block {expiration}")]
    AllowanceExpired { expiration: u64 },
}

impl RouterError {
    /// Short stable label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RouterError::AddressZero => "address_zero",
            RouterError::UndefinedMinAmountOut => "undefined_min_amount_out",
            RouterError::MessageValueMismatch { .. } => "message_value_mismatch",
            RouterError::WrapRequiresNative | RouterError::UnwrapRequiresNative => "wrap",
            RouterError::InvalidDataLength
            | RouterError::InvalidParameterLength
            | RouterError::InvalidSplit { .. } => "malformed",
            RouterError::NonContractExecutor(_) | RouterError::UnapprovedExecutor(_) => {
                "unapproved_executor"
            }
            RouterError::ExceededTransferFromAllowance { .. }
            | RouterError::DifferentTokenIn { .. }
            | RouterError::UnknownTransferType(_)
            | RouterError::TransferTypeMismatch { .. } => "transfer_authorization",
            RouterError::RouterLocked(_)
            | RouterError::RouterAlreadyUnlocked(_)
            | RouterError::AmountNotTransferredToRouter { .. } => "router_lock",
            RouterError::Reentrancy => "reentrancy",
            RouterError::Paused => "paused",
            RouterError::Unauthorized { .. } => "unauthorized",
            RouterError::ExecutionFailed | RouterError::CallbackFailed | RouterError::Revert(_) => {
                "module_failure"
            }
            RouterError::NegativeSlippage { .. } => "negative_slippage",
            RouterError::AmountOutNotFullyReceived { .. } => "amount_out_not_received",
            RouterError::InsufficientBalance { .. } | RouterError::InsufficientAllowance { .. } => {
                "insufficient_funds"
            }
            RouterError::ArithmeticOverflow | RouterError::ArithmeticUnderflow => "arithmetic",
            RouterError::InvalidSignature
            | RouterError::InvalidSigner { .. }
            | RouterError::PermitExpired { .. }
            | RouterError::InvalidNonce { .. }
            | RouterError::AllowanceExpired { .. } => "permit",
        }
    }

    /// Convenience for executor modules reverting with a reason.
    pub fn revert(reason: impl Into<String>) -> Self {
        RouterError::Revert(Some(reason.into()))
    }
}

/// Why a split leg was rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitViolation {
    TokenIndexOutOfRange { index: u8, n_tokens: u8 },
    SameTokenInAndOut(u8),
    TokenNotYetProduced(u8),
    WeightsExceedWhole(u8),
    MissingRemainder(u8),
    LegAfterRemainder(u8),
    PullFromIntermediate(u8),
    TooFewTokens(u8),
    Empty,
}

impl fmt::Display for SplitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitViolation::TokenIndexOutOfRange { index, n_tokens } => {
                write!(f, "token index {index} out of range for {n_tokens} tokens")
            }
            SplitViolation::SameTokenInAndOut(i) => write!(f, "token {i} swapped into itself"),
            SplitViolation::TokenNotYetProduced(i) => {
                write!(f, "token {i} spent before any leg produced it")
            }
            SplitViolation::WeightsExceedWhole(i) => {
                write!(f, "splits of token {i} reach or exceed the whole")
            }
            SplitViolation::MissingRemainder(i) => write!(f, "token {i} has no remainder leg"),
            SplitViolation::LegAfterRemainder(i) => {
                write!(f, "token {i} is spent after its remainder leg")
            }
            SplitViolation::PullFromIntermediate(i) => {
                write!(f, "transferFrom declared for intermediate token {i}")
            }
            SplitViolation::TooFewTokens(n) => write!(f, "{n} tokens cannot form a swap"),
            SplitViolation::Empty => write!(f, "no legs"),
        }
    }
}
