// Venue executors
// The executor interface and the reference venues the router ships with
//
// Numan Thabit 2025 Nov

pub mod adapter;
pub mod amm;
pub mod settlement;

pub use adapter::{CallbackTransfer, Executor};
pub use amm::ConstantProductExecutor;
pub use settlement::SettlementExecutor;
