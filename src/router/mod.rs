// Router module - swap execution core
// Orchestration, executor dispatch, the transfer-authorization ledger and
// the administrative surface, plus the HTTP node API in front of them
//
// Numan Thabit 2025 Nov

pub mod access;
pub mod api;
pub mod dispatch;
pub mod encoding;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod transient;

#[allow(clippy::module_inception)]
pub mod router;

pub use access::{AccessControl, Role};
pub use dispatch::{ExecutionContext, ExternalFrame, InboundCall};
pub use events::{EventLog, RouterEvent};
pub use registry::{ExecutorRecord, ExecutorRegistry};
pub use router::{CallEnv, Permit2, Router, SwapGraph, SwapParams};
