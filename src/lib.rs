// Library root module for ultra-router
// This file defines the public API and module structure of the swap router
// core: the host chain model, the router itself and its venue executors
//
// Numan Thabit 2025 Nov

pub mod chain;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod router;
pub mod types;
pub mod venues;
