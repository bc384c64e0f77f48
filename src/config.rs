// Configuration management module
// This file handles loading the node settings from an optional config file
// and environment variables, and the YAML genesis fixture that seeds the
// chain and the router
//
// Numan Thabit 2025 Nov

use crate::chain::Chain;
use crate::router::api::Node;
use crate::router::Router;
use crate::types::{de_amount, Address, Amount, NATIVE};
use crate::venues::{ConstantProductExecutor, Executor, SettlementExecutor};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP API bind address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Address the router runs under
    pub router_address: Address,
    /// Wrapped-native token contract
    pub wrapped_native: Address,
    /// Initial holder of the admin role
    pub admin: Address,
    /// Blocks a newly approved executor waits before it can be used
    #[serde(default)]
    pub executor_activation_delay: u64,
    /// YAML genesis fixture (optional; empty chain otherwise)
    pub genesis_path: Option<PathBuf>,
}

impl AppConfig {
    /// Read `ROUTER_CONFIG` (default `router.yaml`, optional) then `ROUTER__*`
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let file = std::env::var("ROUTER_CONFIG").unwrap_or_else(|_| "router".to_string());
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("ROUTER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// Build the node: genesis state if configured, then the router.
    pub fn build_node(&self) -> Result<Node> {
        let genesis = match &self.genesis_path {
            Some(path) => Genesis::from_file(path)?,
            None => Genesis::default(),
        };
        genesis.build(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    ConstantProduct,
    Settlement,
}

impl ExecutorKind {
    fn instantiate(self) -> Arc<dyn Executor> {
        match self {
            ExecutorKind::ConstantProduct => Arc::new(ConstantProductExecutor),
            ExecutorKind::Settlement => Arc::new(SettlementExecutor),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisExecutor {
    pub address: Address,
    pub kind: ExecutorKind,
    /// Overrides the configured activation delay; genesis executors are
    /// active immediately when absent.
    pub delay: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisBalance {
    pub token: Address,
    pub owner: Address,
    #[serde(deserialize_with = "de_amount")]
    pub amount: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisAllowance {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    #[serde(deserialize_with = "de_amount")]
    pub amount: Amount,
}

/// Initial chain state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Genesis {
    #[serde(default)]
    pub block_number: u64,
    /// Pools, vaults and other plain contracts.
    #[serde(default)]
    pub contracts: Vec<Address>,
    #[serde(default)]
    pub executors: Vec<GenesisExecutor>,
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,
    #[serde(default)]
    pub allowances: Vec<GenesisAllowance>,
}

impl Genesis {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read genesis file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("parse genesis file {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn build(&self, config: &AppConfig) -> Result<Node> {
        let mut chain = Chain::new(self.block_number);
        chain.deploy_contract(config.wrapped_native);
        for contract in &self.contracts {
            chain.deploy_contract(*contract);
        }
        for b in &self.balances {
            chain
                .bank
                .mint(b.token, b.owner, b.amount)
                .with_context(|| format!("mint {} of {} to {}", b.amount, b.token, b.owner))?;
        }
        // wrapped supply is backed by native coin held by the wrapper
        let wrapped_supply = self
            .balances
            .iter()
            .filter(|b| b.token == config.wrapped_native)
            .try_fold(0 as Amount, |acc, b| acc.checked_add(b.amount))
            .context("wrapped supply overflows")?;
        if wrapped_supply > 0 {
            chain
                .bank
                .mint(NATIVE, config.wrapped_native, wrapped_supply)
                .context("back wrapped supply")?;
        }
        for a in &self.allowances {
            chain.bank.approve(a.token, a.owner, a.spender, a.amount);
        }

        let mut router = Router::new(config.router_address, config.wrapped_native, config.admin)
            .context("create router")?
            .with_activation_delay(config.executor_activation_delay);
        for e in &self.executors {
            chain.deploy_executor(e.address, e.kind.instantiate());
            router
                .set_executors(&chain, config.admin, &[e.address], Some(e.delay.unwrap_or(0)))
                .with_context(|| format!("approve genesis executor {}", e.address))?;
        }

        info!(
            block = self.block_number,
            contracts = self.contracts.len(),
            executors = self.executors.len(),
            balances = self.balances.len(),
            "genesis applied"
        );
        Ok(Node { router, chain })
    }
}
