use ethers::types::U256;
use serde::Deserialize;
use std::time::Duration;

use crate::application::services::schedule_service::DEFAULT_FEE_BUFFER_WEI;
use crate::infrastructure::contracts::addresses::{load_addresses_from_file, ROPSTEN_NETWORK_ID};
use crate::infrastructure::contracts::config::NetworkTable;
use crate::infrastructure::contracts::submitter::ConfirmationPolicy;
use crate::infrastructure::contracts::types::{ContractError, NetworkConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_network_id")]
    pub network_id: u64,

    // Overrides the network table's RPC URL
    #[serde(default)]
    pub rpc_url: Option<String>,

    #[serde(default)]
    pub infura_project_id: Option<String>,

    // Without a key the connection is read-only
    #[serde(default)]
    pub private_key: Option<String>,

    #[serde(default)]
    pub confirmation_timeout_secs: Option<u64>,

    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    #[serde(default = "default_fee_buffer_wei")]
    pub fee_buffer_wei: String,

    // JSON file of per-network address overrides
    #[serde(default)]
    pub addresses_file: Option<String>,
}

fn default_network_id() -> u64 {
    ROPSTEN_NETWORK_ID
}

fn default_fee_buffer_wei() -> String {
    DEFAULT_FEE_BUFFER_WEI.to_string()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self::from_environment(config::Environment::default())?)
    }

    pub fn from_environment(environment: config::Environment) -> Result<Self, ContractError> {
        let config = config::Config::builder().add_source(environment).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Built-in networks plus whatever `addresses_file` adds or redirects
    pub fn network_table(&self) -> Result<NetworkTable, ContractError> {
        let table = NetworkTable::builtin(self.infura_project_id.as_deref())?;
        match &self.addresses_file {
            Some(path) => table.with_overrides(load_addresses_from_file(path)?),
            None => Ok(table),
        }
    }

    /// The configured network, with `rpc_url` applied
    pub fn network(&self) -> Result<NetworkConfig, ContractError> {
        let mut network = self.network_table()?.get(self.network_id)?.clone();
        if let Some(rpc_url) = &self.rpc_url {
            network.rpc_url = rpc_url.clone();
        }
        Ok(network)
    }

    pub fn confirmation_policy(&self, network: &NetworkConfig) -> ConfirmationPolicy {
        let mut policy = ConfirmationPolicy::from(&network.confirmation);
        if let Some(secs) = self.confirmation_timeout_secs {
            policy.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.poll_interval_ms {
            policy.poll_interval = Duration::from_millis(ms.max(1));
        }
        policy
    }

    pub fn fee_buffer(&self) -> Result<U256, ContractError> {
        U256::from_dec_str(self.fee_buffer_wei.trim())
            .map_err(|e| ContractError::ConfigError(format!("Invalid FEE_BUFFER_WEI: {}", e)))
    }
}
