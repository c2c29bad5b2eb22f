use ethers::types::Address;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::info;

use crate::infrastructure::contracts::addresses::{self, AddressOverride, KnownContract, ROPSTEN_NETWORK_ID};
use crate::infrastructure::contracts::types::{
    ConfirmationSettings, ContractError, GasSettings, NativeCurrency, NetworkConfig,
};

const NEW_REQ_GAS_LIMIT: u64 = 500_000;

fn ether() -> NativeCurrency {
    NativeCurrency {
        name: "Ether".to_string(),
        symbol: "ETH".to_string(),
        decimals: 18,
    }
}

fn gas_settings(block_time_seconds: u64) -> GasSettings {
    GasSettings {
        new_req_gas_limit: NEW_REQ_GAS_LIMIT,
        block_time_seconds,
    }
}

/// Poll about once per block; give up after 50 blocks.
fn confirmation_settings(block_time_seconds: u64) -> ConfirmationSettings {
    let block_time = block_time_seconds.max(1);
    ConfirmationSettings {
        timeout: Duration::from_secs(block_time * 50),
        poll_interval: Duration::from_secs(block_time),
        confirmations: 1,
    }
}

/// Ropsten testnet configuration
fn get_ropsten_config(infura_project_id: Option<&str>) -> Result<NetworkConfig, ContractError> {
    Ok(NetworkConfig {
        network_id: ROPSTEN_NETWORK_ID,
        label: "Ropsten".to_string(),
        rpc_url: format!("https://ropsten.infura.io/v3/{}", infura_project_id.unwrap_or_default()),
        explorer_url: "https://ropsten.etherscan.io".to_string(),
        native_currency: ether(),
        gas_settings: gas_settings(15),
        confirmation: confirmation_settings(15),
        contract_addresses: addresses::load_ropsten_addresses()?,
    })
}

/// Get network configuration by network id
pub fn get_network_config_by_id(network_id: u64, infura_project_id: Option<&str>) -> Result<NetworkConfig, ContractError> {
    match network_id {
        ROPSTEN_NETWORK_ID => get_ropsten_config(infura_project_id),
        _ => Err(ContractError::UnsupportedNetwork(network_id)),
    }
}

/// The networks the client can talk to, keyed by network id.
///
/// Starts from the built-in deployments; an addresses file can redirect a
/// known network or add one (a local node, typically).
#[derive(Debug, Clone)]
pub struct NetworkTable {
    networks: BTreeMap<u64, NetworkConfig>,
}

impl NetworkTable {
    pub fn builtin(infura_project_id: Option<&str>) -> Result<Self, ContractError> {
        let mut networks = BTreeMap::new();
        networks.insert(ROPSTEN_NETWORK_ID, get_ropsten_config(infura_project_id)?);
        Ok(Self { networks })
    }

    pub fn with_overrides(mut self, overrides: HashMap<u64, AddressOverride>) -> Result<Self, ContractError> {
        for (network_id, entry) in overrides {
            let contract_addresses = entry.addresses()?;

            match self.networks.get_mut(&network_id) {
                Some(config) => {
                    config.contract_addresses = contract_addresses;
                    if let Some(rpc_url) = entry.rpc_url {
                        config.rpc_url = rpc_url;
                    }
                    if let Some(explorer_url) = entry.explorer_url {
                        config.explorer_url = explorer_url;
                    }
                }
                None => {
                    let rpc_url = entry.rpc_url.ok_or_else(|| {
                        ContractError::ConfigError(format!("Network {} override needs an rpcUrl", network_id))
                    })?;
                    self.networks.insert(
                        network_id,
                        NetworkConfig {
                            network_id,
                            label: entry.label.unwrap_or_else(|| format!("Network {}", network_id)),
                            rpc_url,
                            explorer_url: entry.explorer_url.unwrap_or_default(),
                            native_currency: ether(),
                            gas_settings: gas_settings(1),
                            confirmation: confirmation_settings(1),
                            contract_addresses,
                        },
                    );
                }
            }
            info!("Applied address override for network {}", network_id);
        }

        Ok(self)
    }

    pub fn get(&self, network_id: u64) -> Result<&NetworkConfig, ContractError> {
        self.networks
            .get(&network_id)
            .ok_or(ContractError::UnsupportedNetwork(network_id))
    }

    pub fn contract_address(&self, network_id: u64, contract: KnownContract) -> Result<Address, ContractError> {
        Ok(self.get(network_id)?.contract_addresses.get(contract))
    }

    pub fn explorer_url(&self, network_id: u64) -> Result<&str, ContractError> {
        Ok(&self.get(network_id)?.explorer_url)
    }

    pub fn supported_network_ids(&self) -> Vec<u64> {
        self.networks.keys().copied().collect()
    }

    pub fn supported_network_urls(&self) -> BTreeMap<u64, String> {
        self.networks
            .iter()
            .map(|(id, config)| (*id, config.rpc_url.clone()))
            .collect()
    }

    pub fn is_supported(&self, network_id: u64) -> bool {
        self.networks.contains_key(&network_id)
    }
}
