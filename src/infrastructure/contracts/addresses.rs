use ethers::types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::str::FromStr;
use crate::infrastructure::contracts::types::{ContractAddresses, ContractError};

pub const ROPSTEN_NETWORK_ID: u64 = 3;

/// The two contracts the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownContract {
    EthSender,
    Registry,
}

impl KnownContract {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownContract::EthSender => "ethSender",
            KnownContract::Registry => "registry",
        }
    }
}

impl fmt::Display for KnownContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnownContract {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethSender" => Ok(KnownContract::EthSender),
            "registry" => Ok(KnownContract::Registry),
            other => Err(ContractError::ConfigError(format!("Unknown contract: {}", other))),
        }
    }
}

impl ContractAddresses {
    pub fn get(&self, contract: KnownContract) -> Address {
        match contract {
            KnownContract::EthSender => self.eth_sender,
            KnownContract::Registry => self.registry,
        }
    }
}

// ============ DEPLOYED ADDRESSES ============

pub fn load_ropsten_addresses() -> Result<ContractAddresses, ContractError> {
    Ok(ContractAddresses {
        eth_sender: parse_address("0xfa0a8b60b2af537dec9832f72fd233e93e4c8463", "ethSender")?,
        registry: parse_address("0x3C901dc595105934D61DB70C2170D3a6834Cb8B7", "registry")?,
    })
}

/// Get contract addresses by network id
pub fn get_contract_addresses_by_network_id(network_id: u64) -> Result<ContractAddresses, ContractError> {
    match network_id {
        ROPSTEN_NETWORK_ID => load_ropsten_addresses(),
        _ => Err(ContractError::UnsupportedNetwork(network_id)),
    }
}

pub fn get_contract_address(network_id: u64, contract: KnownContract) -> Result<Address, ContractError> {
    Ok(get_contract_addresses_by_network_id(network_id)?.get(contract))
}

pub fn parse_address(value: &str, label: &str) -> Result<Address, ContractError> {
    value
        .parse::<Address>()
        .map_err(|e| ContractError::InvalidAddress(format!("Invalid address for {}: {}", label, e)))
}

// ============ ADDRESS OVERRIDES ============

/// One network entry of an addresses file, e.g.
/// `{"31337": {"rpcUrl": "http://localhost:8545", "ethSender": "0x..", "registry": "0x.."}}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressOverride {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub explorer_url: Option<String>,
    pub eth_sender: String,
    pub registry: String,
}

impl AddressOverride {
    pub fn addresses(&self) -> Result<ContractAddresses, ContractError> {
        Ok(ContractAddresses {
            eth_sender: parse_address(&self.eth_sender, "ethSender")?,
            registry: parse_address(&self.registry, "registry")?,
        })
    }
}

pub fn parse_address_overrides(json: &str) -> Result<HashMap<u64, AddressOverride>, ContractError> {
    serde_json::from_str(json)
        .map_err(|e| ContractError::ConfigError(format!("Failed to parse addresses JSON: {}", e)))
}

/// Load address overrides from JSON file
pub fn load_addresses_from_file(file_path: &str) -> Result<HashMap<u64, AddressOverride>, ContractError> {
    let content = fs::read_to_string(file_path)
        .map_err(|e| ContractError::ConfigError(format!("Failed to read addresses file {}: {}", file_path, e)))?;

    parse_address_overrides(&content)
}
