use std::fs;
use std::sync::Arc;
use crate::infrastructure::contracts::schema::ContractSchema;
use crate::infrastructure::contracts::types::ContractError;

const ETH_SENDER_ABI: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/abis/eth_sender_abi.json"));
const REGISTRY_ABI: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/abis/registry_abi.json"));

pub const ETH_SENDER_METHODS: &[&str] = &["sendEthAtTime"];

pub const REGISTRY_METHODS: &[&str] = &[
    "newReq",
    "newReqPaySpecific",
    "cancelHashedReq",
    "executeHashedReq",
    "getHashedReqs",
    "getHashedReqsLen",
    "getHashedReqsSlice",
];

pub fn load_eth_sender_schema() -> Result<Arc<ContractSchema>, ContractError> {
    ContractSchema::from_json("ethSender", ETH_SENDER_ABI, ETH_SENDER_METHODS).map(Arc::new)
}

pub fn load_registry_schema() -> Result<Arc<ContractSchema>, ContractError> {
    ContractSchema::from_json("registry", REGISTRY_ABI, REGISTRY_METHODS).map(Arc::new)
}

/// Loads a schema from a JSON ABI on disk instead of the embedded copy.
pub fn load_schema_from_file(name: &str, path: &str, required: &[&str]) -> Result<Arc<ContractSchema>, ContractError> {
    let abi_content = fs::read_to_string(path)
        .map_err(|e| ContractError::AbiError(format!("Failed to read ABI file {}: {}", path, e)))?;

    ContractSchema::from_json(name, &abi_content, required).map(Arc::new)
}
