use serde::{Deserialize, Serialize};
use ethers::types::{Address, Log, TransactionReceipt, H256, U256};
use std::time::Duration;

// ============ CONTRACT CONFIGURATION TYPES ============

/// Network configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network_id: u64,
    pub label: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_currency: NativeCurrency,
    pub gas_settings: GasSettings,
    pub confirmation: ConfirmationSettings,
    pub contract_addresses: ContractAddresses,
}

/// Native currency information
#[derive(Debug, Clone)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Contract addresses for a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAddresses {
    pub eth_sender: Address,
    pub registry: Address,
}

/// Gas settings for a network
#[derive(Debug, Clone)]
pub struct GasSettings {
    /// Ceiling used for `newReq`; estimation through the registry's
    /// forwarding calls under-reports.
    pub new_req_gas_limit: u64,
    pub block_time_seconds: u64,
}

/// How long and how often to wait for a transaction to be mined
#[derive(Debug, Clone)]
pub struct ConfirmationSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub confirmations: u64,
}

// ============ ERROR TYPES ============

/// Contract interaction errors
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("No signer: contract {contract} is bound read-only")]
    NoSigner { contract: String },

    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Transaction {tx_hash:?} reverted in block {block_number}")]
    Reverted { tx_hash: H256, block_number: u64 },

    #[error("Transaction {tx_hash:?} not mined after {waited_secs}s")]
    TransactionDropped { tx_hash: H256, waited_secs: u64 },

    #[error("Unsupported network id: '{0}'")]
    UnsupportedNetwork(u64),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("ABI error: {0}")]
    AbiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ContractError {
    fn from(err: config::ConfigError) -> Self {
        ContractError::ConfigError(err.to_string())
    }
}

// ============ TRANSACTION TYPES ============

/// Lifecycle of a state-mutating call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Built,
    Submitted,
    Confirmed,
    Failed,
}

/// Confirmation record of a mined, successful transaction
#[derive(Debug, Clone)]
pub struct Receipt {
    pub tx_hash: H256,
    pub block_number: u64,
    pub block_hash: Option<H256>,
    pub gas_used: Option<U256>,
    pub effective_gas_price: Option<U256>,
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Converts a mined receipt; `None` while the transaction is still pending.
    pub fn from_mined(receipt: TransactionReceipt) -> Option<Self> {
        let block_number = receipt.block_number?.as_u64();
        Some(Self {
            tx_hash: receipt.transaction_hash,
            block_number,
            block_hash: receipt.block_hash,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            logs: receipt.logs,
        })
    }
}

/// Terminal state of a submitted transaction
#[derive(Debug)]
pub enum TxOutcome {
    Confirmed(Receipt),
    Failed(ContractError),
}

impl TxOutcome {
    pub fn status(&self) -> TxStatus {
        match self {
            TxOutcome::Confirmed(_) => TxStatus::Confirmed,
            TxOutcome::Failed(_) => TxStatus::Failed,
        }
    }

    pub fn into_result(self) -> Result<Receipt, ContractError> {
        match self {
            TxOutcome::Confirmed(receipt) => Ok(receipt),
            TxOutcome::Failed(err) => Err(err),
        }
    }
}

impl From<Result<Receipt, ContractError>> for TxOutcome {
    fn from(result: Result<Receipt, ContractError>) -> Self {
        match result {
            Ok(receipt) => TxOutcome::Confirmed(receipt),
            Err(err) => TxOutcome::Failed(err),
        }
    }
}
