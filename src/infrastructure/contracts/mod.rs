// Contract integration module
// This module handles all smart contract interactions

pub mod abis;
pub mod addresses;
pub mod binding;
pub mod config;
pub mod connection;
pub mod eth_sender;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod submitter;
pub mod tokens;
pub mod types;

// Re-export main components for easy access
pub use binding::{BindingMode, ContractBinding};
pub use connection::{ActiveConnection, Connection};
pub use eth_sender::EthSenderContract;
pub use provider::{EthersWallet, WalletProvider};
pub use registry::{AddedRequest, NewRequest, RegistryContract, RegistryRequest, RequestPage};
pub use schema::ContractSchema;
pub use submitter::{BuiltTransaction, ConfirmationPolicy, PendingTransaction, TransactionSubmitter, TxOptions};
pub use types::*;
