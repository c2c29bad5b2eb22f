use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt, H256, U256},
};
use std::sync::Arc;
use tracing::debug;

use crate::infrastructure::contracts::types::ContractError;

/// The wallet/provider capability the contract layer talks through.
///
/// A provider without a signer can still answer queries; `signer_address`
/// returning `None` is what makes bindings built on it read-only.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Chain id reported by the node behind this provider.
    fn chain_id(&self) -> u64;

    fn signer_address(&self) -> Option<Address>;

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ContractError>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, ContractError>;

    /// Signs and broadcasts; resolves once the node accepted the transaction
    /// into its pool.
    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256, ContractError>;

    async fn get_transaction_receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>, ContractError>;

    async fn get_block_number(&self) -> Result<u64, ContractError>;
}

pub type HttpSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

/// `WalletProvider` over any ethers middleware stack
#[derive(Debug)]
pub struct EthersWallet<M> {
    inner: Arc<M>,
    chain_id: u64,
}

impl<M: Middleware + 'static> EthersWallet<M> {
    /// Wraps `inner`, asking the node for its chain id once.
    pub async fn connect(inner: M) -> Result<Self, ContractError> {
        let chain_id = inner
            .get_chainid()
            .await
            .map_err(|e| ContractError::RpcError(e.to_string()))?
            .as_u64();
        debug!("Provider connected to chain {}", chain_id);

        Ok(Self {
            inner: Arc::new(inner),
            chain_id,
        })
    }

    pub fn inner(&self) -> &Arc<M> {
        &self.inner
    }
}

impl EthersWallet<Provider<Http>> {
    /// Read-only HTTP provider
    pub async fn http(rpc_url: &str) -> Result<Self, ContractError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ContractError::RpcError(e.to_string()))?;
        Self::connect(provider).await
    }
}

impl EthersWallet<HttpSigner> {
    /// HTTP provider with a local private key attached
    pub async fn http_with_signer(rpc_url: &str, private_key: &str) -> Result<Self, ContractError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ContractError::RpcError(e.to_string()))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ContractError::RpcError(e.to_string()))?
            .as_u64();

        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| ContractError::ConfigError(format!("Invalid private key: {}", e)))?
            .with_chain_id(chain_id);

        Ok(Self {
            inner: Arc::new(SignerMiddleware::new(provider, wallet)),
            chain_id,
        })
    }
}

#[async_trait]
impl<M> WalletProvider for EthersWallet<M>
where
    M: Middleware + 'static,
{
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn signer_address(&self) -> Option<Address> {
        self.inner.default_sender()
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ContractError> {
        self.inner
            .call(tx, None)
            .await
            .map_err(|e| ContractError::RpcError(e.to_string()))
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, ContractError> {
        self.inner
            .estimate_gas(tx, None)
            .await
            .map_err(|e| ContractError::SubmissionRejected(format!("Gas estimation failed: {}", e)))
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256, ContractError> {
        let pending = self
            .inner
            .send_transaction(tx, None)
            .await
            .map_err(|e| ContractError::SubmissionRejected(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    async fn get_transaction_receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>, ContractError> {
        self.inner
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ContractError::RpcError(e.to_string()))
    }

    async fn get_block_number(&self) -> Result<u64, ContractError> {
        let block = self
            .inner
            .get_block_number()
            .await
            .map_err(|e| ContractError::RpcError(e.to_string()))?;
        Ok(block.as_u64())
    }
}
