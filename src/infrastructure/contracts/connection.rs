use ethers::types::Address;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::infrastructure::contracts::provider::{EthersWallet, WalletProvider};
use crate::infrastructure::contracts::types::ContractError;

/// A wallet connection snapshot: provider, optional account and the selected
/// network. Never mutated; account or network changes produce a new value.
#[derive(Clone)]
pub struct Connection {
    provider: Arc<dyn WalletProvider>,
    account: Option<Address>,
    network_id: u64,
}

impl Connection {
    pub fn new(provider: Arc<dyn WalletProvider>, network_id: u64) -> Self {
        let account = provider.signer_address();
        Self {
            provider,
            account,
            network_id,
        }
    }

    /// Opens an HTTP connection, signing with `private_key` when one is given.
    pub async fn connect_http(
        rpc_url: &str,
        private_key: Option<&str>,
        network_id: u64,
    ) -> Result<Self, ContractError> {
        let provider: Arc<dyn WalletProvider> = match private_key {
            Some(key) => Arc::new(EthersWallet::http_with_signer(rpc_url, key).await?),
            None => Arc::new(EthersWallet::http(rpc_url).await?),
        };

        let connection = Self::new(provider, network_id);
        info!(
            "Connected to network {} (account: {})",
            network_id,
            connection
                .account
                .map(|a| format!("{:?}", a))
                .unwrap_or_else(|| "read-only".to_string())
        );
        Ok(connection)
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    pub fn has_signer(&self) -> bool {
        self.account.is_some()
    }

    /// True when the wallet is on the chain this connection was opened for.
    pub fn is_on_expected_network(&self) -> bool {
        self.provider.chain_id() == self.network_id
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("account", &self.account)
            .field("network_id", &self.network_id)
            .field("chain_id", &self.provider.chain_id())
            .finish()
    }
}

/// Holder of the single active connection.
///
/// Callers take a `snapshot()` when they start an operation and keep it for
/// the operation's lifetime, so a wallet switch never retargets work that is
/// already in flight.
#[derive(Clone)]
pub struct ActiveConnection {
    tx: Arc<watch::Sender<Option<Arc<Connection>>>>,
}

impl ActiveConnection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Option<Arc<Connection>> {
        self.tx.borrow().clone()
    }

    /// Like `snapshot`, but a missing connection is an error.
    pub fn require(&self) -> Result<Arc<Connection>, ContractError> {
        self.snapshot()
            .ok_or_else(|| ContractError::ConfigError("No wallet connected".to_string()))
    }

    /// Installs `connection` wholesale, returning the one it displaced.
    pub fn replace(&self, connection: Connection) -> Option<Arc<Connection>> {
        info!(
            "Active connection replaced: network {}, account {:?}",
            connection.network_id, connection.account
        );
        self.tx.send_replace(Some(Arc::new(connection)))
    }

    pub fn disconnect(&self) -> Option<Arc<Connection>> {
        info!("Wallet disconnected");
        self.tx.send_replace(None)
    }

    /// Receiver that observes every replacement.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Connection>>> {
        self.tx.subscribe()
    }
}

impl Default for ActiveConnection {
    fn default() -> Self {
        Self::new()
    }
}
