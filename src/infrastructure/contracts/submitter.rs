use ethers::abi::Token;
use ethers::types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, H256, U256, U64};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::infrastructure::contracts::binding::ContractBinding;
use crate::infrastructure::contracts::connection::Connection;
use crate::infrastructure::contracts::types::{ConfirmationSettings, ContractError, Receipt, TxOutcome, TxStatus};

/// Per-transaction overrides
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    /// Wei attached to the call
    pub value: Option<U256>,
    /// Fixed gas ceiling; estimated through the provider when absent
    pub gas_limit: Option<U256>,
}

impl TxOptions {
    pub fn with_value(value: U256) -> Self {
        Self {
            value: Some(value),
            gas_limit: None,
        }
    }

    pub fn gas_limit(mut self, gas_limit: impl Into<U256>) -> Self {
        self.gas_limit = Some(gas_limit.into());
        self
    }
}

/// A validated, encoded call that has not been sent yet
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    contract: String,
    method: String,
    to: Address,
    data: Bytes,
    value: U256,
    gas_limit: Option<U256>,
    connection: Arc<Connection>,
}

impl BuiltTransaction {
    pub(crate) fn new(
        contract: &str,
        method: &str,
        to: Address,
        data: Bytes,
        value: U256,
        gas_limit: Option<U256>,
        connection: Arc<Connection>,
    ) -> Self {
        Self {
            contract: contract.to_string(),
            method: method.to_string(),
            to,
            data,
            value,
            gas_limit,
            connection,
        }
    }

    pub fn status(&self) -> TxStatus {
        TxStatus::Built
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn gas_limit(&self) -> Option<U256> {
        self.gas_limit
    }
}

/// A transaction the network accepted but that is not yet mined.
///
/// Holds the connection snapshot that sent it; receipts are always fetched
/// through that snapshot, even if the active wallet changes meanwhile.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    tx_hash: H256,
    contract: String,
    method: String,
    connection: Arc<Connection>,
    submitted_at: Instant,
}

impl PendingTransaction {
    pub fn tx_hash(&self) -> H256 {
        self.tx_hash
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn status(&self) -> TxStatus {
        TxStatus::Submitted
    }

    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }
}

/// Bounded wait for block inclusion
#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub confirmations: u64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(4),
            confirmations: 1,
        }
    }
}

impl From<&ConfirmationSettings> for ConfirmationPolicy {
    fn from(settings: &ConfirmationSettings) -> Self {
        Self {
            timeout: settings.timeout,
            poll_interval: settings.poll_interval,
            confirmations: settings.confirmations,
        }
    }
}

/// Sends state-mutating calls and tracks them to a terminal state.
///
/// Nothing here retries: a rejected, reverted or dropped transaction is
/// returned to the caller, who decides whether to submit again.
#[derive(Debug, Clone, Default)]
pub struct TransactionSubmitter {
    policy: ConfirmationPolicy,
}

impl TransactionSubmitter {
    pub fn new(policy: ConfirmationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn build(
        &self,
        binding: &ContractBinding,
        method: &str,
        args: &[Token],
        options: TxOptions,
    ) -> Result<BuiltTransaction, ContractError> {
        binding.build_transaction(method, args, options)
    }

    pub async fn submit(
        &self,
        binding: &ContractBinding,
        method: &str,
        args: &[Token],
        options: TxOptions,
    ) -> Result<PendingTransaction, ContractError> {
        let built = self.build(binding, method, args, options)?;
        self.submit_built(built).await
    }

    pub async fn submit_built(&self, built: BuiltTransaction) -> Result<PendingTransaction, ContractError> {
        let connection = built.connection.clone();
        let from = connection.account().ok_or_else(|| ContractError::NoSigner {
            contract: built.contract.clone(),
        })?;

        if !connection.is_on_expected_network() {
            return Err(ContractError::SubmissionRejected(format!(
                "wallet is on chain {} but the connection targets network {}",
                connection.provider().chain_id(),
                connection.network_id()
            )));
        }

        let mut tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(built.to)
            .data(built.data.clone())
            .value(built.value)
            .into();

        let gas = match built.gas_limit {
            Some(gas) => gas,
            None => connection.provider().estimate_gas(&tx).await?,
        };
        tx.set_gas(gas);

        debug!(
            "Submitting {}.{} to {:?} (value: {}, gas: {})",
            built.contract, built.method, built.to, built.value, gas
        );

        let tx_hash = connection.provider().send_transaction(tx).await.map_err(|e| {
            error!("{}.{} submission failed: {}", built.contract, built.method, e);
            e
        })?;

        info!("{}.{} transaction hash: {:?}", built.contract, built.method, tx_hash);

        Ok(PendingTransaction {
            tx_hash,
            contract: built.contract,
            method: built.method,
            connection,
            submitted_at: Instant::now(),
        })
    }

    /// Suspends until `pending` is mined, reverts, or the policy's horizon
    /// passes. Consumes the handle: it reaches exactly one terminal state.
    pub async fn await_confirmation(&self, pending: PendingTransaction) -> Result<Receipt, ContractError> {
        let tx_hash = pending.tx_hash;
        let provider = pending.connection.provider().clone();
        let confirmations = self.policy.confirmations.max(1);

        let mut ticker = interval(self.policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let wait = async move {
            loop {
                ticker.tick().await;

                let raw = match provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(raw)) => raw,
                    Ok(None) => {
                        debug!("Transaction {:?} still pending", tx_hash);
                        continue;
                    }
                    Err(e) => {
                        warn!("Receipt lookup for {:?} failed: {}", tx_hash, e);
                        continue;
                    }
                };

                let reverted = raw.status == Some(U64::zero());
                let receipt = match Receipt::from_mined(raw) {
                    Some(receipt) => receipt,
                    None => continue,
                };

                if reverted {
                    return Err(ContractError::Reverted {
                        tx_hash,
                        block_number: receipt.block_number,
                    });
                }

                if confirmations > 1 {
                    match provider.get_block_number().await {
                        Ok(head) if head + 1 >= receipt.block_number + confirmations => {}
                        Ok(head) => {
                            debug!(
                                "Transaction {:?} has {} of {} confirmations",
                                tx_hash,
                                (head + 1).saturating_sub(receipt.block_number),
                                confirmations
                            );
                            continue;
                        }
                        Err(e) => {
                            warn!("Block number lookup failed: {}", e);
                            continue;
                        }
                    }
                }

                return Ok(receipt);
            }
        };

        let result = match timeout(self.policy.timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(ContractError::TransactionDropped {
                tx_hash,
                waited_secs: self.policy.timeout.as_secs(),
            }),
        };

        match &result {
            Ok(receipt) => info!(
                "{}.{} confirmed in block {} after {:?} ({:?})",
                pending.contract,
                pending.method,
                receipt.block_number,
                pending.elapsed(),
                tx_hash
            ),
            Err(e) => error!("{}.{} failed: {}", pending.contract, pending.method, e),
        }

        result
    }

    /// Same as `await_confirmation`, as a terminal state value.
    pub async fn resolve(&self, pending: PendingTransaction) -> TxOutcome {
        self.await_confirmation(pending).await.into()
    }

    pub async fn submit_and_confirm(
        &self,
        binding: &ContractBinding,
        method: &str,
        args: &[Token],
        options: TxOptions,
    ) -> Result<Receipt, ContractError> {
        let pending = self.submit(binding, method, args, options).await?;
        self.await_confirmation(pending).await
    }
}
