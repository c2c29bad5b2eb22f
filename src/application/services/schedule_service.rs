use chrono::{DateTime, Utc};
use ethers::types::{Address, Bytes, U256};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::{ScheduleTransferRequest, ScheduledTransfer, ValidatedTransfer};
use crate::domain::services::ServiceError;
use crate::infrastructure::contracts::eth_sender::EthSenderContract;
use crate::infrastructure::contracts::registry::{NewRequest, RegistryContract, RequestPage};
use crate::infrastructure::contracts::submitter::{ConfirmationPolicy, TransactionSubmitter, TxOptions};
use crate::infrastructure::contracts::connection::Connection;
use crate::infrastructure::contracts::types::{ContractError, NetworkConfig};

/// Extra wei sent with `newReq` on top of the transfer amount, covering the
/// registry's execution fee. 0.01 ETH.
pub const DEFAULT_FEE_BUFFER_WEI: u64 = 10_000_000_000_000_000;

/// Schedules delayed ether transfers through the registry
pub struct ScheduleService {
    eth_sender: EthSenderContract,
    registry: RegistryContract,
    submitter: TransactionSubmitter,
    fee_buffer: U256,
    new_req_gas_limit: U256,
}

impl ScheduleService {
    pub fn new(connection: Arc<Connection>, network: &NetworkConfig, fee_buffer: U256) -> Result<Self, ServiceError> {
        Self::with_policy(connection, network, fee_buffer, ConfirmationPolicy::from(&network.confirmation))
    }

    pub fn with_policy(
        connection: Arc<Connection>,
        network: &NetworkConfig,
        fee_buffer: U256,
        policy: ConfirmationPolicy,
    ) -> Result<Self, ServiceError> {
        let addresses = &network.contract_addresses;
        let eth_sender = EthSenderContract::new(connection.clone(), addresses.eth_sender)?;
        let registry = RegistryContract::new(connection, addresses.registry)?;

        Ok(Self {
            eth_sender,
            registry,
            submitter: TransactionSubmitter::new(policy),
            fee_buffer,
            new_req_gas_limit: U256::from(network.gas_settings.new_req_gas_limit),
        })
    }

    pub fn registry(&self) -> &RegistryContract {
        &self.registry
    }

    pub fn submitter(&self) -> &TransactionSubmitter {
        &self.submitter
    }

    /// The `sendEthAtTime` calldata the registry will replay at `send_at`.
    pub fn build_schedule_calldata(transfer: &ValidatedTransfer) -> Result<Bytes, ServiceError> {
        Ok(EthSenderContract::encode_send_eth_at_time(
            transfer.send_at_unix(),
            transfer.recipient,
        )?)
    }

    /// Registry request forwarding `amount_wei` to the sender contract
    pub fn build_new_request(&self, transfer: &ValidatedTransfer) -> Result<NewRequest, ServiceError> {
        Ok(NewRequest {
            target: self.eth_sender.address(),
            referer: Address::zero(),
            call_data: Self::build_schedule_calldata(transfer)?,
            eth_for_call: transfer.amount_wei,
            verify_user: false,
            insert_fee_amount: false,
            pay_with_auto: false,
            is_alive: false,
        })
    }

    /// Validates `request` against `now`, registers it and waits for the
    /// registry transaction to be mined.
    pub async fn schedule_transfer(
        &self,
        request: &ScheduleTransferRequest,
        now: DateTime<Utc>,
    ) -> Result<ScheduledTransfer, ServiceError> {
        let transfer = request.validate(now)?;
        self.schedule_validated(&transfer).await
    }

    pub async fn schedule_validated(&self, transfer: &ValidatedTransfer) -> Result<ScheduledTransfer, ServiceError> {
        let new_request = self.build_new_request(transfer)?;
        let value = transfer
            .amount_wei
            .checked_add(self.fee_buffer)
            .ok_or_else(|| ContractError::EncodeError("value overflows uint256".to_string()))?;

        info!(
            "Scheduling {} wei to {:?} at {}",
            transfer.amount_wei, transfer.recipient, transfer.send_at
        );

        let options = TxOptions::with_value(value).gas_limit(self.new_req_gas_limit);
        let pending = self.registry.new_req(&self.submitter, &new_request, options).await?;
        let receipt = self.submitter.await_confirmation(pending).await?;

        let added = match self.registry.request_added(&receipt) {
            Ok(added) => added,
            Err(e) => {
                warn!("Could not decode HashedReqAdded from {:?}: {}", receipt.tx_hash, e);
                None
            }
        };

        Ok(ScheduledTransfer {
            request_id: added.as_ref().map(|a| a.id),
            request_hash: added.as_ref().map(|a| a.request.hash()),
            transaction_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            call_data: new_request.call_data,
            value_sent: value,
        })
    }

    pub async fn list_requests(&self, page: u64, page_size: u64) -> Result<RequestPage, ServiceError> {
        Ok(self.registry.hashed_reqs_page(page, page_size).await?)
    }
}
