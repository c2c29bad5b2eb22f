use ethers::abi::{RawLog, StateMutability, Token};
use ethers::types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256};
use std::sync::Arc;
use tracing::debug;

use crate::infrastructure::contracts::connection::Connection;
use crate::infrastructure::contracts::schema::ContractSchema;
use crate::infrastructure::contracts::submitter::{BuiltTransaction, PendingTransaction, TransactionSubmitter, TxOptions};
use crate::infrastructure::contracts::types::{ContractError, Receipt};

/// Whether a binding may submit transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    ReadOnly,
    ReadWrite,
}

/// A deployed contract (address + schema) bound to one connection snapshot.
///
/// The mode is fixed at construction: read-write iff the connection carried a
/// signer at that moment.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    schema: Arc<ContractSchema>,
    address: Address,
    connection: Arc<Connection>,
    mode: BindingMode,
}

impl ContractBinding {
    pub fn new(schema: Arc<ContractSchema>, address: Address, connection: Arc<Connection>) -> Self {
        let mode = if connection.has_signer() {
            BindingMode::ReadWrite
        } else {
            BindingMode::ReadOnly
        };

        Self {
            schema,
            address,
            connection,
            mode,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn schema(&self) -> &Arc<ContractSchema> {
        &self.schema
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    pub fn is_writable(&self) -> bool {
        self.mode == BindingMode::ReadWrite
    }

    pub fn encode_call_data(&self, method: &str, args: &[Token]) -> Result<Bytes, ContractError> {
        self.schema.encode_call_data(method, args)
    }

    /// Read-only query against a `view`/`pure` method.
    pub async fn call(&self, method: &str, args: &[Token]) -> Result<Vec<Token>, ContractError> {
        let function = self.schema.function(method)?;
        if !ContractSchema::is_read_only(function) {
            return Err(ContractError::InvalidMethod(format!(
                "{}.{} mutates state and cannot be called read-only",
                self.schema.name(),
                method
            )));
        }

        let data = self.schema.encode_call_data(method, args)?;
        let tx = self.request(data, None);

        debug!("Calling {}.{} at {:?}", self.schema.name(), method, self.address);
        let raw = self.connection.provider().call(&tx).await?;
        self.schema.decode_output(method, &raw)
    }

    /// Validates and encodes a state-mutating call without sending it.
    pub fn build_transaction(
        &self,
        method: &str,
        args: &[Token],
        options: TxOptions,
    ) -> Result<BuiltTransaction, ContractError> {
        if self.mode == BindingMode::ReadOnly {
            return Err(ContractError::NoSigner {
                contract: self.schema.name().to_string(),
            });
        }

        let function = self.schema.function(method)?;
        if ContractSchema::is_read_only(function) {
            return Err(ContractError::InvalidMethod(format!(
                "{}.{} is read-only; use call",
                self.schema.name(),
                method
            )));
        }

        let value = options.value.unwrap_or_default();
        if !value.is_zero() && function.state_mutability != StateMutability::Payable {
            return Err(ContractError::EncodeError(format!(
                "{}.{} is not payable but {} wei was attached",
                self.schema.name(),
                method,
                value
            )));
        }

        let data = self.schema.encode_call_data(method, args)?;

        Ok(BuiltTransaction::new(
            self.schema.name(),
            method,
            self.address,
            data,
            value,
            options.gas_limit,
            self.connection.clone(),
        ))
    }

    /// State-mutating call; resolves once the network accepted it.
    pub async fn send(
        &self,
        method: &str,
        args: &[Token],
        value: Option<U256>,
    ) -> Result<PendingTransaction, ContractError> {
        let built = self.build_transaction(method, args, TxOptions { value, gas_limit: None })?;
        TransactionSubmitter::default().submit_built(built).await
    }

    pub async fn estimate_gas(
        &self,
        method: &str,
        args: &[Token],
        value: Option<U256>,
    ) -> Result<U256, ContractError> {
        let data = self.schema.encode_call_data(method, args)?;
        let tx = self.request(data, value);
        self.connection.provider().estimate_gas(&tx).await
    }

    /// Decodes every `event_name` log this contract emitted in `receipt`.
    pub fn decode_events(&self, receipt: &Receipt, event_name: &str) -> Result<Vec<ethers::abi::Log>, ContractError> {
        let event = self.schema.event(event_name)?;
        let topic0 = event.signature();

        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address && log.topics.first() == Some(&topic0))
            .map(|log| {
                event
                    .parse_log(RawLog {
                        topics: log.topics.clone(),
                        data: log.data.to_vec(),
                    })
                    .map_err(|e| ContractError::DecodeError(format!("{}: {}", event_name, e)))
            })
            .collect()
    }

    fn request(&self, data: Bytes, value: Option<U256>) -> TypedTransaction {
        let mut request = TransactionRequest::new().to(self.address).data(data);
        if let Some(value) = value {
            request = request.value(value);
        }
        if let Some(from) = self.connection.account() {
            request = request.from(from);
        }
        request.into()
    }
}
