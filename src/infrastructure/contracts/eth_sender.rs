use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};
use std::sync::Arc;

use crate::infrastructure::contracts::abis;
use crate::infrastructure::contracts::binding::ContractBinding;
use crate::infrastructure::contracts::connection::Connection;
use crate::infrastructure::contracts::submitter::{PendingTransaction, TransactionSubmitter, TxOptions};
use crate::infrastructure::contracts::tokens;
use crate::infrastructure::contracts::types::ContractError;

pub const SEND_ETH_AT_TIME: &str = "sendEthAtTime";

/// The contract that forwards ether to a recipient once a timestamp passed
#[derive(Debug, Clone)]
pub struct EthSenderContract {
    binding: ContractBinding,
}

impl EthSenderContract {
    pub fn new(connection: Arc<Connection>, address: Address) -> Result<Self, ContractError> {
        let schema = abis::load_eth_sender_schema()?;
        Ok(Self {
            binding: ContractBinding::new(schema, address, connection),
        })
    }

    pub fn binding(&self) -> &ContractBinding {
        &self.binding
    }

    pub fn address(&self) -> Address {
        self.binding.address()
    }

    /// Calldata for `sendEthAtTime(time, recipient)`, for handing to another
    /// contract that will make the call later. Needs no connection.
    pub fn encode_send_eth_at_time(time: U256, recipient: Address) -> Result<Bytes, ContractError> {
        abis::load_eth_sender_schema()?.encode_call_data(SEND_ETH_AT_TIME, &send_eth_at_time_args(time, recipient))
    }

    pub fn decode_send_eth_at_time(data: &[u8]) -> Result<(U256, Address), ContractError> {
        let mut decoded = abis::load_eth_sender_schema()?
            .decode_call_data(SEND_ETH_AT_TIME, data)?
            .into_iter();

        let time = tokens::next_uint(&mut decoded, "time")?;
        let recipient = tokens::next_address(&mut decoded, "recipient")?;
        Ok((time, recipient))
    }

    /// Calls `sendEthAtTime` directly, attaching `value` wei.
    pub async fn send_eth_at_time(
        &self,
        submitter: &TransactionSubmitter,
        time: U256,
        recipient: Address,
        value: U256,
    ) -> Result<PendingTransaction, ContractError> {
        submitter
            .submit(
                &self.binding,
                SEND_ETH_AT_TIME,
                &send_eth_at_time_args(time, recipient),
                TxOptions::with_value(value),
            )
            .await
    }
}

fn send_eth_at_time_args(time: U256, recipient: Address) -> [Token; 2] {
    [Token::Uint(time), Token::Address(recipient)]
}
