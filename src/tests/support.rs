// In-memory wallet for driving the contract layer without a node.

use async_trait::async_trait;
use ethers::abi::{self, Token};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, Log, TransactionReceipt, H256, U256, U64,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::infrastructure::contracts::config::get_network_config_by_id;
use crate::infrastructure::contracts::connection::Connection;
use crate::infrastructure::contracts::provider::WalletProvider;
use crate::infrastructure::contracts::registry::RegistryRequest;
use crate::infrastructure::contracts::submitter::ConfirmationPolicy;
use crate::infrastructure::contracts::types::{ContractError, NetworkConfig};

pub const ROPSTEN: u64 = 3;
pub const MINED_BLOCK: u64 = 100;

pub fn signer() -> Address {
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
}

pub fn recipient() -> Address {
    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap()
}

pub fn ropsten() -> NetworkConfig {
    get_network_config_by_id(ROPSTEN, Some("test")).unwrap()
}

pub fn fast_policy() -> ConfirmationPolicy {
    ConfirmationPolicy {
        timeout: Duration::from_secs(60),
        poll_interval: Duration::from_secs(1),
        confirmations: 1,
    }
}

/// What `get_transaction_receipt` reports for a sent transaction
#[derive(Debug, Clone)]
pub enum ReceiptPlan {
    /// Pending for `after_polls` lookups, then mined
    Mined { after_polls: usize, success: bool },
    Never,
}

struct WalletState {
    call_results: VecDeque<Result<Bytes, String>>,
    estimate: Result<U256, String>,
    send_error: Option<String>,
    receipt_plan: ReceiptPlan,
    receipt_errors: usize,
    receipt_logs: Vec<Log>,
    head: u64,
    polls: HashMap<H256, usize>,
    calls: Vec<TypedTransaction>,
    estimates: usize,
    sent: Vec<TypedTransaction>,
    block_lookups: usize,
}

pub struct ScriptedWallet {
    chain_id: u64,
    signer: Option<Address>,
    state: Mutex<WalletState>,
}

impl ScriptedWallet {
    pub fn new(chain_id: u64, signer: Option<Address>) -> Self {
        Self {
            chain_id,
            signer,
            state: Mutex::new(WalletState {
                call_results: VecDeque::new(),
                estimate: Ok(U256::from(90_000)),
                send_error: None,
                receipt_plan: ReceiptPlan::Mined {
                    after_polls: 0,
                    success: true,
                },
                receipt_errors: 0,
                receipt_logs: Vec::new(),
                head: MINED_BLOCK,
                polls: HashMap::new(),
                calls: Vec::new(),
                estimates: 0,
                sent: Vec::new(),
                block_lookups: 0,
            }),
        }
    }

    pub fn signing() -> Self {
        Self::new(ROPSTEN, Some(signer()))
    }

    pub fn read_only() -> Self {
        Self::new(ROPSTEN, None)
    }

    pub fn with_call_output(self, tokens: &[Token]) -> Self {
        self.push_call(Ok(Bytes::from(abi::encode(tokens))));
        self
    }

    pub fn with_raw_call_output(self, raw: Bytes) -> Self {
        self.push_call(Ok(raw));
        self
    }

    pub fn with_estimate(self, gas: u64) -> Self {
        self.state.lock().unwrap().estimate = Ok(U256::from(gas));
        self
    }

    pub fn failing_estimate(self, reason: &str) -> Self {
        self.state.lock().unwrap().estimate = Err(reason.to_string());
        self
    }

    pub fn failing_send(self, reason: &str) -> Self {
        self.state.lock().unwrap().send_error = Some(reason.to_string());
        self
    }

    pub fn receipts(self, plan: ReceiptPlan) -> Self {
        self.state.lock().unwrap().receipt_plan = plan;
        self
    }

    /// First `count` receipt lookups fail with an RPC error
    pub fn flaky_receipts(self, count: usize) -> Self {
        self.state.lock().unwrap().receipt_errors = count;
        self
    }

    pub fn with_receipt_logs(self, logs: Vec<Log>) -> Self {
        self.state.lock().unwrap().receipt_logs = logs;
        self
    }

    fn push_call(&self, result: Result<Bytes, String>) {
        self.state.lock().unwrap().call_results.push_back(result);
    }

    pub fn sent(&self) -> Vec<TypedTransaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn calls(&self) -> Vec<TypedTransaction> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn polls(&self, tx_hash: H256) -> usize {
        self.state.lock().unwrap().polls.get(&tx_hash).copied().unwrap_or(0)
    }

    /// Every request that reached the "network"
    pub fn network_hits(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.len()
            + state.estimates
            + state.sent.len()
            + state.polls.values().sum::<usize>()
            + state.block_lookups
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn signer_address(&self) -> Option<Address> {
        self.signer
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ContractError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(tx.clone());
        match state.call_results.pop_front() {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(reason)) => Err(ContractError::RpcError(reason)),
            None => Err(ContractError::RpcError("no scripted call output".to_string())),
        }
    }

    async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256, ContractError> {
        let mut state = self.state.lock().unwrap();
        state.estimates += 1;
        state.estimate.clone().map_err(ContractError::SubmissionRejected)
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256, ContractError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.send_error {
            return Err(ContractError::SubmissionRejected(reason.clone()));
        }
        state.sent.push(tx);
        Ok(H256::from_low_u64_be(state.sent.len() as u64))
    }

    async fn get_transaction_receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>, ContractError> {
        let mut state = self.state.lock().unwrap();
        let polls = {
            let polls = state.polls.entry(tx_hash).or_insert(0);
            *polls += 1;
            *polls
        };

        if state.receipt_errors > 0 {
            state.receipt_errors -= 1;
            return Err(ContractError::RpcError("connection reset".to_string()));
        }

        match state.receipt_plan {
            ReceiptPlan::Mined { after_polls, success } if polls > after_polls => Ok(Some(TransactionReceipt {
                transaction_hash: tx_hash,
                block_number: Some(U64::from(MINED_BLOCK)),
                block_hash: Some(H256::repeat_byte(0xbb)),
                gas_used: Some(U256::from(21_000)),
                status: Some(U64::from(success as u64)),
                logs: state.receipt_logs.clone(),
                ..Default::default()
            })),
            _ => Ok(None),
        }
    }

    async fn get_block_number(&self) -> Result<u64, ContractError> {
        let mut state = self.state.lock().unwrap();
        state.block_lookups += 1;
        state.head += 1;
        Ok(state.head)
    }
}

pub fn connect(wallet: &Arc<ScriptedWallet>) -> Arc<Connection> {
    connect_to(wallet, ROPSTEN)
}

pub fn connect_to(wallet: &Arc<ScriptedWallet>, network_id: u64) -> Arc<Connection> {
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    Arc::new(Connection::new(provider, network_id))
}

/// The `HashedReqAdded` log `registry` emits for `request`
pub fn hashed_req_added_log(registry: Address, id: u64, request: &RegistryRequest) -> Log {
    let signature = H256::from(ethers::utils::keccak256(
        "HashedReqAdded(uint256,address,address,address,bytes,uint112,uint112,bool,bool,bool,bool)",
    ));

    let data = abi::encode(&[
        Token::Address(request.target),
        Token::Address(request.referer),
        Token::Bytes(request.call_data.to_vec()),
        Token::Uint(request.init_eth_sent),
        Token::Uint(request.eth_for_call),
        Token::Bool(request.verify_user),
        Token::Bool(request.insert_fee_amount),
        Token::Bool(request.pay_with_auto),
        Token::Bool(request.is_alive),
    ]);

    Log {
        address: registry,
        topics: vec![
            signature,
            H256::from_low_u64_be(id),
            H256::from(request.user),
        ],
        data: Bytes::from(data),
        ..Default::default()
    }
}
