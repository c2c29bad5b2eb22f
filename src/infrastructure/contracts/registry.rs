use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use std::sync::Arc;
use tracing::debug;

use crate::infrastructure::contracts::abis;
use crate::infrastructure::contracts::binding::ContractBinding;
use crate::infrastructure::contracts::connection::Connection;
use crate::infrastructure::contracts::submitter::{PendingTransaction, TransactionSubmitter, TxOptions};
use crate::infrastructure::contracts::tokens;
use crate::infrastructure::contracts::types::{ContractError, Receipt};

/// The registry's `Request` struct: one scheduled call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRequest {
    pub user: Address,
    pub target: Address,
    pub referer: Address,
    pub call_data: Bytes,
    pub init_eth_sent: U256,
    pub eth_for_call: U256,
    pub verify_user: bool,
    pub insert_fee_amount: bool,
    pub pay_with_auto: bool,
    pub is_alive: bool,
}

impl RegistryRequest {
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.user),
            Token::Address(self.target),
            Token::Address(self.referer),
            Token::Bytes(self.call_data.to_vec()),
            Token::Uint(self.init_eth_sent),
            Token::Uint(self.eth_for_call),
            Token::Bool(self.verify_user),
            Token::Bool(self.insert_fee_amount),
            Token::Bool(self.pay_with_auto),
            Token::Bool(self.is_alive),
        ])
    }

    pub fn from_token(token: Token) -> Result<Self, ContractError> {
        let fields = match token {
            Token::Tuple(fields) => fields,
            other => {
                return Err(ContractError::DecodeError(format!("Request: expected tuple, got {:?}", other)));
            }
        };
        let mut fields = fields.into_iter();

        Ok(Self {
            user: tokens::next_address(&mut fields, "user")?,
            target: tokens::next_address(&mut fields, "target")?,
            referer: tokens::next_address(&mut fields, "referer")?,
            call_data: tokens::next_bytes(&mut fields, "callData")?,
            init_eth_sent: tokens::next_uint(&mut fields, "initEthSent")?,
            eth_for_call: tokens::next_uint(&mut fields, "ethForCall")?,
            verify_user: tokens::next_bool(&mut fields, "verifyUser")?,
            insert_fee_amount: tokens::next_bool(&mut fields, "insertFeeAmount")?,
            pay_with_auto: tokens::next_bool(&mut fields, "payWithAUTO")?,
            is_alive: tokens::next_bool(&mut fields, "isAlive")?,
        })
    }

    /// `abi.encode(r)`, what `getReqBytes` returns
    pub fn abi_encode(&self) -> Vec<u8> {
        abi::encode(&[self.to_token()])
    }

    /// The value the registry keeps in its hashed-request list
    pub fn hash(&self) -> H256 {
        H256::from(keccak256(self.abi_encode()))
    }
}

/// Arguments of `newReq` / `newReqPaySpecific`
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub target: Address,
    pub referer: Address,
    pub call_data: Bytes,
    pub eth_for_call: U256,
    pub verify_user: bool,
    pub insert_fee_amount: bool,
    pub pay_with_auto: bool,
    pub is_alive: bool,
}

/// One page of hashed requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPage {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub hashes: Vec<H256>,
}

/// A request the registry reported as added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedRequest {
    pub id: U256,
    pub request: RegistryRequest,
}

/// The registry that stores scheduled calls and executes them later
#[derive(Debug, Clone)]
pub struct RegistryContract {
    binding: ContractBinding,
}

impl RegistryContract {
    pub fn new(connection: Arc<Connection>, address: Address) -> Result<Self, ContractError> {
        let schema = abis::load_registry_schema()?;
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

    // ============ REQUEST LIFECYCLE ============

    pub async fn new_req(
        &self,
        submitter: &TransactionSubmitter,
        request: &NewRequest,
        options: TxOptions,
    ) -> Result<PendingTransaction, ContractError> {
        let args = [
            Token::Address(request.target),
            Token::Address(request.referer),
            Token::Bytes(request.call_data.to_vec()),
            Token::Uint(request.eth_for_call),
            Token::Bool(request.verify_user),
            Token::Bool(request.insert_fee_amount),
            Token::Bool(request.is_alive),
        ];

        debug!("newReq target {:?}, ethForCall {}", request.target, request.eth_for_call);
        submitter.submit(&self.binding, "newReq", &args, options).await
    }

    pub async fn new_req_pay_specific(
        &self,
        submitter: &TransactionSubmitter,
        request: &NewRequest,
        options: TxOptions,
    ) -> Result<PendingTransaction, ContractError> {
        let args = [
            Token::Address(request.target),
            Token::Address(request.referer),
            Token::Bytes(request.call_data.to_vec()),
            Token::Uint(request.eth_for_call),
            Token::Bool(request.verify_user),
            Token::Bool(request.insert_fee_amount),
            Token::Bool(request.pay_with_auto),
            Token::Bool(request.is_alive),
        ];

        submitter.submit(&self.binding, "newReqPaySpecific", &args, options).await
    }

    pub async fn new_hashed_req_unveri(
        &self,
        submitter: &TransactionSubmitter,
        hashed_ipfs_req: H256,
        options: TxOptions,
    ) -> Result<PendingTransaction, ContractError> {
        let args = [Token::FixedBytes(hashed_ipfs_req.as_bytes().to_vec())];
        submitter.submit(&self.binding, "newHashedReqUnveri", &args, options).await
    }

    pub async fn cancel_hashed_req(
        &self,
        submitter: &TransactionSubmitter,
        id: U256,
        request: &RegistryRequest,
        options: TxOptions,
    ) -> Result<PendingTransaction, ContractError> {
        let args = [Token::Uint(id), request.to_token()];
        submitter.submit(&self.binding, "cancelHashedReq", &args, options).await
    }

    pub async fn execute_hashed_req(
        &self,
        submitter: &TransactionSubmitter,
        id: U256,
        request: &RegistryRequest,
        expected_gas: U256,
        options: TxOptions,
    ) -> Result<PendingTransaction, ContractError> {
        let args = [Token::Uint(id), request.to_token(), Token::Uint(expected_gas)];
        submitter.submit(&self.binding, "executeHashedReq", &args, options).await
    }

    pub async fn estimate_gas(&self, method: &str, args: &[Token], value: Option<U256>) -> Result<U256, ContractError> {
        self.binding.estimate_gas(method, args, value).await
    }

    // ============ READ ACCESSORS ============

    pub async fn get_hashed_reqs(&self) -> Result<Vec<H256>, ContractError> {
        let output = self.binding.call("getHashedReqs", &[]).await?;
        tokens::into_bytes32_array(tokens::single(output, "getHashedReqs")?, "getHashedReqs")
    }

    pub async fn get_hashed_reqs_len(&self) -> Result<U256, ContractError> {
        self.uint_getter("getHashedReqsLen", &[]).await
    }

    /// Hashes at `[start, end)`
    pub async fn get_hashed_reqs_slice(&self, start: U256, end: U256) -> Result<Vec<H256>, ContractError> {
        let output = self
            .binding
            .call("getHashedReqsSlice", &[Token::Uint(start), Token::Uint(end)])
            .await?;
        tokens::into_bytes32_array(tokens::single(output, "getHashedReqsSlice")?, "getHashedReqsSlice")
    }

    pub async fn get_hashed_req(&self, id: U256) -> Result<H256, ContractError> {
        let output = self.binding.call("getHashedReq", &[Token::Uint(id)]).await?;
        tokens::into_bytes32(tokens::single(output, "getHashedReq")?, "getHashedReq")
    }

    pub async fn get_hashed_reqs_unveri(&self) -> Result<Vec<H256>, ContractError> {
        let output = self.binding.call("getHashedReqsUnveri", &[]).await?;
        tokens::into_bytes32_array(tokens::single(output, "getHashedReqsUnveri")?, "getHashedReqsUnveri")
    }

    pub async fn get_hashed_reqs_unveri_len(&self) -> Result<U256, ContractError> {
        self.uint_getter("getHashedReqsUnveriLen", &[]).await
    }

    pub async fn get_hashed_reqs_unveri_slice(&self, start: U256, end: U256) -> Result<Vec<H256>, ContractError> {
        let output = self
            .binding
            .call("getHashedReqsUnveriSlice", &[Token::Uint(start), Token::Uint(end)])
            .await?;
        tokens::into_bytes32_array(tokens::single(output, "getHashedReqsUnveriSlice")?, "getHashedReqsUnveriSlice")
    }

    pub async fn get_hashed_req_unveri(&self, id: U256) -> Result<H256, ContractError> {
        let output = self.binding.call("getHashedReqUnveri", &[Token::Uint(id)]).await?;
        tokens::into_bytes32(tokens::single(output, "getHashedReqUnveri")?, "getHashedReqUnveri")
    }

    pub async fn get_req_count_of(&self, addr: Address) -> Result<U256, ContractError> {
        self.uint_getter("getReqCountOf", &[Token::Address(addr)]).await
    }

    pub async fn get_exec_count_of(&self, addr: Address) -> Result<U256, ContractError> {
        self.uint_getter("getExecCountOf", &[Token::Address(addr)]).await
    }

    pub async fn get_referal_count_of(&self, addr: Address) -> Result<U256, ContractError> {
        self.uint_getter("getReferalCountOf", &[Token::Address(addr)]).await
    }

    pub async fn get_req_bytes(&self, request: &RegistryRequest) -> Result<Bytes, ContractError> {
        let output = self.binding.call("getReqBytes", &[request.to_token()]).await?;
        tokens::into_bytes(tokens::single(output, "getReqBytes")?, "getReqBytes")
    }

    pub async fn get_req_from_bytes(&self, request_bytes: Bytes) -> Result<RegistryRequest, ContractError> {
        let output = self
            .binding
            .call("getReqFromBytes", &[Token::Bytes(request_bytes.to_vec())])
            .await?;
        RegistryRequest::from_token(tokens::single(output, "getReqFromBytes")?)
    }

    pub async fn base_bps(&self) -> Result<U256, ContractError> {
        self.uint_getter("BASE_BPS", &[]).await
    }

    pub async fn pay_eth_bps(&self) -> Result<U256, ContractError> {
        self.uint_getter("PAY_ETH_BPS", &[]).await
    }

    pub async fn gas_overhead_eth(&self) -> Result<U256, ContractError> {
        self.uint_getter("GAS_OVERHEAD_ETH", &[]).await
    }

    /// Page `page` (zero-based) of the verified hashed requests. Pages past the
    /// end are empty rather than an error.
    pub async fn hashed_reqs_page(&self, page: u64, page_size: u64) -> Result<RequestPage, ContractError> {
        if page_size == 0 {
            return Err(ContractError::EncodeError("page size must be positive".to_string()));
        }

        let total = self.get_hashed_reqs_len().await?;
        let total = if total > U256::from(u64::MAX) { u64::MAX } else { total.as_u64() };

        let start = page.saturating_mul(page_size);
        if start >= total {
            return Ok(RequestPage {
                page,
                page_size,
                total,
                hashes: Vec::new(),
            });
        }
        let end = start.saturating_add(page_size).min(total);

        let hashes = self
            .get_hashed_reqs_slice(U256::from(start), U256::from(end))
            .await?;

        Ok(RequestPage {
            page,
            page_size,
            total,
            hashes,
        })
    }

    // ============ EVENTS ============

    /// The first `HashedReqAdded` this registry emitted in `receipt`.
    pub fn request_added(&self, receipt: &Receipt) -> Result<Option<AddedRequest>, ContractError> {
        let log = match self.binding.decode_events(receipt, "HashedReqAdded")?.into_iter().next() {
            Some(log) => log,
            None => return Ok(None),
        };

        let mut id = None;
        let mut user = None;
        let mut values = Vec::with_capacity(9);
        for param in log.params {
            match param.name.as_str() {
                "id" => id = Some(tokens::into_uint(param.value, "id")?),
                "user" => user = Some(param.value),
                _ => values.push(param.value),
            }
        }

        let id = id.ok_or_else(|| ContractError::DecodeError("HashedReqAdded: missing id".to_string()))?;
        let user = user.ok_or_else(|| ContractError::DecodeError("HashedReqAdded: missing user".to_string()))?;

        let mut fields = vec![user];
        fields.extend(values);
        let request = RegistryRequest::from_token(Token::Tuple(fields))?;

        Ok(Some(AddedRequest { id, request }))
    }

    async fn uint_getter(&self, method: &str, args: &[Token]) -> Result<U256, ContractError> {
        let output = self.binding.call(method, args).await?;
        tokens::into_uint(tokens::single(output, method)?, method)
    }
}
