use ethers::abi::Token;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use std::sync::Arc;

use crate::infrastructure::contracts::registry::{NewRequest, RegistryContract, RegistryRequest};
use crate::infrastructure::contracts::submitter::{TransactionSubmitter, TxOptions};
use crate::infrastructure::contracts::types::{ContractError, Receipt};
use crate::tests::support::{self, ScriptedWallet};

fn registry(wallet: &Arc<ScriptedWallet>) -> RegistryContract {
    RegistryContract::new(support::connect(wallet), support::ropsten().contract_addresses.registry).unwrap()
}

fn sample_request() -> RegistryRequest {
    RegistryRequest {
        user: support::signer(),
        target: support::ropsten().contract_addresses.eth_sender,
        referer: Address::zero(),
        call_data: Bytes::from(vec![0xab; 68]),
        init_eth_sent: U256::exp10(16),
        eth_for_call: U256::exp10(15),
        verify_user: false,
        insert_fee_amount: false,
        pay_with_auto: false,
        is_alive: false,
    }
}

/// Arguments of the single transaction `wallet` sent to `method`
fn sent_args(wallet: &ScriptedWallet, registry: &RegistryContract, method: &str) -> Vec<Token> {
    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_addr(), Some(&registry.address()));
    registry
        .binding()
        .schema()
        .decode_call_data(method, sent[0].data().unwrap())
        .unwrap()
}

fn hashes(count: u64) -> Vec<H256> {
    (1..=count).map(H256::from_low_u64_be).collect()
}

fn bytes32_array(hashes: &[H256]) -> Token {
    Token::Array(hashes.iter().map(|h| Token::FixedBytes(h.as_bytes().to_vec())).collect())
}

fn receipt_with(logs: Vec<ethers::types::Log>) -> Receipt {
    Receipt {
        tx_hash: H256::from_low_u64_be(1),
        block_number: support::MINED_BLOCK,
        block_hash: None,
        gas_used: None,
        effective_gas_price: None,
        logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_hash_is_keccak_of_abi_encoding() {
        let request = sample_request();
        assert_eq!(request.hash(), H256::from(keccak256(request.abi_encode())));

        let round_trip = RegistryRequest::from_token(request.to_token()).unwrap();
        assert_eq!(round_trip, request);
    }

    #[tokio::test]
    async fn test_page_in_the_middle() {
        let all = hashes(5);
        let wallet = Arc::new(
            ScriptedWallet::read_only()
                .with_call_output(&[Token::Uint(5u64.into())])
                .with_call_output(&[bytes32_array(&all[2..4])]),
        );
        let registry = registry(&wallet);

        let page = registry.hashed_reqs_page(1, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.hashes, all[2..4].to_vec());

        let slice_call = registry
            .binding()
            .schema()
            .decode_call_data("getHashedReqsSlice", wallet.calls()[1].data().unwrap())
            .unwrap();
        assert_eq!(slice_call, vec![Token::Uint(2u64.into()), Token::Uint(4u64.into())]);
    }

    #[tokio::test]
    async fn test_last_page_is_clamped() {
        let all = hashes(5);
        let wallet = Arc::new(
            ScriptedWallet::read_only()
                .with_call_output(&[Token::Uint(5u64.into())])
                .with_call_output(&[bytes32_array(&all[4..])]),
        );
        let registry = registry(&wallet);

        let page = registry.hashed_reqs_page(2, 2).await.unwrap();
        assert_eq!(page.hashes, vec![all[4]]);

        let slice_call = registry
            .binding()
            .schema()
            .decode_call_data("getHashedReqsSlice", wallet.calls()[1].data().unwrap())
            .unwrap();
        assert_eq!(slice_call, vec![Token::Uint(4u64.into()), Token::Uint(5u64.into())]);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let wallet = Arc::new(ScriptedWallet::read_only().with_call_output(&[Token::Uint(3u64.into())]));
        let registry = registry(&wallet);

        let page = registry.hashed_reqs_page(4, 10).await.unwrap();
        assert!(page.hashes.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(wallet.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_page_size() {
        let wallet = Arc::new(ScriptedWallet::read_only());
        let err = registry(&wallet).hashed_reqs_page(0, 0).await.unwrap_err();
        assert!(matches!(err, ContractError::EncodeError(_)));
        assert_eq!(wallet.network_hits(), 0);
    }

    #[tokio::test]
    async fn test_counters_and_constants() {
        let wallet = Arc::new(
            ScriptedWallet::read_only()
                .with_call_output(&[Token::Uint(4u64.into())])
                .with_call_output(&[Token::Uint(10_000u64.into())]),
        );
        let registry = registry(&wallet);

        assert_eq!(registry.get_req_count_of(support::signer()).await.unwrap(), U256::from(4));
        assert_eq!(registry.base_bps().await.unwrap(), U256::from(10_000));
    }

    #[tokio::test]
    async fn test_get_req_from_bytes() {
        let request = sample_request();
        let wallet = Arc::new(ScriptedWallet::read_only().with_call_output(&[request.to_token()]));

        let decoded = registry(&wallet)
            .get_req_from_bytes(Bytes::from(request.abi_encode()))
            .await
            .unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_request_added_from_receipt() {
        let wallet = Arc::new(ScriptedWallet::read_only());
        let registry = registry(&wallet);
        let request = sample_request();

        let receipt = receipt_with(vec![support::hashed_req_added_log(registry.address(), 12, &request)]);
        let added = registry.request_added(&receipt).unwrap().unwrap();

        assert_eq!(added.id, U256::from(12));
        assert_eq!(added.request, request);
    }

    #[test]
    fn test_request_added_ignores_other_emitters() {
        let wallet = Arc::new(ScriptedWallet::read_only());
        let registry = registry(&wallet);

        let stranger = Address::repeat_byte(0x42);
        let receipt = receipt_with(vec![support::hashed_req_added_log(stranger, 1, &sample_request())]);
        assert!(registry.request_added(&receipt).unwrap().is_none());
        assert!(registry.request_added(&receipt_with(Vec::new())).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_req_pay_specific_arguments() {
        let wallet = Arc::new(ScriptedWallet::signing());
        let registry = registry(&wallet);
        let request = NewRequest {
            target: support::ropsten().contract_addresses.eth_sender,
            referer: support::recipient(),
            call_data: Bytes::from(vec![0x11; 33]),
            eth_for_call: U256::exp10(17),
            verify_user: true,
            insert_fee_amount: false,
            pay_with_auto: true,
            is_alive: false,
        };

        let pending = registry
            .new_req_pay_specific(&TransactionSubmitter::default(), &request, TxOptions::with_value(U256::exp10(17)))
            .await
            .unwrap();
        assert_eq!(pending.method(), "newReqPaySpecific");

        assert_eq!(
            sent_args(&wallet, &registry, "newReqPaySpecific"),
            vec![
                Token::Address(request.target),
                Token::Address(request.referer),
                Token::Bytes(request.call_data.to_vec()),
                Token::Uint(request.eth_for_call),
                Token::Bool(true),
                Token::Bool(false),
                Token::Bool(true),
                Token::Bool(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_new_hashed_req_unveri_arguments() {
        let wallet = Arc::new(ScriptedWallet::signing());
        let registry = registry(&wallet);
        let hashed = H256::from(keccak256(b"ipfs request"));

        registry
            .new_hashed_req_unveri(&TransactionSubmitter::default(), hashed, TxOptions::default())
            .await
            .unwrap();

        assert_eq!(
            sent_args(&wallet, &registry, "newHashedReqUnveri"),
            vec![Token::FixedBytes(hashed.as_bytes().to_vec())]
        );
    }

    #[tokio::test]
    async fn test_cancel_hashed_req_arguments() {
        let wallet = Arc::new(ScriptedWallet::signing());
        let registry = registry(&wallet);
        let request = sample_request();

        registry
            .cancel_hashed_req(&TransactionSubmitter::default(), U256::from(3), &request, TxOptions::default())
            .await
            .unwrap();

        let args = sent_args(&wallet, &registry, "cancelHashedReq");
        assert_eq!(args, vec![Token::Uint(U256::from(3)), request.to_token()]);
        assert_eq!(RegistryRequest::from_token(args[1].clone()).unwrap(), request);
    }

    #[tokio::test]
    async fn test_execute_hashed_req_arguments() {
        let wallet = Arc::new(ScriptedWallet::signing());
        let registry = registry(&wallet);
        let request = sample_request();

        registry
            .execute_hashed_req(
                &TransactionSubmitter::default(),
                U256::from(9),
                &request,
                U256::from(250_000),
                TxOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            sent_args(&wallet, &registry, "executeHashedReq"),
            vec![Token::Uint(U256::from(9)), request.to_token(), Token::Uint(U256::from(250_000))]
        );
    }

    #[tokio::test]
    async fn test_cancel_rejects_amount_wider_than_uint112() {
        let wallet = Arc::new(ScriptedWallet::signing());
        let registry = registry(&wallet);
        let request = RegistryRequest {
            init_eth_sent: U256::one() << 200,
            ..sample_request()
        };

        let err = registry
            .cancel_hashed_req(&TransactionSubmitter::default(), U256::one(), &request, TxOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::EncodeError(_)));
        assert_eq!(wallet.network_hits(), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_writes_need_a_signer() {
        let wallet = Arc::new(ScriptedWallet::read_only());
        let registry = registry(&wallet);

        let err = registry
            .execute_hashed_req(
                &TransactionSubmitter::default(),
                U256::one(),
                &sample_request(),
                U256::from(250_000),
                TxOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::NoSigner { .. }));
        assert_eq!(wallet.network_hits(), 0);
    }

    #[tokio::test]
    async fn test_hashed_req_reads() {
        let all = hashes(3);
        let request = sample_request();
        let wallet = Arc::new(
            ScriptedWallet::read_only()
                .with_call_output(&[bytes32_array(&all)])
                .with_call_output(&[Token::FixedBytes(all[1].as_bytes().to_vec())])
                .with_call_output(&[Token::Bytes(request.abi_encode())]),
        );
        let registry = registry(&wallet);

        assert_eq!(registry.get_hashed_reqs().await.unwrap(), all);
        assert_eq!(registry.get_hashed_req(U256::one()).await.unwrap(), all[1]);

        let encoded = registry.get_req_bytes(&request).await.unwrap();
        assert_eq!(encoded.to_vec(), request.abi_encode());
        assert_eq!(H256::from(keccak256(&encoded)), request.hash());

        let calls = wallet.calls();
        let schema = registry.binding().schema();
        assert_eq!(
            schema.decode_call_data("getHashedReq", calls[1].data().unwrap()).unwrap(),
            vec![Token::Uint(U256::one())]
        );
        assert_eq!(
            schema.decode_call_data("getReqBytes", calls[2].data().unwrap()).unwrap(),
            vec![request.to_token()]
        );
    }

    #[tokio::test]
    async fn test_req_bytes_malformed_output() {
        let wallet = Arc::new(ScriptedWallet::read_only().with_raw_call_output(Bytes::from(vec![0u8; 8])));

        let err = registry(&wallet).get_req_bytes(&sample_request()).await.unwrap_err();
        assert!(matches!(err, ContractError::DecodeError(_)));
    }
}
