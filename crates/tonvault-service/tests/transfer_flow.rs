//! End-to-end transfer flow tests against a mocked HTTP API.

use std::time::{SystemTime, UNIX_EPOCH};

use httpmock::prelude::*;
use serde_json::json;

use tonvault_api::TonApiClient;
use tonvault_cell::TonAddress;
use tonvault_service::{
    BatchMessage, Recipient, TransferError, TransferRequest, TransferService, WalletState,
};
use tonvault_wallet::{Mnemonic, Network, WalletVersion};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
                      abandon abandon abandon abandon abandon abandon abandon abandon \
                      abandon abandon abandon abandon abandon abandon abandon art";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn wallet(version: WalletVersion) -> WalletState {
    WalletState {
        address: TonAddress::new(0, [0xAA; 32]),
        public_key: [0x01; 32],
        version,
        network: Network::Mainnet,
    }
}

fn recipient_addr() -> TonAddress {
    TonAddress::new(0, [0xBB; 32])
}

fn request(amount: u128, send_all: bool) -> TransferRequest {
    TransferRequest {
        recipient: Recipient::Address(recipient_addr()),
        amount,
        comment: Some("test".to_string()),
        send_all,
    }
}

fn service(server: &MockServer) -> TransferService {
    TransferService::new(TonApiClient::new(server.base_url()).unwrap())
}

async fn mock_time(server: &MockServer, time: u64) -> httpmock::Mock<'_> {
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/v2/liteserver/get_time");
            then.status(200).json_body(json!({ "time": time }));
        })
        .await
}

async fn mock_account<'a>(
    server: &'a MockServer,
    addr: &TonAddress,
    balance: u64,
    status: &str,
) -> httpmock::Mock<'a> {
    let raw = addr.to_raw();
    let body = json!({ "address": raw.clone(), "balance": balance, "status": status });
    server
        .mock_async(move |when, then| {
            when.method(GET).path(format!("/v2/accounts/{raw}"));
            then.status(200).json_body(body);
        })
        .await
}

async fn mock_seqno<'a>(
    server: &'a MockServer,
    addr: &TonAddress,
    seqno: u32,
) -> httpmock::Mock<'a> {
    let raw = addr.to_raw();
    server
        .mock_async(move |when, then| {
            when.method(GET).path(format!("/v2/wallet/{raw}/seqno"));
            then.status(200).json_body(json!({ "seqno": seqno }));
        })
        .await
}

#[tokio::test]
async fn test_clock_desync_short_circuits_before_any_state_fetch() {
    let server = MockServer::start_async().await;
    mock_time(&server, now() - 120).await;
    let wallet = wallet(WalletVersion::V4R2);
    let account_mock = mock_account(&server, &wallet.address, 5_000_000_000, "active").await;

    let err = service(&server)
        .estimate_transfer(&wallet, &request(1_000_000_000, false))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::DateAndTime));
    assert_eq!(account_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_estimate_returns_emulated_fee() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::V4R2);

    mock_time(&server, now()).await;
    mock_account(&server, &wallet.address, 5_000_000_000, "active").await;
    mock_account(&server, &recipient_addr(), 0, "uninit").await;
    mock_seqno(&server, &wallet.address, 12).await;
    let emulate = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/wallet/emulate");
            then.status(200)
                .json_body(json!({ "event": { "extra": -3_000_000 } }));
        })
        .await;

    let estimation = service(&server)
        .estimate_transfer(&wallet, &request(1_000_000_000, false))
        .await
        .unwrap();

    emulate.assert_async().await;
    assert_eq!(estimation.fee(), 3_000_000);
}

#[tokio::test]
async fn test_estimate_rejects_zero_balance() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::V4R2);

    mock_time(&server, now()).await;
    mock_account(&server, &wallet.address, 0, "uninit").await;

    let err = service(&server)
        .estimate_transfer(&wallet, &request(1, false))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::NotEnoughBalance));
}

#[tokio::test]
async fn test_send_rejects_amount_plus_fee_reaching_balance() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::V4R2);

    mock_time(&server, now()).await;
    mock_account(&server, &wallet.address, 1_000_000_000, "active").await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/blockchain/message");
            then.status(200).body("{}");
        })
        .await;

    let mnemonic = Mnemonic::from_phrase(PHRASE).unwrap();
    let err = service(&server)
        .send_transfer(&wallet, &mnemonic, &request(999_999_000, false), 1_000)
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::NotEnoughBalance));
    assert_eq!(send.hits_async().await, 0);
}

#[tokio::test]
async fn test_send_all_bypasses_balance_gate_and_broadcasts() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::W5);

    mock_time(&server, now()).await;
    mock_account(&server, &wallet.address, 5, "active").await;
    mock_account(&server, &recipient_addr(), 0, "nonexist").await;
    mock_seqno(&server, &wallet.address, 3).await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/blockchain/message");
            then.status(200).body("{}");
        })
        .await;

    let mnemonic = Mnemonic::from_phrase(PHRASE).unwrap();
    let boc = service(&server)
        .send_transfer(&wallet, &mnemonic, &request(u64::MAX as u128, true), 0)
        .await
        .unwrap();

    send.assert_async().await;
    assert!(!boc.is_empty());
}

#[tokio::test]
async fn test_batch_over_version_ceiling_fails_without_state_fetch() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::V4R2);

    mock_time(&server, now()).await;
    let account_mock = mock_account(&server, &wallet.address, 5_000_000_000, "active").await;

    let messages: Vec<_> = (0..5)
        .map(|_| BatchMessage {
            to: recipient_addr(),
            amount: 1,
            payload: None,
            state_init: None,
        })
        .collect();

    let err = service(&server)
        .estimate_batch(&wallet, &messages)
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::TooManyMessages { max: 4, got: 5 }));
    assert_eq!(account_mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_send_batch_rejects_total_reaching_balance() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::V4R2);

    mock_time(&server, now()).await;
    mock_account(&server, &wallet.address, 2_000_000, "active").await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/blockchain/message");
            then.status(200).body("{}");
        })
        .await;

    let messages: Vec<_> = (0..2)
        .map(|_| BatchMessage {
            to: recipient_addr(),
            amount: 1_000_000,
            payload: None,
            state_init: None,
        })
        .collect();

    let mnemonic = Mnemonic::from_phrase(PHRASE).unwrap();
    let err = service(&server)
        .send_batch(&wallet, &mnemonic, &messages)
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::NotEnoughBalance));
    assert_eq!(send.hits_async().await, 0);
}

#[tokio::test]
async fn test_send_batch_broadcasts_within_balance() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::V4R2);

    mock_time(&server, now()).await;
    mock_account(&server, &wallet.address, 10_000_000_000, "active").await;
    mock_account(&server, &recipient_addr(), 1, "active").await;
    mock_seqno(&server, &wallet.address, 9).await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/blockchain/message");
            then.status(200).body("{}");
        })
        .await;

    let messages: Vec<_> = (0..2)
        .map(|_| BatchMessage {
            to: recipient_addr(),
            amount: 1_000_000,
            payload: None,
            state_init: None,
        })
        .collect();

    let mnemonic = Mnemonic::from_phrase(PHRASE).unwrap();
    let boc = service(&server)
        .send_batch(&wallet, &mnemonic, &messages)
        .await
        .unwrap();

    send.assert_async().await;
    assert!(!boc.is_empty());
}

#[tokio::test]
async fn test_batch_at_ceiling_estimates() {
    let server = MockServer::start_async().await;
    let wallet = wallet(WalletVersion::V4R2);

    mock_time(&server, now()).await;
    mock_account(&server, &wallet.address, 10_000_000_000, "active").await;
    mock_account(&server, &recipient_addr(), 1, "active").await;
    mock_seqno(&server, &wallet.address, 0).await;
    let emulate = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/wallet/emulate");
            then.status(200)
                .json_body(json!({ "event": { "extra": -7_000_000 } }));
        })
        .await;

    let messages: Vec<_> = (0..4)
        .map(|_| BatchMessage {
            to: recipient_addr(),
            amount: 1_000_000,
            payload: None,
            state_init: None,
        })
        .collect();

    let estimation = service(&server)
        .estimate_batch(&wallet, &messages)
        .await
        .unwrap();

    emulate.assert_async().await;
    assert_eq!(estimation.fee(), 7_000_000);
}
