//! Integration Tests: Horizon HTTP
//!
//! Tests `HorizonClient` against a local server:
//! - Account loading and status mapping
//! - Transaction submission and result code extraction
//! - Friendbot requests
//! - Fee stats and claimable balance listing

use super::mock_horizon::MockHorizon;
use pretty_assertions::assert_eq;
use stellar_payments::{
    Asset, HorizonClient, KeyPair, Ledger, Operation, PaymentError, StellarConfig, Transaction,
    TransactionBuilder,
};

fn client_for(mock: &MockHorizon) -> HorizonClient {
    let mut config = StellarConfig::testnet();
    config.horizon_url = format!("{}/", mock.url);
    config.friendbot_url = Some(format!("{}/friendbot", mock.url));
    HorizonClient::new(config).expect("Failed to create client")
}

fn signed_payment() -> Transaction {
    let sender = KeyPair::from_seed(&[1u8; 32]);
    let receiver = KeyPair::from_seed(&[2u8; 32]);
    let mut tx = TransactionBuilder::from_sequence(
        &StellarConfig::testnet(),
        &sender.public_key(),
        100,
        100,
    )
    .add_operation(Operation::payment(
        &receiver.public_key(),
        Asset::Native,
        "10".parse().unwrap(),
    ))
    .build()
    .unwrap();
    tx.sign(&sender).unwrap();
    tx
}

/// Test: 200 parses the account, 404 and 429 map to their own errors
#[tokio::test]
async fn test_load_account_statuses() {
    let address = KeyPair::from_seed(&[1u8; 32]).public_key();
    let account = serde_json::json!({
        "id": address,
        "sequence": "103720918407102567",
        "balances": [{ "asset_type": "native", "balance": "9999.9999900" }]
    });

    let mock = MockHorizon::start(vec![
        (200, account.to_string()),
        (404, r#"{"title":"Resource Missing","status":404}"#.to_string()),
        (429, r#"{"title":"Rate Limit Exceeded","status":429}"#.to_string()),
        (500, r#"{"title":"Internal Server Error","status":500}"#.to_string()),
    ])
    .await;
    let client = client_for(&mock);

    let loaded = client.load_account(&address).await.unwrap();
    assert_eq!(loaded.sequence_number().unwrap(), 103_720_918_407_102_567);
    assert_eq!(loaded.balance_of(&Asset::Native), Some("9999.9999900"));

    assert!(matches!(
        client.load_account(&address).await,
        Err(PaymentError::AccountNotFound(_))
    ));
    assert!(matches!(
        client.load_account(&address).await,
        Err(PaymentError::RateLimited)
    ));
    assert!(matches!(
        client.load_account(&address).await,
        Err(PaymentError::Horizon(_))
    ));

    let requests = mock.requests();
    assert!(requests[0].starts_with(&format!("GET /accounts/{} ", address)));
}

/// Test: account_exists treats 404 as absence
#[tokio::test]
async fn test_account_exists() {
    let mock = MockHorizon::start(vec![
        (200, r#"{"id":"x","sequence":"1","balances":[]}"#.to_string()),
        (404, "{}".to_string()),
    ])
    .await;
    let client = client_for(&mock);
    let address = KeyPair::random().public_key();

    assert!(client.account_exists(&address).await.unwrap());
    assert!(!client.account_exists(&address).await.unwrap());
}

/// Test: successful submission posts the envelope as form field `tx`
#[tokio::test]
async fn test_submit_success() {
    let tx = signed_payment();
    let hash = tx.hash_hex().unwrap();
    let body = serde_json::json!({
        "hash": hash,
        "ledger": 4242,
        "envelope_xdr": "AAAA",
        "result_xdr": "AAAA",
        "successful": true
    });

    let mock = MockHorizon::start(vec![(200, body.to_string())]).await;
    let client = client_for(&mock);

    let response = client.submit_transaction(&tx).await.unwrap();
    assert_eq!(response.hash, hash);
    assert_eq!(response.ledger, 4242);

    let request = &mock.requests()[0];
    assert!(request.starts_with("POST /transactions "));
    assert!(request.contains("application/x-www-form-urlencoded"));
    assert!(request.contains("tx=AAAAAgAAAAC"));
}

/// Test: 400 unwraps extras.result_codes into SubmissionFailed
#[tokio::test]
async fn test_submit_failure_result_codes() {
    let body = serde_json::json!({
        "type": "https://stellar.org/horizon-errors/transaction_failed",
        "title": "Transaction Failed",
        "status": 400,
        "extras": {
            "envelope_xdr": "AAAA",
            "result_codes": { "transaction": "tx_bad_seq" },
            "result_xdr": "AAAAAAAAAGT////7AAAAAA=="
        }
    });

    let mock = MockHorizon::start(vec![
        (400, body.to_string()),
        (504, r#"{"title":"Timeout"}"#.to_string()),
    ])
    .await;
    let client = client_for(&mock);
    let tx = signed_payment();

    let err = client.submit_transaction(&tx).await.unwrap_err();
    match &err {
        PaymentError::SubmissionFailed { result_codes, .. } => {
            let codes = result_codes.as_ref().unwrap();
            assert_eq!(codes.transaction.as_deref(), Some("tx_bad_seq"));
            assert_eq!(codes.operations, None);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(matches!(
        client.submit_transaction(&tx).await,
        Err(PaymentError::TransactionTimeout)
    ));
}

/// Test: Friendbot is called with ?addr=, any 2xx is success and other
/// statuses are FundingFailed
#[tokio::test]
async fn test_friendbot() {
    let mock = MockHorizon::start(vec![
        (200, r#"{"hash":"abc"}"#.to_string()),
        (201, r#"{"hash":"def"}"#.to_string()),
        (400, r#"{"detail":"createAccountAlreadyExist"}"#.to_string()),
    ])
    .await;
    let client = client_for(&mock);
    let address = KeyPair::random().public_key();

    client.friendbot_fund(&address).await.unwrap();
    assert!(mock.requests()[0].starts_with(&format!("GET /friendbot?addr={} ", address)));
    client.friendbot_fund(&address).await.unwrap();

    match client.friendbot_fund(&address).await {
        Err(PaymentError::FundingFailed(reason)) => assert!(reason.contains("400")),
        other => panic!("unexpected result: {:?}", other),
    }
}

/// Test: unreachable Friendbot is FundingFailed, not a network error
#[tokio::test]
async fn test_friendbot_unreachable() {
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    let mut config = StellarConfig::testnet();
    config.friendbot_url = Some(format!("http://{}/", addr));
    let client = HorizonClient::new(config).unwrap();

    assert!(matches!(
        client.friendbot_fund(&KeyPair::random().public_key()).await,
        Err(PaymentError::FundingFailed(_))
    ));
}

/// Test: no request is made for Friendbot off testnet
#[tokio::test]
async fn test_friendbot_refused_on_public() {
    let mock = MockHorizon::start(vec![(200, "{}".to_string())]).await;
    let mut config = StellarConfig::public();
    config.friendbot_url = Some(format!("{}/friendbot", mock.url));
    let client = HorizonClient::new(config).unwrap();

    assert!(matches!(
        client.friendbot_fund(&KeyPair::random().public_key()).await,
        Err(PaymentError::UnsupportedOperation(_))
    ));
    assert!(mock.requests().is_empty());
}

/// Test: fee stats and claimable balances through the Ledger seam
#[tokio::test]
async fn test_ledger_reads() {
    let claimant = KeyPair::random().public_key();
    let balances = serde_json::json!({
        "_embedded": {
            "records": [{
                "id": format!("00000000{}", "ab".repeat(32)),
                "asset": "native",
                "amount": "5.0000000",
                "last_modified_ledger": 77,
                "claimants": [{ "destination": claimant, "predicate": { "unconditional": true } }]
            }]
        }
    });

    let mock = MockHorizon::start(vec![
        (200, r#"{"last_ledger":"77","last_ledger_base_fee":"300"}"#.to_string()),
        (200, balances.to_string()),
    ])
    .await;
    let client = client_for(&mock);

    assert_eq!(Ledger::fetch_base_fee(&client).await.unwrap(), 300);

    let listed = Ledger::claimable_balances(&client, &claimant).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].claimants[0].destination, claimant);
    assert_eq!(listed[0].last_modified_ledger, 77);

    let requests = mock.requests();
    assert!(requests[0].starts_with("GET /fee_stats "));
    assert!(requests[1].starts_with(&format!("GET /claimable_balances?claimant={} ", claimant)));
}
