//! Integration Tests: Claimable Balance Flow
//!
//! Tests the claimable balance lifecycle:
//! - Creation with sender + destination claimants
//! - Listing by claimant
//! - Claiming by a claimant and refusal for anyone else

use super::fake_ledger::amount;
use super::{funded, testnet_service};
use pretty_assertions::assert_eq;
use stellar_payments::{Asset, Claimant, OperationBody, PaymentError};

/// Test: create 5 XLM for a destination, list it, claim it
#[tokio::test]
async fn test_create_list_claim() {
    let service = testnet_service();
    let sender = funded(&service);
    let destination = funded(&service);

    let created = service
        .create_claimable_balance("XLM", amount("5"), &sender.secret(), &destination.public_key())
        .await
        .expect("create failed");

    let tx = &service.ledger().submitted()[0];
    assert_eq!(tx.signatures().len(), 1);
    match &tx.operations()[0].body {
        OperationBody::CreateClaimableBalance {
            asset,
            amount: value,
            claimants,
        } => {
            assert_eq!(asset, &Asset::Native);
            assert_eq!(value, &amount("5"));
            assert_eq!(
                claimants,
                &vec![
                    Claimant::unconditional(&sender.public_key()),
                    Claimant::unconditional(&destination.public_key()),
                ]
            );
        }
        other => panic!("unexpected operation: {:?}", other),
    }
    assert_eq!(created.balance_id, tx.claimable_balance_id(0).unwrap());
    assert!(created.balance_id.starts_with("00000000"));
    assert_eq!(created.balance_id.len(), 72);

    let listed = service
        .claimable_balances(&destination.public_key())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.balance_id);
    assert_eq!(listed[0].asset, "native");
    assert_eq!(listed[0].amount, "5.0000000");

    service
        .claim_claimable_balance(&destination.secret(), &created.balance_id)
        .await
        .expect("claim failed");

    let claim_tx = &service.ledger().submitted()[1];
    assert_eq!(
        claim_tx.operations()[0].source_account.as_deref(),
        Some(destination.public_key().as_str())
    );
    assert!(!service.ledger().escrow_exists(&created.balance_id));
    assert_eq!(
        service.ledger().balance(&destination.public_key(), &Asset::Native),
        Some(amount("10005"))
    );
    assert_eq!(
        service.ledger().balance(&sender.public_key(), &Asset::Native),
        Some(amount("9995"))
    );
}

/// Test: claiming a balance the claimant is not party to fails cleanly
#[tokio::test]
async fn test_claim_by_non_claimant() {
    let service = testnet_service();
    let sender = funded(&service);
    let destination = funded(&service);
    let outsider = funded(&service);

    let created = service
        .create_claimable_balance("XLM", amount("5"), &sender.secret(), &destination.public_key())
        .await
        .unwrap();

    let err = service
        .claim_claimable_balance(&outsider.secret(), &created.balance_id)
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::SubmissionFailed { .. }));
    let codes = err.result_codes().expect("result codes");
    assert_eq!(codes.operations, Some(vec!["op_cannot_claim".to_string()]));

    // Nothing moved; the balance is still claimable by its owner
    assert!(service.ledger().escrow_exists(&created.balance_id));
    assert_eq!(
        service.ledger().balance(&outsider.public_key(), &Asset::Native),
        Some(amount("10000"))
    );
    service
        .claim_claimable_balance(&destination.secret(), &created.balance_id)
        .await
        .expect("owner claim failed");

    // The outsider's next transaction still lines up with its sequence
    service
        .create_claimable_balance("XLM", amount("1"), &outsider.secret(), &sender.public_key())
        .await
        .expect("outsider follow-up failed");
}

/// Test: claiming an unknown balance id
#[tokio::test]
async fn test_claim_unknown_balance() {
    let service = testnet_service();
    let claimant = funded(&service);

    let err = service
        .claim_claimable_balance(&claimant.secret(), &format!("00000000{}", "ab".repeat(32)))
        .await
        .unwrap_err();
    let codes = err.result_codes().expect("result codes");
    assert_eq!(codes.operations, Some(vec!["op_does_not_exist".to_string()]));
}

/// Test: malformed ids never reach the ledger
#[tokio::test]
async fn test_claim_malformed_id() {
    let service = testnet_service();
    let claimant = funded(&service);

    let err = service
        .claim_claimable_balance(&claimant.secret(), "xyz")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::InvalidTransaction(_)));
    assert!(service.ledger().submitted().is_empty());
}

/// Test: credit claimable balances are issued by the sender
#[tokio::test]
async fn test_credit_claimable_balance() {
    let service = testnet_service();
    let sender = funded(&service);
    let destination = funded(&service);

    let created = service
        .create_claimable_balance("GLD", amount("250"), &sender.secret(), &destination.public_key())
        .await
        .unwrap();

    let gold = Asset::credit("GLD", &sender.public_key()).unwrap();
    let listed = service
        .claimable_balances(&destination.public_key())
        .await
        .unwrap();
    assert_eq!(listed[0].asset, gold.canonical());

    // No trustline yet: the claim is refused and the balance stays
    let err = service
        .claim_claimable_balance(&destination.secret(), &created.balance_id)
        .await
        .unwrap_err();
    assert_eq!(
        err.result_codes().and_then(|c| c.operations.clone()),
        Some(vec!["op_no_trust".to_string()])
    );

    service
        .ledger()
        .add_trustline(&destination.public_key(), &gold, "1000");
    service
        .claim_claimable_balance(&destination.secret(), &created.balance_id)
        .await
        .unwrap();
    assert_eq!(
        service.ledger().balance(&destination.public_key(), &gold),
        Some(amount("250"))
    );
}
