use tracechain_core::merkle::{Position, ProofStep};
use tracechain_core::{Transaction, WalletKeypair};
use tracechain_node::NodeState;
use tracechain_node::service::{self, SubmitOutcome, TxLocation, VerifyRequest};

const NOW: i64 = 1_750_000_000_000;

#[test]
fn submit_mine_and_prove() {
    let node = NodeState::default().into_handle();
    let keypair = WalletKeypair::new();
    let picked = Transaction::sign(&keypair, "Apples crate 7", "Picked", NOW);
    let washed = Transaction::sign(&keypair, "Apples crate 7", "Washed", NOW + 1);

    assert_eq!(
        service::submit_transaction(&node, picked.clone(), NOW),
        SubmitOutcome::Accepted
    );
    assert_eq!(
        service::submit_transaction(&node, washed.clone(), NOW),
        SubmitOutcome::Accepted
    );
    assert_eq!(
        service::submit_transaction(&node, picked.clone(), NOW),
        SubmitOutcome::Duplicate
    );
    assert_eq!(service::mempool(&node).len(), 2);

    assert!(matches!(
        service::lookup_transaction(&node, &picked.id),
        Some(TxLocation::Pending { .. })
    ));

    let block = service::mine(&node);
    assert_eq!(block.header.index, 1);
    assert!(service::mempool(&node).is_empty());
    assert_eq!(
        service::lookup_transaction(&node, &washed.id),
        Some(TxLocation::Mined {
            block_index: 1,
            transaction: washed.clone()
        })
    );

    // mined records cannot be queued again
    assert_eq!(
        service::submit_transaction(&node, picked.clone(), NOW),
        SubmitOutcome::Duplicate
    );

    let proof = service::proof_for(&node, 1, &washed.id).unwrap();
    assert!(proof.found);
    assert_eq!(proof.merkle_root, block.header.merkle_root);
    assert_eq!(
        proof.proof,
        vec![ProofStep {
            hash: picked.id.clone(),
            position: Position::Left
        }]
    );

    let result = service::verify_for(
        &node,
        1,
        &VerifyRequest {
            leaf: washed.id.clone(),
            proof: proof.proof.clone(),
        },
    )
    .unwrap();
    assert!(result.valid);
    assert_eq!(result.computed_root, result.stored_root);
    assert_eq!(result.path.first(), Some(&washed.id));

    let report = service::validate(&node);
    assert!(report.valid);
    assert_eq!(report.height, 2);
    assert!(report.failure.is_none());
}

#[test]
fn revoked_signer_is_refused() {
    let node = NodeState::default().into_handle();
    let keypair = WalletKeypair::new();

    assert!(service::revoke(&node, &keypair.public_hex()));
    assert!(!service::revoke(&node, &keypair.public_hex()));
    assert_eq!(service::revoked_keys(&node), vec![keypair.public_hex()]);

    let tx = Transaction::sign(&keypair, "Fish", "Landed", NOW);
    assert_eq!(
        service::submit_transaction(&node, tx, NOW),
        SubmitOutcome::Revoked
    );
    assert!(service::mempool(&node).is_empty());
}

#[test]
fn forged_signature_is_invalid() {
    let node = NodeState::default().into_handle();
    let owner = WalletKeypair::new();
    let forger = WalletKeypair::new();

    let mut tx = Transaction::sign(&forger, "Wine", "Bottled", NOW);
    tx.signer_public_key = owner.public_hex();

    assert!(matches!(
        service::submit_transaction(&node, tx, NOW),
        SubmitOutcome::Invalid(_)
    ));
    assert!(service::mempool(&node).is_empty());
}

#[test]
fn unknown_blocks_and_transactions() {
    let node = NodeState::default().into_handle();
    assert!(service::proof_for(&node, 5, "abc").is_none());
    assert!(
        service::verify_for(
            &node,
            5,
            &VerifyRequest {
                leaf: "abc".into(),
                proof: Vec::new()
            }
        )
        .is_none()
    );
    assert!(service::lookup_transaction(&node, "abc").is_none());

    // genesis exists but holds nothing
    let proof = service::proof_for(&node, 0, "abc").unwrap();
    assert!(!proof.found);
    assert!(proof.proof.is_empty());

    let result = service::verify_for(
        &node,
        0,
        &VerifyRequest {
            leaf: "abc".into(),
            proof: Vec::new(),
        },
    )
    .unwrap();
    assert!(!result.valid);
    assert_eq!(result.computed_root, "abc");
}

#[test]
fn snapshot_and_chain_views_agree() {
    let node = NodeState::default().into_handle();
    let keypair = WalletKeypair::new();
    service::submit_transaction(&node, Transaction::sign(&keypair, "Tea", "Plucked", NOW), NOW);
    service::mine(&node);
    service::revoke(&node, &keypair.public_hex());

    let snapshot = service::snapshot(&node);
    assert_eq!(snapshot.chain, service::chain(&node));
    assert_eq!(snapshot.revoked_keys, vec![keypair.public_hex()]);
}
