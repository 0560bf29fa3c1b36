//! Mint attempt lifecycle tests.

use alloy::primitives::U256;
use std::time::Duration;

use mint_client::config::ClientConfig;
use mint_client::gateway::{InjectedProvider, ProviderError};
use mint_client::lifecycle::startup::simulated_wallet;
use mint_client::lifecycle::Shutdown;
use mint_client::mint::{MintFailure, MintStatus};
use mint_client::reconciler::{MintClient, Notice};

mod common;
use common::ACCOUNT;

fn awaiting(status: &MintStatus) -> bool {
    matches!(status, MintStatus::AwaitingConfirmation(_))
}

#[tokio::test]
async fn test_mint_resolves_from_event() {
    let wallet = common::authorized_wallet();
    let client = common::start_connected(&wallet).await;
    let calls = wallet.total_minted_calls();

    client.handle.mint().unwrap();
    let snapshot = common::wait_until(&client.handle, |s| awaiting(&s.mint)).await;
    assert!(snapshot.is_busy);
    assert_eq!(wallet.mint_calls(), 1);

    wallet.include_next().unwrap();
    wallet.emit_mint(ACCOUNT, U256::from(7));

    let snapshot =
        common::wait_until(&client.handle, |s| s.mint == MintStatus::Succeeded(U256::from(7))).await;
    assert!(!snapshot.is_busy);
    common::wait_until(&client.handle, |s| s.total_minted == 1).await;
    assert!(wallet.total_minted_calls() > calls);
    client.stop().await;
}

#[tokio::test]
async fn test_second_mint_while_busy_is_ignored() {
    let wallet = common::authorized_wallet();
    let client = common::start_connected(&wallet).await;

    client.handle.mint().unwrap();
    let first = common::wait_until(&client.handle, |s| awaiting(&s.mint)).await;

    client.handle.mint().unwrap();
    let snapshot = client.handle.sync().await.unwrap();

    assert_eq!(wallet.mint_calls(), 1);
    assert_eq!(wallet.pending_count(), 1);
    assert_eq!(snapshot.mint, first.mint);
    client.stop().await;
}

#[tokio::test]
async fn test_wrong_chain_fails_without_submitting() {
    let wallet = common::authorized_wallet();
    let client = common::start_connected(&wallet).await;
    wallet.set_chain_id("0x1");
    common::wait_until(&client.handle, |s| s.notice.is_some()).await;

    client.handle.mint().unwrap();
    let snapshot = client.handle.sync().await.unwrap();

    match snapshot.mint {
        MintStatus::Failed(MintFailure::WrongChain(e)) => assert_eq!(e.actual.as_str(), "0x1"),
        other => panic!("expected wrong chain failure, got {:?}", other),
    }
    assert!(matches!(snapshot.notice, Some(Notice::WrongChain(_))));
    assert!(!snapshot.is_busy);
    assert_eq!(wallet.mint_calls(), 0);
    client.stop().await;
}

#[tokio::test]
async fn test_rejected_submission_fails_and_frees_slot() {
    let wallet = common::authorized_wallet();
    let client = common::start_connected(&wallet).await;
    wallet.fail_next_submission(ProviderError::UserRejected);

    client.handle.mint().unwrap();
    let snapshot = client.handle.sync().await.unwrap();
    assert_eq!(
        snapshot.mint,
        MintStatus::Failed(MintFailure::Submission(ProviderError::UserRejected))
    );
    assert!(!snapshot.is_busy);

    client.handle.mint().unwrap();
    common::wait_until(&client.handle, |s| awaiting(&s.mint)).await;
    assert_eq!(wallet.mint_calls(), 2);
    client.stop().await;
}

#[tokio::test]
async fn test_reverted_transaction_fails() {
    let wallet = common::authorized_wallet();
    let client = common::start_connected(&wallet).await;

    client.handle.mint().unwrap();
    common::wait_until(&client.handle, |s| awaiting(&s.mint)).await;
    wallet.revert_next("out of gas").unwrap();

    let snapshot = common::wait_until(&client.handle, |s| s.mint.is_terminal()).await;
    assert_eq!(
        snapshot.mint,
        MintStatus::Failed(MintFailure::Inclusion(ProviderError::Reverted(
            "out of gas".to_string()
        )))
    );
    assert!(!snapshot.is_busy);
    client.stop().await;
}

#[tokio::test]
async fn test_dropped_transaction_fails() {
    let wallet = common::authorized_wallet();
    let client = common::start_connected(&wallet).await;

    client.handle.mint().unwrap();
    common::wait_until(&client.handle, |s| awaiting(&s.mint)).await;
    wallet.drop_next().unwrap();

    let snapshot = common::wait_until(&client.handle, |s| s.mint.is_terminal()).await;
    assert!(matches!(
        snapshot.mint,
        MintStatus::Failed(MintFailure::Inclusion(ProviderError::Dropped(_)))
    ));
    assert!(!snapshot.is_busy);
    assert_eq!(wallet.pending_count(), 0);
    client.stop().await;
}

#[tokio::test]
async fn test_inclusion_timeout_fails() {
    let wallet = common::authorized_wallet();
    let mut settings = common::settings();
    settings.confirmation_timeout = Duration::from_millis(100);
    let client = common::start_with(InjectedProvider::present(wallet.clone()), settings);
    client.handle.check_silently().unwrap();

    client.handle.mint().unwrap();
    let snapshot = common::wait_until(&client.handle, |s| s.mint.is_terminal()).await;

    assert!(matches!(
        snapshot.mint,
        MintStatus::Failed(MintFailure::Inclusion(ProviderError::Timeout(_)))
    ));
    client.stop().await;
}

#[tokio::test]
async fn test_missed_event_falls_back_to_receipt() {
    let wallet = common::authorized_wallet();
    let mut settings = common::settings();
    settings.event_grace = Duration::from_millis(50);
    let client = common::start_with(InjectedProvider::present(wallet.clone()), settings);
    client.handle.check_silently().unwrap();

    client.handle.mint().unwrap();
    common::wait_until(&client.handle, |s| awaiting(&s.mint)).await;
    let (_, token_id) = wallet.include_next().unwrap();

    let snapshot = common::wait_until(&client.handle, |s| s.mint.is_terminal()).await;
    assert_eq!(snapshot.mint, MintStatus::Succeeded(token_id));
    client.stop().await;
}

#[tokio::test]
async fn test_sold_out_hides_mint() {
    let wallet = common::authorized_wallet();
    wallet.set_total_minted(common::CAPACITY);
    let client = common::start_connected(&wallet).await;

    let snapshot = client.handle.snapshot();
    assert_eq!(snapshot.total_minted, common::CAPACITY);
    assert!(!snapshot.can_mint);
    assert!(snapshot.is_sold_out());
    client.stop().await;
}

#[tokio::test]
async fn test_counter_keeps_last_value_on_failure() {
    let wallet = common::authorized_wallet();
    wallet.set_total_minted(3);
    let client = common::start_connected(&wallet).await;
    assert_eq!(client.handle.snapshot().total_minted, 3);

    wallet.fail_total_minted(Some(ProviderError::Rpc("node unavailable".into())));
    wallet.set_total_minted(4);
    client.handle.refresh_counter().unwrap();
    assert_eq!(client.handle.sync().await.unwrap().total_minted, 3);

    wallet.fail_total_minted(None);
    client.handle.refresh_counter().unwrap();
    assert_eq!(client.handle.sync().await.unwrap().total_minted, 4);
    client.stop().await;
}

#[tokio::test]
async fn test_simulated_wallet_mints_end_to_end() {
    let config = ClientConfig::default();
    let wallet = simulated_wallet(&config);
    let client = MintClient::from_config(InjectedProvider::present(wallet.clone()), &config).unwrap();
    let shutdown = Shutdown::new();
    let (handle, engine) = client.spawn(shutdown.subscribe());

    handle.check_silently().unwrap();
    handle.mint().unwrap();
    let snapshot = common::wait_until(&handle, |s| !s.is_busy && s.mint.is_terminal()).await;

    assert_eq!(snapshot.mint, MintStatus::Succeeded(U256::ZERO));
    common::wait_until(&handle, |s| s.total_minted == 1).await;

    shutdown.trigger();
    engine.await.unwrap();
}
