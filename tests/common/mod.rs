//! Shared utilities for integration tests.

#![allow(dead_code)]

use alloy::primitives::Address;
use std::time::Duration;
use tokio::task::JoinHandle;

use mint_client::gateway::{ChainGateway, InMemoryWallet, InjectedProvider};
use mint_client::lifecycle::Shutdown;
use mint_client::reconciler::{ClientHandle, EngineSettings, MintClient, Snapshot};
use mint_client::session::ChainGuard;

pub const REQUIRED_CHAIN: &str = "0x4";
pub const ACCOUNT: Address = Address::repeat_byte(0xaa);
pub const OTHER: Address = Address::repeat_byte(0xbb);
pub const CONTRACT: Address = Address::repeat_byte(0xcc);
pub const CAPACITY: u64 = 100;

const WAIT_LIMIT: Duration = Duration::from_secs(3);

pub fn settings() -> EngineSettings {
    EngineSettings {
        confirmation_timeout: Duration::from_secs(5),
        event_grace: Duration::from_secs(5),
        reset_mint_on_account_switch: false,
    }
}

/// A wallet on the required chain with no accounts.
pub fn wallet() -> InMemoryWallet {
    InMemoryWallet::new(REQUIRED_CHAIN, CAPACITY)
}

/// A wallet that already authorized `ACCOUNT` in an earlier session.
pub fn authorized_wallet() -> InMemoryWallet {
    let wallet = wallet();
    wallet.set_accounts(vec![ACCOUNT]);
    wallet.authorize();
    wallet
}

pub struct TestClient {
    pub handle: ClientHandle,
    pub shutdown: Shutdown,
    pub engine: JoinHandle<()>,
}

impl TestClient {
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(WAIT_LIMIT, self.engine).await;
    }
}

pub fn start_with(provider: InjectedProvider<InMemoryWallet>, settings: EngineSettings) -> TestClient {
    let gateway = ChainGateway::new(provider, CONTRACT, Duration::from_secs(1));
    let client = MintClient::new(gateway, ChainGuard::new(REQUIRED_CHAIN), CAPACITY, settings);
    let shutdown = Shutdown::new();
    let (handle, engine) = client.spawn(shutdown.subscribe());
    TestClient {
        handle,
        shutdown,
        engine,
    }
}

pub fn start(wallet: &InMemoryWallet) -> TestClient {
    start_with(InjectedProvider::present(wallet.clone()), settings())
}

/// Start and adopt the authorized account.
pub async fn start_connected(wallet: &InMemoryWallet) -> TestClient {
    let client = start(wallet);
    client.handle.check_silently().unwrap();
    let snapshot = client.handle.sync().await.unwrap();
    assert_eq!(snapshot.active_address, Some(ACCOUNT));
    client
}

/// Wait for a snapshot matching `predicate`, failing the test after a
/// bounded time.
pub async fn wait_until(
    handle: &ClientHandle,
    predicate: impl FnMut(&Snapshot) -> bool,
) -> Snapshot {
    match tokio::time::timeout(WAIT_LIMIT, handle.wait_for(predicate)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => panic!("{}", e),
        Err(_) => panic!("timed out waiting for snapshot, last: {:?}", handle.snapshot()),
    }
}

/// Poll `condition` until it holds, failing the test after a bounded time.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition never held");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
