//! Shared utilities for integration testing.
//!
//! Starts the real HTTP server on an ephemeral port, backed by an in-memory
//! chain, with accounts "1", "2" and "3" loaded from fixed dev keys.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use bid_relay::accounts::AccountResolver;
use bid_relay::blockchain::MockChain;
use bid_relay::config::{AccountConfig, RelayConfig};
use bid_relay::http::HttpServer;
use bid_relay::lifecycle::startup::assemble;
use bid_relay::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const CHAIN_ID: u64 = 31337;
pub const CONTRACT: &str = "0x1d370423be52f9424b11163162F78f2e912C4907";

/// Well-known development keys; never funded on a real network.
const DEV_KEYS: [(&str, &str); 3] = [
    ("1", "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"),
    ("2", "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"),
    ("3", "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a"),
];

/// One ether, in wei.
pub fn ether() -> U256 {
    U256::from(10u64).pow(U256::from(18u64))
}

pub fn relay_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.network.rpc_url = "http://127.0.0.1:1".to_string();
    config.network.chain_id = CHAIN_ID;
    config.bidding.contract_address = CONTRACT.to_string();
    config.bidding.confirmation_timeout_secs = 1;
    config.bidding.poll_interval_ms = 20;
    config.timeouts.request_secs = 10;
    for (identifier, _) in DEV_KEYS {
        config.accounts.push(AccountConfig {
            identifier: identifier.to_string(),
            private_key_env: format!("TEST_PRIVATE_KEY_{}", identifier),
        });
    }
    config
}

/// A running relay and the chain behind it.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub chain: Arc<MockChain>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
    addresses: HashMap<String, Address>,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn address_of(&self, identifier: &str) -> Address {
        self.addresses[identifier]
    }

    pub async fn post_bid(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url("/bid"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

/// Start a relay whose accounts "1" and "2" hold 100 ether; "3" is left empty.
pub async fn start_relay(chain: MockChain) -> TestRelay {
    start_relay_with(relay_config(), chain).await
}

pub async fn start_relay_with(config: RelayConfig, chain: MockChain) -> TestRelay {
    let keys: HashMap<String, String> = DEV_KEYS
        .iter()
        .map(|(id, key)| (format!("TEST_PRIVATE_KEY_{}", id), key.to_string()))
        .collect();
    let resolver =
        AccountResolver::from_config_with(&config.accounts, |var| keys.get(var).cloned()).unwrap();

    let chain = Arc::new(chain);
    let mut addresses = HashMap::new();
    for identifier in resolver.identifiers() {
        let address = resolver.resolve(identifier).unwrap().address();
        if identifier != "3" {
            chain.fund(address, ether() * U256::from(100u64));
        }
        addresses.insert(identifier.to_string(), address);
    }

    let runtime = assemble(&config, resolver, chain.clone()).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, runtime);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    // Give the server a moment to start accepting.
    tokio::time::sleep(Duration::from_millis(20)).await;

    TestRelay {
        addr,
        chain,
        shutdown,
        handle,
        addresses,
    }
}
