use super::rpc::JsonRpcClient;
use crate::error::{Result, SaysError};
use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub block_number: Option<U64>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts carry no status and count as success.
    pub fn succeeded(&self) -> bool {
        self.status.map(|s| s != U64::ZERO).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub block_number: Option<U64>,
}

/// `eth_getLogs` filter: one contract, any of `topics` in position 0.
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<B256>,
    pub from_block: u64,
    pub to_block: u64,
}

/// The wallet as seen by the application: an EIP-1193 style provider that
/// holds the keys, answers reads and signs transactions.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompts for account access.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts already authorized, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>>;

    async fn chain_id(&self) -> Result<u64>;

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn send_transaction(&self, from: Address, to: Address, data: Bytes) -> Result<B256>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;

    async fn block_number(&self) -> Result<u64>;

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>>;
}

pub type ProviderHandle = Arc<dyn WalletProvider>;

/// Finds the wallet the application should talk to, if any is present.
#[async_trait]
pub trait WalletDiscovery: Send + Sync {
    async fn discover(&self) -> Option<ProviderHandle>;
}

/// Wallet reached over an Ethereum JSON-RPC endpoint that manages its own keys.
#[derive(Debug)]
pub struct RpcWallet {
    rpc: JsonRpcClient,
}

impl RpcWallet {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            rpc: JsonRpcClient::new(url, timeout),
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self.rpc.request_once("eth_requestAccounts", json!([])).await {
            Err(SaysError::Rpc { code, .. }) if code == METHOD_NOT_FOUND => {
                // Node-managed wallets have no prompt; their unlocked accounts are the grant.
                self.accounts().await
            }
            other => other,
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.rpc.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.rpc
            .request_once("eth_call", json!([{"to": to, "data": data}, "latest"]))
            .await
    }

    async fn send_transaction(&self, from: Address, to: Address, data: Bytes) -> Result<B256> {
        self.rpc
            .request_once(
                "eth_sendTransaction",
                json!([{"from": from, "to": to, "data": data}]),
            )
            .await
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.rpc
            .request("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    async fn block_number(&self) -> Result<u64> {
        let n: U64 = self.rpc.request("eth_blockNumber", json!([])).await?;
        Ok(n.to::<u64>())
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>> {
        self.rpc
            .request("eth_getLogs", json!([log_filter_params(filter)]))
            .await
    }
}

fn log_filter_params(filter: &LogFilter) -> Value {
    json!({
        "address": filter.address,
        "topics": [filter.topics],
        "fromBlock": format!("{:#x}", filter.from_block),
        "toBlock": format!("{:#x}", filter.to_block),
    })
}

/// Probes a JSON-RPC endpoint; a wallet "is present" when it answers.
pub struct RpcDiscovery {
    url: String,
    timeout: Duration,
}

impl RpcDiscovery {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl WalletDiscovery for RpcDiscovery {
    async fn discover(&self) -> Option<ProviderHandle> {
        let probe = JsonRpcClient::new(self.url.clone(), self.timeout);
        match probe.request_raw("web3_clientVersion", json!([])).await {
            Ok(version) => {
                log::info!("wallet provider at {}: {}", self.url, version);
                Some(Arc::new(RpcWallet::new(self.url.clone(), self.timeout)))
            }
            Err(e) => {
                log::warn!("no wallet provider at {}: {}", self.url, e);
                None
            }
        }
    }
}
