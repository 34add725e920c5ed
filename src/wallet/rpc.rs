use crate::error::{Result, SaysError};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const TRANSIENT_RETRIES: u32 = 2;

/// Minimal Ethereum JSON-RPC client over HTTP.
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .user_agent("saysome")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.into(),
            timeout,
            client,
            next_id: AtomicU64::new(1),
        }
    }

    /// Read-only polling request. Transient HTTP statuses (429/5xx) get a
    /// small, bounded retry.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let raw = self.request_raw(method, params).await?;
        decode(method, raw)
    }

    /// Single attempt, for transactions and user-triggered reads: a failure is
    /// reported and never resent.
    pub async fn request_once<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let raw = self.send(method, params, 0).await?;
        decode(method, raw)
    }

    pub async fn request_raw(&self, method: &str, params: Value) -> Result<Value> {
        self.send(method, params, TRANSIENT_RETRIES).await
    }

    async fn send(&self, method: &str, params: Value, retries: u32) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});

        let mut attempt = 0u32;
        loop {
            let res = self
                .client
                .post(&self.url)
                .json(&body)
                .timeout(self.timeout)
                .send()
                .await?;

            if !res.status().is_success() {
                if is_transient(res.status().as_u16()) && attempt < retries {
                    attempt += 1;
                    log::debug!("{method}: http {} (attempt {attempt})", res.status());
                    tokio::time::sleep(Duration::from_millis(150 * attempt as u64)).await;
                    continue;
                }
                return Err(SaysError::Rpc {
                    code: res.status().as_u16() as i64,
                    message: format!("http {}", res.status()),
                });
            }

            let v: Value = res.json().await?;
            return parse_response(v);
        }
    }
}

fn is_transient(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn decode<T: DeserializeOwned>(method: &str, raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|e| SaysError::Decode(format!("{method}: {e}")))
}

fn parse_response(v: Value) -> Result<Value> {
    if let Some(err) = v.get("error") {
        let code = err.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("rpc error")
            .to_string();
        return Err(SaysError::Rpc { code, message });
    }
    match v.get("result") {
        Some(r) => Ok(r.clone()),
        None => Err(SaysError::Decode("invalid rpc payload (no result)".to_string())),
    }
}
