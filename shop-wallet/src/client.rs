/// Shop SDK seam and its HTTP implementation
///
/// The settings and history screens only talk to the shop backend through
/// [`ShopClient`]. [`RpcShopClient`] is the production implementation:
/// JSON-RPC for queries, newline-delimited JSON for the multi-step delegate
/// operations.
use crate::config_store::{NetworkConfig, SortDirection};
use crate::errors::{WalletError, WalletResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Step key reported when a delegate operation has completed.
pub const STEP_DONE: &str = "done";

/// One progress notification of a delegate operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationStep {
    pub key: String,
    /// Phase-specific fields (transaction hash, signature, ...)
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl DelegationStep {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.payload.insert(name.into(), value);
        self
    }

    pub fn is_done(&self) -> bool {
        self.key == STEP_DONE
    }
}

/// Lazy, finite sequence of delegate steps.
pub type StepStream = BoxStream<'static, WalletResult<DelegationStep>>;

/// Scheduled mileage that has not settled on-chain yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedProvideRecord {
    pub timestamp: i64,
    pub purchase_id: String,
    #[serde(default)]
    pub action: i64,
    pub provided_amount: String,
    pub currency: String,
}

/// Settled provide/use record from the shop trade history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryRecord {
    pub id: String,
    pub action: i64,
    pub increase: String,
    #[serde(default)]
    pub provided_amount: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub cancel: bool,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryPage {
    #[serde(default)]
    pub shop_trade_histories: Vec<TradeHistoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryQuery {
    pub limit: u32,
    pub skip: u32,
    pub sort_direction: SortDirection,
    pub sort_by: String,
}

/// Which app a push token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MobileType {
    UserApp,
    ShopApp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MobileOs {
    #[serde(rename = "android")]
    Android,
    #[serde(rename = "iOS")]
    Ios,
}

impl MobileOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            MobileOs::Android => "android",
            MobileOs::Ios => "iOS",
        }
    }

    /// Anything that is not Android registers as iOS.
    pub fn from_platform(platform: &str) -> Self {
        if platform.eq_ignore_ascii_case("android") {
            MobileOs::Android
        } else {
            MobileOs::Ios
        }
    }
}

/// Operations the screens consume from the shop SDK.
#[async_trait]
pub trait ShopClient: Send + Sync {
    async fn create_delegate(&self, shop_id: &str) -> WalletResult<StepStream>;

    async fn remove_delegate(&self, shop_id: &str) -> WalletResult<StepStream>;

    async fn get_estimated_provide_history(
        &self,
        shop_id: &str,
    ) -> WalletResult<Vec<EstimatedProvideRecord>>;

    async fn get_provide_and_use_trade_history(
        &self,
        shop_id: &str,
        query: &TradeHistoryQuery,
    ) -> WalletResult<TradeHistoryPage>;

    async fn register_mobile_token(
        &self,
        token: &str,
        language: &str,
        os: MobileOs,
        app_type: MobileType,
    ) -> WalletResult<()>;
}

/// Authenticated client plus the wallet address it signs for.
#[derive(Clone)]
pub struct ClientHandle {
    pub client: Arc<dyn ShopClient>,
    pub address: String,
}

/// Source of authenticated clients, consulted on every screen action.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    async fn client(&self) -> WalletResult<ClientHandle>;
}

/// Hands out the same client every time.
#[derive(Clone)]
pub struct SharedClientProvider {
    handle: ClientHandle,
}

impl SharedClientProvider {
    pub fn new(client: Arc<dyn ShopClient>, address: impl Into<String>) -> Self {
        Self {
            handle: ClientHandle {
                client,
                address: address.into(),
            },
        }
    }
}

#[async_trait]
impl ClientProvider for SharedClientProvider {
    async fn client(&self) -> WalletResult<ClientHandle> {
        Ok(self.handle.clone())
    }
}

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: String,
    method: String,
    params: T,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// HTTP client for the shop and ledger endpoints
pub struct RpcShopClient {
    client: Client,
    base_url: String,
}

impl RpcShopClient {
    pub fn new(config: &NetworkConfig) -> WalletResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| {
                WalletError::NetworkError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(RpcShopClient {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn delegate_steps(&self, operation: &str, shop_id: &str) -> WalletResult<StepStream> {
        let url = format!("{}/shop/delegate/{}", self.base_url, operation);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "shopId": shop_id }))
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WalletError::NetworkError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(WalletError::from));
        Ok(decode_step_lines(chunks))
    }

    async fn rpc_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Value,
    ) -> WalletResult<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let url = format!("{}/jsonrpc", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WalletError::NetworkError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let rpc_response: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| WalletError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(WalletError::NetworkError(format!(
                "RPC error {}: {}",
                error.code, error.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| WalletError::InvalidResponse("No result in RPC response".to_string()))
    }
}

#[async_trait]
impl ShopClient for RpcShopClient {
    async fn create_delegate(&self, shop_id: &str) -> WalletResult<StepStream> {
        self.delegate_steps("create", shop_id).await
    }

    async fn remove_delegate(&self, shop_id: &str) -> WalletResult<StepStream> {
        self.delegate_steps("remove", shop_id).await
    }

    async fn get_estimated_provide_history(
        &self,
        shop_id: &str,
    ) -> WalletResult<Vec<EstimatedProvideRecord>> {
        let params = serde_json::json!({ "shopId": shop_id });
        self.rpc_call("shop_getEstimatedProvideHistory", params)
            .await
    }

    async fn get_provide_and_use_trade_history(
        &self,
        shop_id: &str,
        query: &TradeHistoryQuery,
    ) -> WalletResult<TradeHistoryPage> {
        let params = serde_json::json!({
            "shopId": shop_id,
            "limit": query.limit,
            "skip": query.skip,
            "sortDirection": query.sort_direction,
            "sortBy": query.sort_by,
        });
        self.rpc_call("shop_getProvideAndUseTradeHistory", params)
            .await
    }

    async fn register_mobile_token(
        &self,
        token: &str,
        language: &str,
        os: MobileOs,
        app_type: MobileType,
    ) -> WalletResult<()> {
        let params = serde_json::json!({
            "token": token,
            "language": language,
            "os": os.as_str(),
            "type": app_type,
        });
        let _: Value = self.rpc_call("ledger_registerMobileToken", params).await?;
        Ok(())
    }
}

struct LineState {
    chunks: BoxStream<'static, WalletResult<Vec<u8>>>,
    buffer: Vec<u8>,
    finished: bool,
}

/// Turn a chunked NDJSON body into a stream of steps, one per line.
///
/// Blank lines are skipped. A transport error is yielded once and ends the stream.
pub fn decode_step_lines<S>(chunks: S) -> StepStream
where
    S: Stream<Item = WalletResult<Vec<u8>>> + Send + 'static,
{
    let state = LineState {
        chunks: chunks.boxed(),
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                match parse_step_line(&line) {
                    Some(item) => return Some((item, state)),
                    None => continue,
                }
            }

            if state.finished {
                let line = std::mem::take(&mut state.buffer);
                return parse_step_line(&line).map(|item| (item, state));
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    state.finished = true;
                    state.buffer.clear();
                    return Some((Err(err), state));
                }
                None => state.finished = true,
            }
        }
    })
    .boxed()
}

fn parse_step_line(line: &[u8]) -> Option<WalletResult<DelegationStep>> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            return Some(Err(WalletError::InvalidResponse(format!(
                "Step is not UTF-8: {}",
                e
            ))))
        }
    };
    if text.is_empty() {
        return None;
    }

    Some(serde_json::from_str::<DelegationStep>(text).map_err(|e| {
        WalletError::InvalidResponse(format!("Malformed delegation step: {}", e))
    }))
}


#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires running shop RPC server at localhost:8545"]
    async fn test_real_history_calls() {
        let client = RpcShopClient::new(&NetworkConfig::default()).unwrap();
        let estimated = client.get_estimated_provide_history("shop-1").await;
        assert!(estimated.is_ok(), "Estimated history call should succeed");

        let query = TradeHistoryQuery {
            limit: 100,
            skip: 0,
            sort_direction: SortDirection::Desc,
            sort_by: "blockNumber".to_string(),
        };
        let trades = client
            .get_provide_and_use_trade_history("shop-1", &query)
            .await;
        assert!(trades.is_ok(), "Trade history call should succeed");
    }
}
