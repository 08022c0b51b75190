use std::collections::HashMap;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};
use futures::future::try_join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use lru::LruCache;
use reqwest::{header, Url};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::error::{CoreError, RpcError};
use crate::types::{BlockHeight, RawTransaction};

use super::super::types::ChainInfo;
use super::super::NodeRpc;
use super::connection::{parse_connection, resolve_auth, Credentials};
use super::parsing::{parse_integer_optional, parse_raw_transaction};
use super::protocol::{is_not_found, parse_batch_id, JsonRpcRequest, JsonRpcResponse};

/// Maximum number of block-hash → height entries cached in memory.
const BLOCK_HEIGHT_CACHE_CAP: usize = 10_000;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A JSON-RPC method name with its positional params.
type RpcCall = (&'static str, Vec<serde_json::Value>);

/// Bitcoin Core JSON-RPC client over HTTP(S).
///
/// Supports both single and batched RPC calls. Maintains an LRU cache of
/// block-hash-to-height mappings to avoid redundant `getblockheader` calls
/// for confirmed transactions.
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: Url,
    auth: Option<Credentials>,
    limiter: Option<DirectRateLimiter>,
    batch_chunk_size: usize,
    next_id: AtomicU64,
    /// Confirmed block heights are immutable, so entries never need
    /// invalidation, only eviction.
    block_height_cache: RwLock<LruCache<BlockHash, BlockHeight>>,
}

impl HttpRpcClient {
    /// Create a new client for an HTTP(S) URL.
    ///
    /// Authentication precedence:
    /// 1. explicit `user` + `pass`
    /// 2. cookie file (`username:password`) from `cookie_file`
    /// 3. no auth
    ///
    /// If `requests_per_second` is set, calls are rate-limited per outbound
    /// HTTP request (batched calls count as one request).
    pub fn new(
        connection: &str,
        user: Option<&str>,
        pass: Option<&str>,
        cookie_file: Option<&Path>,
        requests_per_second: Option<u32>,
        batch_chunk_size: usize,
    ) -> Result<Self, CoreError> {
        if batch_chunk_size == 0 {
            return Err(CoreError::Config(
                "rpc batch chunk size must be at least 1".to_owned(),
            ));
        }
        let auth = resolve_auth(user, pass, cookie_file)?;
        let url = parse_connection(connection)?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::Config(format!("build HTTP client: {e}")))?;

        let limiter = requests_per_second
            .map(|limit| {
                NonZeroU32::new(limit)
                    .map(|limit| RateLimiter::direct(Quota::per_second(limit)))
                    .ok_or_else(|| {
                        CoreError::Config("requests_per_second must be at least 1".to_owned())
                    })
            })
            .transpose()?;

        Ok(Self {
            client,
            url,
            auth,
            limiter,
            batch_chunk_size,
            next_id: AtomicU64::new(initial_request_id()),
            block_height_cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(BLOCK_HEIGHT_CACHE_CAP).unwrap_or(NonZeroUsize::MIN),
            )),
        })
    }

    /// Atomically reserve `count` consecutive request IDs for batch calls.
    fn reserve_request_ids(&self, count: u64) -> u64 {
        self.next_id.fetch_add(count, Ordering::Relaxed)
    }

    /// POST a JSON body to the node and return the raw response text.
    async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<String, CoreError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let mut builder = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.user, Some(&auth.pass));
        }

        let response = builder.send().await.map_err(RpcError::Transport)?;
        let status = response.status();
        // Core answers RPC errors with a JSON body, but auth failures come
        // back as bare HTTP statuses.
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RpcError::InvalidResponse(format!("HTTP status {status}")).into());
        }
        let text = response.text().await.map_err(RpcError::Transport)?;
        debug!(%status, body_len = text.len(), "rpc http response");
        Ok(text)
    }

    async fn rpc_call(
        &self,
        method: &'static str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        let id = self.reserve_request_ids(1);
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );

        let body = self
            .post(&JsonRpcRequest::new(id, method, &params))
            .await?;
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        let decoded: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!("decode JSON-RPC response: {e}; body={body}"))
        })?;
        decoded.into_result()
    }

    async fn rpc_batch(&self, calls: &[RpcCall]) -> Result<Vec<serde_json::Value>, CoreError> {
        let start_id = self.reserve_request_ids(calls.len() as u64);
        debug!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            "rpc batch call"
        );
        let requests: Vec<JsonRpcRequest<'_>> = calls
            .iter()
            .zip(start_id..)
            .map(|((method, params), id)| JsonRpcRequest::new(id, method, params))
            .collect();

        let body = self.post(&requests).await?;
        trace!(
            rpc.batch_start_id = start_id,
            rpc.batch_size = calls.len(),
            body = %body,
            "rpc batch response body"
        );

        let decoded: Vec<JsonRpcResponse> = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!("decode JSON-RPC batch response: {e}; body={body}"))
        })?;

        // Responses may arrive in any order; re-key them by id.
        let mut by_id: HashMap<u64, JsonRpcResponse> = HashMap::with_capacity(decoded.len());
        for item in decoded {
            by_id.insert(parse_batch_id(&item.id)?, item);
        }

        (start_id..start_id + calls.len() as u64)
            .map(|id| {
                by_id
                    .remove(&id)
                    .ok_or(RpcError::MissingBatchItem { id })?
                    .into_result()
            })
            .collect()
    }

    async fn rpc_batch_chunked(
        &self,
        calls: &[RpcCall],
    ) -> Result<Vec<serde_json::Value>, CoreError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        // Keep each payload small enough for node/proxy limits while still
        // issuing chunks concurrently to avoid serial round-trip latency.
        let chunk_futures: Vec<_> = calls
            .chunks(self.batch_chunk_size)
            .map(|chunk| self.rpc_batch(chunk))
            .collect();
        let chunked = try_join_all(chunk_futures).await?;
        Ok(chunked.into_iter().flatten().collect())
    }
}

fn getrawtransaction_call(txid: &Txid) -> RpcCall {
    (
        "getrawtransaction",
        vec![serde_json::json!(txid.to_string()), serde_json::json!(1)],
    )
}

#[async_trait]
impl NodeRpc for HttpRpcClient {
    async fn get_transaction(&self, txid: &Txid) -> Result<RawTransaction, CoreError> {
        let (method, params) = getrawtransaction_call(txid);
        let raw = self
            .rpc_call(method, params)
            .await
            .map_err(|err| normalize_getrawtransaction_error(txid, err))?;
        parse_raw_transaction(&raw)
    }

    async fn get_transactions(&self, txids: &[Txid]) -> Result<Vec<RawTransaction>, CoreError> {
        if txids.is_empty() {
            return Ok(Vec::new());
        }

        let calls: Vec<RpcCall> = txids.iter().map(getrawtransaction_call).collect();

        match self.rpc_batch_chunked(&calls).await {
            Ok(raw_results) => raw_results.iter().map(parse_raw_transaction).collect(),
            Err(batch_error) => {
                // A single bad item fails the whole batch; the sequential
                // path attributes the failure to the right txid.
                warn!(
                    tx_count = txids.len(),
                    error = %batch_error,
                    "batch getrawtransaction failed; falling back to sequential requests"
                );

                let mut sequential = Vec::with_capacity(txids.len());
                for txid in txids {
                    sequential.push(self.get_transaction(txid).await?);
                }
                Ok(sequential)
            }
        }
    }

    async fn get_block_height(
        &self,
        block_hash: &BlockHash,
    ) -> Result<Option<BlockHeight>, CoreError> {
        // The LRU cache requires a write lock for `get` (it updates recency),
        // but the lookup is fast so the write lock is acceptable.
        if let Some(height) = self
            .block_height_cache
            .write()
            .await
            .get(block_hash)
            .copied()
        {
            return Ok(Some(height));
        }

        let raw = match self
            .rpc_call(
                "getblockheader",
                vec![
                    serde_json::json!(block_hash.to_string()),
                    serde_json::json!(true),
                ],
            )
            .await
        {
            Ok(raw) => raw,
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => return Err(err),
        };

        let height = parse_integer_optional::<u32, false>(raw.get("height")).map(BlockHeight);
        if let Some(height) = height {
            self.block_height_cache
                .write()
                .await
                .put(*block_hash, height);
        }
        Ok(height)
    }

    async fn get_blockchain_info(&self) -> Result<ChainInfo, CoreError> {
        let raw = self.rpc_call("getblockchaininfo", Vec::new()).await?;
        serde_json::from_value(raw).map_err(|e| {
            RpcError::InvalidResponse(format!("invalid getblockchaininfo result: {e}")).into()
        })
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

// ==============================================================================
// RPC Error Normalization
// ==============================================================================

/// Convert Bitcoin Core "missing tx" JSON-RPC responses into `TxNotFound`.
///
/// This keeps not-found semantics strongly typed for upstream HTTP mapping,
/// while preserving other RPC/transport failures as-is.
fn normalize_getrawtransaction_error(txid: &Txid, err: CoreError) -> CoreError {
    if is_not_found(&err) {
        CoreError::TxNotFound(*txid)
    } else {
        err
    }
}
