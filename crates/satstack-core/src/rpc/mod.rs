//! Node RPC abstraction layer.
//!
//! Defines the [`NodeRpc`] trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockRpc`).

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::HttpRpcClient;
pub use types::ChainInfo;

use std::future::Future;

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::types::{BlockHeight, RawTransaction};

/// The Bitcoin Core RPC methods satstack needs.
///
/// Implementations are expected to handle authentication, connection
/// management, and response deserialization internally. Retries, if any,
/// belong here too; callers never retry.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Fetch a decoded transaction by txid.
    async fn get_transaction(&self, txid: &Txid) -> Result<RawTransaction, CoreError>;

    /// Fetch many decoded transactions, one per txid, in request order.
    /// Implementations may batch these requests into one or more RPC calls.
    async fn get_transactions(&self, txids: &[Txid]) -> Result<Vec<RawTransaction>, CoreError> {
        let mut results = Vec::with_capacity(txids.len());
        for txid in txids {
            results.push(self.get_transaction(txid).await?);
        }
        Ok(results)
    }

    /// Look up the height of a block. Returns `None` if the node does not
    /// know the block.
    async fn get_block_height(
        &self,
        block_hash: &BlockHash,
    ) -> Result<Option<BlockHeight>, CoreError>;

    /// Fetch basic chain info (network, block count, pruning status).
    async fn get_blockchain_info(&self) -> Result<ChainInfo, CoreError>;
}

/// Drive `fut` to completion unless `cancel` fires first, in which case the
/// future is dropped and [`CoreError::Cancelled`] is returned.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CoreError::Cancelled),
        result = fut => result,
    }
}
