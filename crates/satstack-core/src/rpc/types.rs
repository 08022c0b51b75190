//! Results of node RPC methods other than `getrawtransaction`, which decodes
//! straight into [`RawTransaction`].
//!
//! [`RawTransaction`]: crate::types::RawTransaction

use bitcoin::BlockHash;
use serde::Deserialize;

/// The subset of `getblockchaininfo` checked at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub chain: String,
    pub blocks: u64,
    /// Best header height known to the node. At least `blocks`.
    #[serde(default)]
    pub headers: u64,
    #[serde(rename = "bestblockhash")]
    pub best_block_hash: BlockHash,
    #[serde(rename = "initialblockdownload", default)]
    pub initial_block_download: bool,
    pub pruned: bool,
}

impl ChainInfo {
    /// Whether served confirmation counts can lag the network, because the
    /// node is still downloading blocks.
    pub fn is_syncing(&self) -> bool {
        self.initial_block_download || self.headers > self.blocks
    }
}
