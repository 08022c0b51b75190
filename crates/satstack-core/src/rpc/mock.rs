use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, Txid};

use crate::error::{CoreError, RpcError};
use crate::types::{BlockHeight, RawTransaction};

use super::types::ChainInfo;
use super::NodeRpc;

/// A mock node backend for testing. Returns canned transaction data from a
/// `HashMap` populated via the builder pattern, and records every txid it
/// is asked for so tests can assert on fetch counts.
pub struct MockRpc {
    transactions: HashMap<Txid, RawTransaction>,
    block_heights: HashMap<BlockHash, BlockHeight>,
    failing_txids: HashSet<Txid>,
    fail_block_heights: bool,
    chain_info: ChainInfo,
    fetches: Mutex<Vec<Txid>>,
}

impl MockRpc {
    pub fn builder() -> MockRpcBuilder {
        MockRpcBuilder {
            transactions: HashMap::new(),
            block_heights: HashMap::new(),
            failing_txids: HashSet::new(),
            fail_block_heights: false,
            chain_info: ChainInfo {
                chain: "regtest".into(),
                blocks: 100,
                headers: 100,
                best_block_hash: BlockHash::all_zeros(),
                initial_block_download: false,
                pruned: false,
            },
        }
    }

    /// Every txid requested so far, in request order.
    pub fn fetched(&self) -> Vec<Txid> {
        self.fetches
            .lock()
            .expect("mock fetch log poisoned")
            .clone()
    }

    /// How many times `txid` was requested.
    pub fn fetch_count(&self, txid: &Txid) -> usize {
        self.fetched().iter().filter(|t| *t == txid).count()
    }
}

pub struct MockRpcBuilder {
    transactions: HashMap<Txid, RawTransaction>,
    block_heights: HashMap<BlockHash, BlockHeight>,
    failing_txids: HashSet<Txid>,
    fail_block_heights: bool,
    chain_info: ChainInfo,
}

impl MockRpcBuilder {
    pub fn with_tx(mut self, tx: RawTransaction) -> Self {
        self.transactions.insert(tx.txid, tx);
        self
    }

    pub fn with_block_height(mut self, block_hash: BlockHash, height: u32) -> Self {
        self.block_heights.insert(block_hash, BlockHeight(height));
        self
    }

    /// Make fetches of `txid` fail with a transport-level RPC error.
    pub fn with_failing_tx(mut self, txid: Txid) -> Self {
        self.failing_txids.insert(txid);
        self
    }

    /// Make every block height lookup fail with an RPC error.
    pub fn with_failing_block_heights(mut self) -> Self {
        self.fail_block_heights = true;
        self
    }

    pub fn build(self) -> MockRpc {
        MockRpc {
            transactions: self.transactions,
            block_heights: self.block_heights,
            failing_txids: self.failing_txids,
            fail_block_heights: self.fail_block_heights,
            chain_info: self.chain_info,
            fetches: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NodeRpc for MockRpc {
    async fn get_transaction(&self, txid: &Txid) -> Result<RawTransaction, CoreError> {
        self.fetches
            .lock()
            .expect("mock fetch log poisoned")
            .push(*txid);

        if self.failing_txids.contains(txid) {
            return Err(CoreError::Rpc(RpcError::ServerError {
                code: -28,
                message: "Loading block index...".to_string(),
            }));
        }
        self.transactions
            .get(txid)
            .cloned()
            .ok_or(CoreError::TxNotFound(*txid))
    }

    async fn get_block_height(
        &self,
        block_hash: &BlockHash,
    ) -> Result<Option<BlockHeight>, CoreError> {
        if self.fail_block_heights {
            return Err(CoreError::Rpc(RpcError::InvalidResponse(
                "getblockheader unavailable".to_string(),
            )));
        }
        Ok(self.block_heights.get(block_hash).copied())
    }

    async fn get_blockchain_info(&self) -> Result<ChainInfo, CoreError> {
        Ok(self.chain_info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn default_batch_fetch_goes_through_single_fetch() {
        let a = raw_tx(txid_from_byte(1), vec![coinbase_input()], vec![output(1.0, &[])]);
        let b = raw_tx(txid_from_byte(2), vec![coinbase_input()], vec![output(2.0, &[])]);
        let rpc = MockRpc::builder().with_tx(a).with_tx(b).build();

        let txs = rpc
            .get_transactions(&[txid_from_byte(2), txid_from_byte(1)])
            .await
            .expect("both transactions are known");
        assert_eq!(txs[0].txid, txid_from_byte(2));
        assert_eq!(txs[1].txid, txid_from_byte(1));
        assert_eq!(rpc.fetched(), vec![txid_from_byte(2), txid_from_byte(1)]);
    }

    #[tokio::test]
    async fn unknown_tx_is_not_found() {
        let rpc = MockRpc::builder().build();
        let err = rpc
            .get_transaction(&txid_from_byte(9))
            .await
            .expect_err("unknown txid must fail");
        assert!(matches!(err, CoreError::TxNotFound(_)));
    }
}
