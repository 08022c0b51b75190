//! Transaction lookup pipeline: fetch, resolve spent outputs, resolve the
//! block height, normalize.

use std::sync::Arc;

use bitcoin::Txid;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::normalize::normalize;
use crate::rpc::{cancellable, NodeRpc};
use crate::types::{BlockHeight, RawTransaction, Transaction};
use crate::utxo::resolve_utxos;

/// Entry point for transaction lookups.
///
/// Cheap to clone; every clone shares the same node client.
#[derive(Clone)]
pub struct TransactionService {
    rpc: Arc<dyn NodeRpc>,
}

impl TransactionService {
    pub fn new(rpc: Arc<dyn NodeRpc>) -> Self {
        Self { rpc }
    }

    /// Fetch `txid` and build its canonical record.
    ///
    /// Resolves every spent output and the containing block's height first.
    /// A failed height lookup is logged and served as unknown; every other
    /// failure aborts the call.
    pub async fn get_transaction(
        &self,
        txid: &Txid,
        cancel: &CancellationToken,
    ) -> Result<Transaction, CoreError> {
        let raw = cancellable(cancel, self.rpc.get_transaction(txid)).await?;
        let utxos = resolve_utxos(self.rpc.as_ref(), &raw.inputs, cancel).await?;
        let block_height = self.block_height(&raw, cancel).await?;

        let tx = normalize(&raw, &utxos, block_height)?;
        debug!(
            %txid,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            fees = tx.fees.to_sat(),
            "normalized transaction"
        );
        Ok(tx)
    }

    /// Fetch the consensus-encoded hex of `txid`, unmodified.
    pub async fn get_transaction_hex(
        &self,
        txid: &Txid,
        cancel: &CancellationToken,
    ) -> Result<String, CoreError> {
        let raw = cancellable(cancel, self.rpc.get_transaction(txid)).await?;
        Ok(raw.hex)
    }

    /// Best-effort height of the block containing `raw`.
    ///
    /// Unconfirmed transactions have none. Only cancellation is an error.
    async fn block_height(
        &self,
        raw: &RawTransaction,
        cancel: &CancellationToken,
    ) -> Result<Option<BlockHeight>, CoreError> {
        if raw.confirmations == 0 {
            return Ok(None);
        }
        if raw.block_height.is_some() {
            return Ok(raw.block_height);
        }
        let Some(block_hash) = raw.block_hash else {
            return Ok(None);
        };

        match cancellable(cancel, self.rpc.get_block_height(&block_hash)).await {
            Ok(height) => {
                if height.is_none() {
                    warn!(txid = %raw.txid, %block_hash, "node does not know the containing block");
                }
                Ok(height)
            }
            Err(CoreError::Cancelled) => Err(CoreError::Cancelled),
            Err(err) => {
                warn!(txid = %raw.txid, %block_hash, error = %err, "block height lookup failed");
                Ok(None)
            }
        }
    }
}
