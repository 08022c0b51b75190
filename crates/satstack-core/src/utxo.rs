//! Resolution of spent outputs.
//!
//! Maps every outpoint a transaction spends back to the value and address
//! of the output it consumes, fetching each funding transaction once.

use std::collections::{HashMap, HashSet};

use bitcoin::{OutPoint, Txid};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{CoreError, RpcError};
use crate::rpc::{cancellable, NodeRpc};
use crate::types::{RawInput, RawTransaction, UtxoEntry, UtxoMap};
use crate::units::parse_btc_amount;

/// Build the UTXO lookup for `inputs`.
///
/// Coinbase inputs reference nothing and are skipped. The remaining inputs'
/// funding transactions are deduplicated and fetched in a single
/// [`NodeRpc::get_transactions`] call, so each previous txid costs exactly
/// one fetch even when several inputs spend outputs of the same
/// transaction.
///
/// Only referenced outputs are extracted. A referenced output index that
/// does not exist in its funding transaction leaves no entry; the
/// normalizer reports it.
///
/// Any fetch failure aborts resolution. There are no retries here. A
/// funding transaction the node reports as unknown is an upstream failure
/// ([`RpcError::FundingTxUnavailable`]), not a missing requested
/// transaction.
pub async fn resolve_utxos(
    rpc: &dyn NodeRpc,
    inputs: &[RawInput],
    cancel: &CancellationToken,
) -> Result<UtxoMap, CoreError> {
    let spent: Vec<OutPoint> = inputs.iter().filter_map(RawInput::prevout).collect();
    if spent.is_empty() {
        return Ok(UtxoMap::new());
    }

    let funding_txids = distinct_funding_txids(&spent);
    debug!(
        spent_outputs = spent.len(),
        funding_txs = funding_txids.len(),
        "resolving spent outputs"
    );

    let funding_txs = cancellable(cancel, rpc.get_transactions(&funding_txids))
        .await
        .map_err(|err| match err {
            CoreError::TxNotFound(txid) => RpcError::FundingTxUnavailable { txid }.into(),
            other => other,
        })?;
    let funding_by_txid: HashMap<Txid, RawTransaction> = funding_txs
        .into_iter()
        .map(|tx| (tx.txid, tx))
        .collect();

    let mut utxos = UtxoMap::with_capacity(spent.len());
    for outpoint in spent {
        if utxos.contains_key(&outpoint) {
            continue;
        }

        let funding_tx = funding_by_txid.get(&outpoint.txid).ok_or_else(|| {
            RpcError::InvalidResponse(format!(
                "node did not return funding transaction {}",
                outpoint.txid
            ))
        })?;

        let Some(output) = funding_tx.outputs.iter().find(|o| o.n == outpoint.vout) else {
            debug!(%outpoint, "funding transaction has no such output");
            continue;
        };

        utxos.insert(
            outpoint,
            UtxoEntry {
                value: parse_btc_amount(&output.value)?,
                address: output.single_address().map(str::to_owned),
            },
        );
    }

    Ok(utxos)
}

/// Distinct funding txids in first-seen order.
fn distinct_funding_txids(spent: &[OutPoint]) -> Vec<Txid> {
    let mut seen = HashSet::with_capacity(spent.len());
    spent
        .iter()
        .map(|outpoint| outpoint.txid)
        .filter(|txid| seen.insert(*txid))
        .collect()
}
