//! Conversion of raw node transactions into canonical explorer records.

use bitcoin::{Amount, SignedAmount};
use tracing::warn;

use crate::error::CoreError;
use crate::types::{
    Block, BlockHeight, CoinbaseInput, Input, Output, RawInput, RawTransaction, SpendInput,
    Transaction, UtxoMap,
};
use crate::units::{parse_btc_amount, parse_unix_timestamp};

/// Subtracted from the node's confirmation count before it is served.
///
/// Downstream explorers count a transaction in the tip block as having zero
/// confirmations where Bitcoin Core reports one. The subtraction saturates,
/// so mempool transactions (zero reported) stay at zero.
pub const DISPLAY_CONFIRMATION_OFFSET: u64 = 1;

/// Build the canonical record for `raw`.
///
/// `utxos` must hold an entry for every outpoint the transaction spends.
/// A missing entry is logged and produces a spend input with no value or
/// address; it contributes nothing to the fee.
///
/// Fails only with [`CoreError::MalformedAmount`], when an output value
/// cannot be parsed into satoshis or the value sums overflow. The fee is
/// passed through without checking that it is non-negative.
pub fn normalize(
    raw: &RawTransaction,
    utxos: &UtxoMap,
    block_height: Option<BlockHeight>,
) -> Result<Transaction, CoreError> {
    let mut inputs = Vec::with_capacity(raw.inputs.len());
    let mut total_in = Amount::ZERO;

    for (input_index, raw_input) in (0u32..).zip(&raw.inputs) {
        match raw_input {
            RawInput::Coinbase {
                coinbase,
                sequence,
                witness,
            } => {
                inputs.push(Input::Coinbase(CoinbaseInput {
                    input_index,
                    coinbase: coinbase.clone(),
                    sequence: *sequence,
                    witness: witness.clone().unwrap_or_default(),
                }));
            }
            RawInput::Spend {
                prevout,
                script_sig,
                sequence,
                witness,
            } => {
                let entry = utxos.get(prevout);
                match entry {
                    Some(entry) => total_in = checked_total(total_in, entry.value, "input")?,
                    None => warn!(
                        txid = %raw.txid,
                        input_index,
                        %prevout,
                        "no UTXO entry for spent output; serving input without value"
                    ),
                }

                inputs.push(Input::Spend(SpendInput {
                    input_index,
                    output_hash: prevout.txid,
                    output_index: prevout.vout,
                    value: entry.map(|e| e.value),
                    address: entry.and_then(|e| e.address.clone()),
                    script_sig: script_sig.clone(),
                    sequence: *sequence,
                    witness: witness.clone().unwrap_or_default(),
                }));
            }
        }
    }

    let mut outputs = Vec::with_capacity(raw.outputs.len());
    let mut total_out = Amount::ZERO;

    for raw_output in &raw.outputs {
        let value = parse_btc_amount(&raw_output.value).map_err(|err| match err {
            CoreError::MalformedAmount(msg) => {
                CoreError::MalformedAmount(format!("{} vout {}: {msg}", raw.txid, raw_output.n))
            }
            other => other,
        })?;
        total_out = checked_total(total_out, value, "output")?;

        outputs.push(Output {
            output_index: raw_output.n,
            value,
            script_hex: raw_output.script_hex.clone(),
            address: raw_output.single_address().map(str::to_owned),
        });
    }

    let fees = if raw.is_coinbase() {
        SignedAmount::ZERO
    } else {
        fee(total_in, total_out)?
    };

    Ok(Transaction {
        id: raw.txid,
        hash: raw.hash,
        received_at: raw.time.and_then(parse_unix_timestamp),
        lock_time: raw.locktime,
        inputs,
        outputs,
        block: Block {
            hash: raw.block_hash,
            height: block_height,
            time: raw.block_time.and_then(parse_unix_timestamp),
        },
        confirmations: raw
            .confirmations
            .saturating_sub(DISPLAY_CONFIRMATION_OFFSET),
        fees,
    })
}

fn checked_total(total: Amount, value: Amount, side: &str) -> Result<Amount, CoreError> {
    total
        .checked_add(value)
        .ok_or_else(|| CoreError::MalformedAmount(format!("{side} value sum overflows")))
}

fn fee(total_in: Amount, total_out: Amount) -> Result<SignedAmount, CoreError> {
    let total_in = i64::try_from(total_in.to_sat())
        .map_err(|_| CoreError::MalformedAmount("input value sum out of range".into()))?;
    let total_out = i64::try_from(total_out.to_sat())
        .map_err(|_| CoreError::MalformedAmount("output value sum out of range".into()))?;
    Ok(SignedAmount::from_sat(total_in - total_out))
}
