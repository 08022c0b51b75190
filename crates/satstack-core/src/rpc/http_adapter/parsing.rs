use bitcoin::{BlockHash, OutPoint, Txid, Wtxid};

use crate::error::CoreError;
use crate::types::{BlockHeight, RawInput, RawOutput, RawTransaction};

/// Decode a verbose `getrawtransaction` result.
///
/// Output values are kept as the node rendered them; converting them to
/// satoshis is the normalizer's job.
pub(super) fn parse_raw_transaction(raw: &serde_json::Value) -> Result<RawTransaction, CoreError> {
    let txid = parse_txid(raw.get("txid"), "txid")?;
    // Nodes predating segwit omit `hash`; the witness hash then equals the txid.
    let hash = match raw.get("hash").and_then(serde_json::Value::as_str) {
        Some(s) => s
            .parse::<Wtxid>()
            .map_err(|e| CoreError::InvalidTxData(format!("invalid hash: {e}")))?,
        None => Wtxid::from_raw_hash(txid.to_raw_hash()),
    };
    let locktime = parse_integer_required::<u32, false>(raw.get("locktime"), "locktime")?;
    let hex = raw
        .get("hex")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData("missing hex".into()))?
        .to_owned();

    let vin = raw
        .get("vin")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidTxData("missing vin array".into()))?;
    let vout = raw
        .get("vout")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidTxData("missing vout array".into()))?;

    Ok(RawTransaction {
        txid,
        hash,
        locktime,
        time: parse_integer_optional::<u64, false>(raw.get("time")),
        block_hash: parse_opt_block_hash(raw.get("blockhash"))?,
        block_time: parse_integer_optional::<u64, false>(raw.get("blocktime")),
        block_height: parse_integer_optional::<u32, false>(raw.get("blockheight"))
            .map(BlockHeight),
        confirmations: parse_integer_optional::<u64, false>(raw.get("confirmations"))
            .unwrap_or(0),
        hex,
        inputs: parse_vin(vin)?,
        outputs: parse_vout(vout)?,
    })
}

fn parse_txid(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Txid, CoreError> {
    let value = value
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|e| CoreError::InvalidTxData(format!("invalid {field}: {e}")))
}

fn parse_opt_block_hash(
    value: Option<&serde_json::Value>,
) -> Result<Option<BlockHash>, CoreError> {
    match value.and_then(serde_json::Value::as_str) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid blockhash: {e}"))),
    }
}

fn parse_integer_required<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<T, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, true>(value, field)?
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))
}

pub(super) fn parse_integer_optional<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, false>(value, "value")
        .ok()
        .flatten()
}

// `REQUIRED=false` treats missing/null/type-mismatch as `Ok(None)`.
fn parse_integer<T, const SIGNED: bool, const REQUIRED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<T>, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let missing_or_none = || {
        if REQUIRED {
            Err(CoreError::InvalidTxData(format!("missing {field}")))
        } else {
            Ok(None)
        }
    };

    let Some(value) = value else {
        return missing_or_none();
    };

    if SIGNED {
        let Some(n) = value.as_i64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidTxData(format!("{field} out of range: {n}")))
    } else {
        let Some(n) = value.as_u64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidTxData(format!("{field} out of range: {n}")))
    }
}

fn parse_vin(vin: &[serde_json::Value]) -> Result<Vec<RawInput>, CoreError> {
    vin.iter()
        .map(|input| {
            let sequence = parse_integer_required::<u32, false>(input.get("sequence"), "sequence")?;
            // Coinbase inputs may carry a witness too (the segwit commitment
            // reserved value), so it is parsed for both kinds.
            let witness = parse_witness(input.get("txinwitness"))?;

            if let Some(coinbase) = input.get("coinbase") {
                let coinbase = coinbase
                    .as_str()
                    .ok_or_else(|| CoreError::InvalidTxData("vin.coinbase is not a string".into()))?
                    .to_owned();
                return Ok(RawInput::Coinbase {
                    coinbase,
                    sequence,
                    witness,
                });
            }

            let prev_txid = parse_txid(input.get("txid"), "vin.txid")?;
            let prev_vout = parse_integer_required::<u32, false>(input.get("vout"), "vin.vout")?;
            let script_sig = input
                .get("scriptSig")
                .and_then(|s| s.get("hex"))
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| CoreError::InvalidTxData("missing hex in vin.scriptSig".into()))?
                .to_owned();

            Ok(RawInput::Spend {
                prevout: OutPoint::new(prev_txid, prev_vout),
                script_sig,
                sequence,
                witness,
            })
        })
        .collect()
}

fn parse_witness(value: Option<&serde_json::Value>) -> Result<Option<Vec<String>>, CoreError> {
    let Some(items) = value else {
        return Ok(None);
    };
    let items = items
        .as_array()
        .ok_or_else(|| CoreError::InvalidTxData("txinwitness is not an array".into()))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| CoreError::InvalidTxData("txinwitness item is not a string".into()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_vout(vout: &[serde_json::Value]) -> Result<Vec<RawOutput>, CoreError> {
    vout.iter()
        .map(|output| {
            let value = output
                .get("value")
                .cloned()
                .ok_or_else(|| CoreError::InvalidTxData("missing value in vout".into()))?;
            let n = parse_integer_required::<u32, false>(output.get("n"), "vout.n")?;
            let spk = output
                .get("scriptPubKey")
                .ok_or_else(|| CoreError::InvalidTxData("missing scriptPubKey in vout".into()))?;
            let script_hex = spk
                .get("hex")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| CoreError::InvalidTxData("missing hex in scriptPubKey".into()))?
                .to_owned();

            Ok(RawOutput {
                n,
                value,
                script_hex,
                addresses: parse_addresses(spk),
            })
        })
        .collect()
}

/// Bitcoin Core 22+ reports a single `address`; older releases report an
/// `addresses` array (several entries for bare multisig).
fn parse_addresses(spk: &serde_json::Value) -> Vec<String> {
    if let Some(address) = spk.get("address").and_then(serde_json::Value::as_str) {
        return vec![address.to_owned()];
    }
    spk.get("addresses")
        .and_then(serde_json::Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
