//! Domain types for satstack's transaction model.
//!
//! The raw types (`RawTransaction`, `RawInput`, `RawOutput`) mirror what the
//! node reports through verbose `getrawtransaction`. The canonical types
//! (`Transaction`, `Input`, `Output`, `Block`) are what the API serves,
//! field for field.

use std::collections::HashMap;

use bitcoin::{Amount, BlockHash, OutPoint, SignedAmount, Txid, Wtxid};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ==============================================================================
// Block Height
// ==============================================================================

/// A Bitcoin block height, wrapped for type safety.
///
/// `#[serde(transparent)]` preserves the JSON representation as a bare
/// integer, so this newtype is wire-compatible with plain `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

impl From<u32> for BlockHeight {
    fn from(h: u32) -> Self {
        Self(h)
    }
}

impl From<BlockHeight> for u32 {
    fn from(h: BlockHeight) -> Self {
        h.0
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u32;
    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ==============================================================================
// Raw (Node-Supplied) Transaction Types
// ==============================================================================

/// A transaction exactly as the node describes it.
#[derive(Debug, Clone)]
pub struct RawTransaction {
    pub txid: Txid,
    /// Witness hash. Equal to `txid` (byte for byte) for non-segwit
    /// transactions.
    pub hash: Wtxid,
    pub locktime: u32,
    /// Time the node first saw the transaction, as a Unix timestamp.
    pub time: Option<u64>,
    pub block_hash: Option<BlockHash>,
    pub block_time: Option<u64>,
    /// Height reported inline by newer nodes (`blockheight`). Older nodes
    /// omit it and the height must be looked up by block hash.
    pub block_height: Option<BlockHeight>,
    /// Zero for mempool transactions.
    pub confirmations: u64,
    pub hex: String,
    pub inputs: Vec<RawInput>,
    pub outputs: Vec<RawOutput>,
}

impl RawTransaction {
    pub fn is_coinbase(&self) -> bool {
        self.inputs.iter().any(RawInput::is_coinbase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Coinbase {
        /// Coinbase script, hex encoded.
        coinbase: String,
        sequence: u32,
        witness: Option<Vec<String>>,
    },
    Spend {
        prevout: OutPoint,
        /// Signature script, hex encoded.
        script_sig: String,
        sequence: u32,
        witness: Option<Vec<String>>,
    },
}

impl RawInput {
    pub fn is_coinbase(&self) -> bool {
        matches!(self, Self::Coinbase { .. })
    }

    /// The outpoint this input spends. `None` for coinbase inputs.
    pub fn prevout(&self) -> Option<OutPoint> {
        match self {
            Self::Coinbase { .. } => None,
            Self::Spend { prevout, .. } => Some(*prevout),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    pub n: u32,
    /// Value in BTC exactly as the node rendered it. Converted to satoshis
    /// only during normalization, where a malformed value is fatal.
    pub value: serde_json::Value,
    pub script_hex: String,
    /// Addresses the node associated with the script. Empty for
    /// non-standard scripts; possibly several for bare multisig.
    pub addresses: Vec<String>,
}

impl RawOutput {
    /// The output's address if it has exactly one. Zero or several
    /// addresses are ambiguous and resolve to `None`.
    pub fn single_address(&self) -> Option<&str> {
        match self.addresses.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

// ==============================================================================
// UTXO Lookup
// ==============================================================================

/// Value and address of one previously created output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoEntry {
    pub value: Amount,
    pub address: Option<String>,
}

/// Previous outputs spent by a transaction, keyed by the outpoint each
/// input references. Built per request and never persisted.
pub type UtxoMap = HashMap<OutPoint, UtxoEntry>;

// ==============================================================================
// Canonical Transaction Types
// ==============================================================================

/// The explorer-facing transaction record.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Txid,
    pub hash: Wtxid,
    #[serde(with = "time::serde::rfc3339::option")]
    pub received_at: Option<OffsetDateTime>,
    pub lock_time: u32,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub block: Block,
    pub confirmations: u64,
    /// Input value minus output value. Always zero for coinbase
    /// transactions; negative only if the node's data is inconsistent.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub fees: SignedAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Input {
    Coinbase(CoinbaseInput),
    Spend(SpendInput),
}

impl Input {
    pub fn input_index(&self) -> u32 {
        match self {
            Self::Coinbase(input) => input.input_index,
            Self::Spend(input) => input.input_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinbaseInput {
    pub input_index: u32,
    pub coinbase: String,
    pub sequence: u32,
    pub witness: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpendInput {
    pub input_index: u32,
    /// Txid of the transaction that created the spent output.
    pub output_hash: Txid,
    pub output_index: u32,
    /// Value of the spent output. `None` if it could not be resolved.
    pub value: Option<Amount>,
    pub address: Option<String>,
    pub script_sig: String,
    pub sequence: u32,
    pub witness: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub output_index: u32,
    pub value: Amount,
    pub script_hex: String,
    pub address: Option<String>,
}

/// Block context. All fields are `None` for mempool transactions; `height`
/// is also `None` when the height lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub hash: Option<BlockHash>,
    pub height: Option<BlockHeight>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub time: Option<OffsetDateTime>,
}
