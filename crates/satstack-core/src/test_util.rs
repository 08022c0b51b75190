//! Shared test helpers for `satstack-core` unit tests.
//!
//! Builder functions for raw node types so that tests across modules share
//! a single source of truth for dummy data construction.

use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, OutPoint, Txid, Wtxid};

use crate::types::{RawInput, RawOutput, RawTransaction};

// ==============================================================================
// Hash Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

pub fn block_hash_from_byte(b: u8) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[31] = b;
    BlockHash::from_byte_array(bytes)
}

// ==============================================================================
// Raw Transaction Builders
// ==============================================================================

/// Build a confirmed `RawTransaction` with sane defaults. Output `n` values
/// are renumbered by position. Override individual fields after
/// construction when needed.
pub fn raw_tx(txid: Txid, inputs: Vec<RawInput>, mut outputs: Vec<RawOutput>) -> RawTransaction {
    for (n, output) in outputs.iter_mut().enumerate() {
        output.n = n as u32;
    }
    RawTransaction {
        txid,
        hash: Wtxid::from_byte_array(txid.to_byte_array()),
        locktime: 0,
        time: Some(1_700_000_000),
        block_hash: Some(block_hash_from_byte(0xbb)),
        block_time: Some(1_700_000_000),
        block_height: None,
        confirmations: 6,
        hex: "0200000001".to_owned(),
        inputs,
        outputs,
    }
}

/// A coinbase input without witness data.
pub fn coinbase_input() -> RawInput {
    RawInput::Coinbase {
        coinbase: "03a0bb0d".to_owned(),
        sequence: 0xFFFF_FFFF,
        witness: None,
    }
}

/// A spending input referencing `funding_txid:vout`, without witness data.
pub fn spend_input(funding_txid: Txid, vout: u32) -> RawInput {
    RawInput::Spend {
        prevout: OutPoint::new(funding_txid, vout),
        script_sig: "47304402".to_owned(),
        sequence: 0xFFFF_FFFE,
        witness: None,
    }
}

/// An output worth `btc` (as the node would display it) paying to
/// `addresses`.
pub fn output(btc: f64, addresses: &[&str]) -> RawOutput {
    RawOutput {
        n: 0,
        value: serde_json::json!(btc),
        script_hex: "0014000102030405060708090a0b0c0d0e0f10111213".to_owned(),
        addresses: addresses.iter().map(|a| (*a).to_owned()).collect(),
    }
}
