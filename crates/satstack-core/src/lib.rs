pub mod error;
pub mod normalize;
pub mod rpc;
pub mod service;
pub mod types;
pub mod units;
pub mod utxo;

#[cfg(test)]
mod test_util;

pub use error::{CoreError, RpcError};
pub use service::TransactionService;
pub use types::Transaction;
