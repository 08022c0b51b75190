use bitcoin::Txid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("RPC communication failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("transaction not found: {0}")]
    TxNotFound(Txid),

    #[error("invalid transaction data: {0}")]
    InvalidTxData(String),

    #[error("malformed amount: {0}")]
    MalformedAmount(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Failures talking to the node, before any transaction data is interpreted.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error {code}: {message}")]
    ServerError { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing JSON-RPC batch item id={id}")]
    MissingBatchItem { id: u64 },

    /// A transaction the node returned spends an output of a transaction
    /// the node cannot return (no `-txindex`, or pruned).
    #[error("node cannot return funding transaction {txid}")]
    FundingTxUnavailable { txid: Txid },
}
