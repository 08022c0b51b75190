use std::path::PathBuf;

use clap::Parser;

/// Explorer-style REST API over a Bitcoin Core node.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Bitcoin Core RPC URL.
    #[arg(long, default_value = "http://127.0.0.1:8332", env = "SATSTACK_RPC_URL")]
    pub rpc_url: String,

    /// RPC username. Must be given together with `--rpc-pass`.
    #[arg(long, env = "SATSTACK_RPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password. Must be given together with `--rpc-user`.
    #[arg(long, env = "SATSTACK_RPC_PASS")]
    pub rpc_pass: Option<String>,

    /// Path to bitcoind's `.cookie` file, used when no user/password is set.
    #[arg(long, env = "SATSTACK_RPC_COOKIE_FILE")]
    pub rpc_cookie_file: Option<PathBuf>,

    /// Upper bound on RPC requests per second. Unlimited when omitted.
    #[arg(long, env = "SATSTACK_RPC_REQUESTS_PER_SECOND")]
    pub rpc_requests_per_second: Option<u32>,

    /// Maximum number of calls sent in one JSON-RPC batch.
    #[arg(long, default_value = "100", env = "SATSTACK_RPC_BATCH_CHUNK_SIZE")]
    pub rpc_batch_chunk_size: usize,

    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1", env = "SATSTACK_BIND")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "3080", env = "SATSTACK_PORT")]
    pub port: u16,

    /// Browser origin allowed by CORS. Defaults to the server's own URL.
    #[arg(long, env = "SATSTACK_CORS_ORIGIN")]
    pub cors_origin: Option<String>,
}
