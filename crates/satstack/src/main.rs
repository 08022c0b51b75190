mod cli;
mod server;
mod shutdown;

use std::sync::Arc;

use clap::Parser;
use eyre::{eyre, WrapErr};
use tokio_util::sync::CancellationToken;

use satstack_core::rpc::{HttpRpcClient, NodeRpc};
use satstack_core::TransactionService;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let client = HttpRpcClient::new(
        &args.rpc_url,
        args.rpc_user.as_deref(),
        args.rpc_pass.as_deref(),
        args.rpc_cookie_file.as_deref(),
        args.rpc_requests_per_second,
        args.rpc_batch_chunk_size,
    )
    .context("configure Bitcoin Core RPC client")?;
    let rpc: Arc<dyn NodeRpc> = Arc::new(client);

    // Fail fast on a bad endpoint or credentials instead of on the first request.
    let chain_info = rpc.get_blockchain_info().await.map_err(|err| {
        let message = format_rpc_connect_error(&args.rpc_url, &err.to_string());
        eyre!(message).wrap_err("while attempting to connect to Bitcoin Core RPC")
    })?;

    tracing::info!(
        chain = %chain_info.chain,
        blocks = chain_info.blocks,
        best_block = %chain_info.best_block_hash,
        "connected to Bitcoin Core"
    );
    if chain_info.is_syncing() {
        tracing::warn!(
            headers = chain_info.headers,
            "node is still syncing; recent transactions may be missing"
        );
    }
    if chain_info.pruned {
        tracing::warn!("node is pruned; spent outputs in pruned blocks cannot be resolved");
    }

    let shutdown = CancellationToken::new();
    let state = server::AppState {
        service: TransactionService::new(rpc),
        shutdown: shutdown.clone(),
    };

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let origin = args
        .cors_origin
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", args.bind, args.port));
    let router = server::build_router(state, &origin).context("build HTTP router")?;

    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0 and is accessible from the network");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::shutdown_signal(shutdown))
        .await
        .context("run HTTP server")?;

    Ok(())
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("Could not resolve host") || source_error.contains("dns error") {
        lines.push("hint: hostname resolution failed; verify the node hostname".into());
    } else if source_error.contains("401") || source_error.contains("403") {
        lines.push(
            "hint: authentication failed; verify --rpc-user/--rpc-pass or --rpc-cookie-file".into(),
        );
    } else if source_error.contains("Connection refused") || source_error.contains("connect") {
        lines.push("hint: node is not listening; verify bitcoind is running with -server".into());
    }

    lines.join("\n")
}
