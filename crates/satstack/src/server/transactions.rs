use axum::extract::{Path, State};
use axum::Json;
use bitcoin::Txid;
use serde::Serialize;

use satstack_core::Transaction;

use super::error::{map_core_error, AppError};
use super::SharedState;

#[derive(Serialize)]
pub(super) struct HexResponse {
    hex: String,
}

pub(super) async fn get_transaction(
    State(state): State<SharedState>,
    Path(txid_str): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let txid = parse_txid(&txid_str)?;
    let cancel = state.shutdown.child_token();

    let tx = state
        .service
        .get_transaction(&txid, &cancel)
        .await
        .map_err(|e| map_core_error(txid, e))?;
    Ok(Json(tx))
}

pub(super) async fn get_transaction_hex(
    State(state): State<SharedState>,
    Path(txid_str): Path<String>,
) -> Result<Json<HexResponse>, AppError> {
    let txid = parse_txid(&txid_str)?;
    let cancel = state.shutdown.child_token();

    let hex = state
        .service
        .get_transaction_hex(&txid, &cancel)
        .await
        .map_err(|e| map_core_error(txid, e))?;
    Ok(Json(HexResponse { hex }))
}

fn parse_txid(txid_str: &str) -> Result<Txid, AppError> {
    txid_str
        .parse()
        .map_err(|e| AppError::BadRequest(format!("invalid txid: {e}")))
}
