//! REST handlers
//!
//! Each handler maps one ledger operation onto a JSON request/response.
//! Mutations mine a block, so they run on the blocking pool.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::ledger::{BlockRecord, LedgerError, LedgerService, LedgerStats, TransactionRecord};
use crate::pets::Pet;

/// Shared handler state
pub type SharedLedger = Arc<LedgerService>;

/// Error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed request, already mapped to its HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::InvalidInput(_) | LedgerError::NotOwner { .. } => StatusCode::BAD_REQUEST,
            LedgerError::AssetNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), message = %self.message, "request failed");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Run a ledger call on the blocking pool
async fn blocking<T, F>(ledger: &SharedLedger, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&LedgerService) -> Result<T, LedgerError> + Send + 'static,
{
    let ledger = Arc::clone(ledger);
    tokio::task::spawn_blocking(move || call(&ledger))
        .await
        .map_err(|err| ApiError::internal(format!("ledger task failed: {}", err)))?
        .map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetRequest {
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub pet_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePetRequest {
    #[serde(default)]
    pub pet_id: Option<String>,
    #[serde(default)]
    pub from_owner: Option<String>,
    #[serde(default)]
    pub to_owner: Option<String>,
}

/// Trade outcome: `{"status": "success"|"error", "message": "..."}`
#[derive(Debug, Serialize)]
pub struct TradeResponse {
    pub status: &'static str,
    pub message: String,
}

impl TradeResponse {
    fn failed(err: ApiError) -> (StatusCode, Json<TradeResponse>) {
        if err.status.is_server_error() {
            error!(status = err.status.as_u16(), message = %err.message, "trade failed");
        }
        (
            err.status,
            Json(TradeResponse {
                status: "error",
                message: err.message,
            }),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

/// POST /api/wallet/create
pub async fn create_wallet(State(ledger): State<SharedLedger>) -> Result<Json<WalletResponse>, ApiError> {
    let address = blocking(&ledger, |ledger| ledger.create_wallet()).await?;
    Ok(Json(WalletResponse { address }))
}

/// POST /api/pet/create
pub async fn create_pet(
    State(ledger): State<SharedLedger>,
    payload: Result<Json<CreatePetRequest>, JsonRejection>,
) -> Result<Json<Pet>, ApiError> {
    let Json(request) = payload?;
    // Missing and null fields both reach validation as empty strings
    let owner = request.owner_address.unwrap_or_default();
    let name = request.pet_name.unwrap_or_default();
    let pet = blocking(&ledger, move |ledger| ledger.create_asset(&owner, &name))
    .await?;
    Ok(Json(pet))
}

/// POST /api/pet/trade
pub async fn trade_pet(
    State(ledger): State<SharedLedger>,
    payload: Result<Json<TradePetRequest>, JsonRejection>,
) -> (StatusCode, Json<TradeResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return TradeResponse::failed(ApiError::from(rejection)),
    };
    let pet_id = request.pet_id.unwrap_or_default();
    let from = request.from_owner.unwrap_or_default();
    let to = request.to_owner.unwrap_or_default();
    let outcome = blocking(&ledger, move |ledger| ledger.trade_asset(&pet_id, &from, &to)).await;

    match outcome {
        Ok(pet) => (
            StatusCode::OK,
            Json(TradeResponse {
                status: "success",
                message: format!("pet {} is now owned by {}", pet.id, pet.owner),
            }),
        ),
        Err(err) => TradeResponse::failed(err),
    }
}

/// GET /api/pets/owner/:address
pub async fn pets_by_owner(
    State(ledger): State<SharedLedger>,
    Path(address): Path<String>,
) -> Json<Vec<Pet>> {
    Json(ledger.assets_by_owner(&address))
}

/// GET /api/pets/all
pub async fn all_pets(State(ledger): State<SharedLedger>) -> Json<Vec<Pet>> {
    Json(ledger.all_assets())
}

/// GET /api/pet/:id
pub async fn get_pet(
    State(ledger): State<SharedLedger>,
    Path(id): Path<String>,
) -> Result<Json<Pet>, ApiError> {
    Ok(Json(ledger.asset(&id)?))
}

/// GET /api/pet/:id/history
pub async fn pet_history(
    State(ledger): State<SharedLedger>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    Ok(Json(ledger.asset_history(&id)?))
}

/// GET /api/owner/:address/transactions
pub async fn owner_transactions(
    State(ledger): State<SharedLedger>,
    Path(address): Path<String>,
) -> Json<Vec<TransactionRecord>> {
    Json(ledger.owner_history(&address))
}

/// GET /api/stats
pub async fn stats(State(ledger): State<SharedLedger>) -> Result<Json<LedgerStats>, ApiError> {
    // Stats include a full chain validation
    let stats = blocking(&ledger, |ledger| Ok(ledger.stats())).await?;
    Ok(Json(stats))
}

/// GET /api/blockchain
pub async fn blockchain(State(ledger): State<SharedLedger>) -> Result<Json<Vec<BlockRecord>>, ApiError> {
    let records: Vec<BlockRecord> = blocking(&ledger, |ledger| {
        Ok(ledger.blocks().iter().map(BlockRecord::from).collect())
    })
    .await?;
    Ok(Json(records))
}

/// GET /api/blockchain/block/:index
pub async fn block_at(
    State(ledger): State<SharedLedger>,
    Path(index): Path<u64>,
) -> Result<Json<BlockRecord>, ApiError> {
    ledger
        .block(index)
        .map(|block| Json(BlockRecord::from(&block)))
        .ok_or_else(|| ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("block {} does not exist", index),
        })
}

/// GET /api/blockchain/validate
pub async fn validate_chain(State(ledger): State<SharedLedger>) -> Result<Json<ValidateResponse>, ApiError> {
    let valid = blocking(&ledger, |ledger| Ok(ledger.validate_chain())).await?;
    Ok(Json(ValidateResponse { valid }))
}
