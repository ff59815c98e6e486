//! HTTP server
//!
//! Axum router exposing the ledger under `/api`.

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::ledger::LedgerService;
use crate::rpc::methods::{
    all_pets, block_at, blockchain, create_pet, create_wallet, get_pet, owner_transactions,
    pet_history, pets_by_owner, stats, trade_pet, validate_chain,
};

/// Build the API router for a ledger
pub fn build_router(ledger: Arc<LedgerService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/wallet/create", post(create_wallet))
        .route("/api/pet/create", post(create_pet))
        .route("/api/pet/trade", post(trade_pet))
        .route("/api/pet/:id", get(get_pet))
        .route("/api/pet/:id/history", get(pet_history))
        .route("/api/pets/all", get(all_pets))
        .route("/api/pets/owner/:address", get(pets_by_owner))
        .route("/api/owner/:address/transactions", get(owner_transactions))
        .route("/api/stats", get(stats))
        .route("/api/blockchain", get(blockchain))
        .route("/api/blockchain/validate", get(validate_chain))
        .route("/api/blockchain/block/:index", get(block_at))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ledger)
}

/// Serve the API on `addr` until `shutdown` resolves
pub async fn start_rpc_server<F>(
    ledger: Arc<LedgerService>,
    addr: &str,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(ledger);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
