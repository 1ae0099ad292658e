//! REST API Endpoints
//!
//! Health, sale status, whitelist proof and mint endpoints for the mint page.

use crate::contract::SaleSnapshot;
use crate::minter::{MintError, Minter};
use crate::state::{AppState, MintRecord, StatusCounts};
use alloy::primitives::{Address, B256};
use axum::{
    extract::{FromRef, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use whitelist_proof::{leaf_hash, parse_address, SalePhase, WhitelistError};

/// Router state: shared app state plus the optional minter
#[derive(Clone)]
pub struct ApiState {
    pub app: AppState,
    pub minter: Option<Arc<Minter>>,
    /// Bearer token required by `POST /mint`
    pub mint_token: Option<Arc<str>>,
}

impl FromRef<ApiState> for AppState {
    fn from_ref(state: &ApiState) -> Self {
        state.app.clone()
    }
}

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Whitelist(#[from] WhitelistError),

    #[error("Minting is disabled: no signing key configured")]
    MinterDisabled,

    #[error("Missing or invalid mint API token")]
    Unauthorized,

    #[error(transparent)]
    Mint(#[from] MintError),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Whitelist(WhitelistError::MalformedAddress { .. }) => StatusCode::BAD_REQUEST,
            Self::Whitelist(WhitelistError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Whitelist(WhitelistError::EmptyInput) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MinterDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Mint(MintError::Rejected(_)) => StatusCode::CONFLICT,
            Self::Mint(MintError::Chain(_)) => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Run the API server
pub async fn run_server(listen: String, state: ApiState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    tracing::info!(address = %listen, "API server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
///
/// Read-only routes are open to any origin. `POST /mint` spends from the
/// service wallet, so it gets no CORS headers and needs the bearer token.
pub fn create_router(state: ApiState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/whitelist/root", get(whitelist_root))
        .route("/whitelist/proof/{address}", get(proof_for_address))
        .route("/mints", get(list_mints))
        .route("/mints/{tx_hash}", get(get_mint))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/mint", post(mint))
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    sync_age_secs: Option<u64>,
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.is_healthy();
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        sync_age_secs: state.sync_age_secs(),
    };

    (status_code, Json(response))
}

/// Status response
#[derive(Serialize)]
struct StatusResponse {
    phase: Option<SalePhase>,
    sale: Option<SaleSnapshot>,
    max_supply: u64,
    whitelist_root: B256,
    whitelist_size: usize,
    sync_age_secs: Option<u64>,
    uptime_secs: u64,
    mints: StatusCounts,
    last_error: Option<String>,
}

/// Status endpoint
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let sale = state.snapshot();
    Json(StatusResponse {
        phase: sale.as_ref().and_then(SaleSnapshot::phase),
        max_supply: whitelist_proof::sale::MAX_SUPPLY,
        sale,
        whitelist_root: state.tree().root(),
        whitelist_size: state.tree().len(),
        sync_age_secs: state.sync_age_secs(),
        uptime_secs: state.uptime_secs(),
        mints: state.status_counts(),
        last_error: state.last_error(),
    })
}

/// Root response
#[derive(Serialize)]
struct RootResponse {
    root: B256,
    leaves: usize,
    depth: usize,
}

/// Whitelist root endpoint
async fn whitelist_root(State(state): State<AppState>) -> Json<RootResponse> {
    let tree = state.tree();
    Json(RootResponse {
        root: tree.root(),
        leaves: tree.len(),
        depth: tree.depth(),
    })
}

/// Proof response
#[derive(Debug, Serialize)]
struct ProofResponse {
    address: Address,
    eligible: bool,
    leaf: B256,
    root: B256,
    proof: Vec<B256>,
}

/// Whitelist proof for one address
///
/// Non-members get a 404 with `eligible: false`, which the page shows as
/// "not whitelisted".
async fn proof_for_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<(StatusCode, Json<ProofResponse>), ApiError> {
    let address = parse_address(&address).inspect_err(|_| {
        metrics::counter!("whitelist_proof_requests_total", "outcome" => "malformed").increment(1);
    })?;

    let tree = state.tree();
    let (status_code, eligible, proof) = match tree.proof(&address) {
        Ok(proof) => (StatusCode::OK, true, proof),
        Err(WhitelistError::NotFound(_)) => (StatusCode::NOT_FOUND, false, Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let outcome = if eligible { "found" } else { "not_found" };
    metrics::counter!("whitelist_proof_requests_total", "outcome" => outcome).increment(1);
    tracing::debug!(%address, eligible, "Whitelist proof lookup");

    let response = ProofResponse {
        address,
        eligible,
        leaf: leaf_hash(&address),
        root: tree.root(),
        proof,
    };
    Ok((status_code, Json(response)))
}

/// List mints sent by this service
async fn list_mints(State(state): State<AppState>) -> Json<Vec<MintRecord>> {
    Json(state.all_mints())
}

/// Get a single mint by transaction hash
async fn get_mint(
    State(state): State<AppState>,
    Path(tx_hash): Path<B256>,
) -> Result<Json<MintRecord>, StatusCode> {
    state.get_mint(&tx_hash).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Mint request body
#[derive(Debug, Deserialize)]
struct MintRequest {
    amount: u64,
}

/// Whether `headers` carry `Authorization: Bearer <expected>`
fn bearer_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

/// Mint from the service wallet
async fn mint(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<MintRequest>,
) -> Result<Json<MintRecord>, ApiError> {
    let minter = state.minter.as_ref().ok_or(ApiError::MinterDisabled)?;
    let authorized = state
        .mint_token
        .as_deref()
        .is_some_and(|token| bearer_matches(&headers, token));
    if !authorized {
        tracing::warn!("Rejected unauthenticated mint request");
        return Err(ApiError::Unauthorized);
    }

    let record = minter.mint(request.amount).await?;
    Ok(Json(record))
}
