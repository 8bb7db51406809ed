//! HTTP API server for the Certum node.
//!
//! Provides REST endpoints for node status, signed issuance and revocation,
//! registry queries, and holder verification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

use certum_core::{CredentialId, CredentialRecord, Identity};
use certum_crypto::{CryptoError, RequestAuth, SignedAction};
use certum_registry::RegistryError;
use certum_verifier::{VerifiedCredential, VerifyError};

use crate::commands::{IssueResponse, NodeCommand, RevokeResponse};
use crate::state::NodeState;

// --- Request and response types ---

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub authority: Identity,
    pub total_issued: u64,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
pub struct AuthorityResponse {
    pub authority: Identity,
}

#[derive(Serialize, Deserialize)]
pub struct IssueRequest {
    pub holder: String,
    pub reference: String,
    pub auth: RequestAuth,
}

#[derive(Serialize, Deserialize)]
pub struct RevokeRequest {
    pub auth: RequestAuth,
}

#[derive(Serialize, Deserialize)]
pub struct HolderCredentialsResponse {
    pub holder: Identity,
    pub ids: Vec<CredentialId>,
}

#[derive(Serialize)]
pub struct HolderVerificationResponse {
    pub holder: Identity,
    pub credentials: Vec<VerifiedCredential>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, kind: &str, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            kind: kind.into(),
        }),
    )
}

fn registry_error(err: RegistryError) -> ApiError {
    let (status, kind) = match &err {
        RegistryError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "unauthorized"),
        RegistryError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
        RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        RegistryError::AlreadyRevoked(_) => (StatusCode::CONFLICT, "already_revoked"),
        RegistryError::AuthorityMismatch { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
        RegistryError::Storage(_)
        | RegistryError::Io(_)
        | RegistryError::Corrupt(_)
        | RegistryError::UnsupportedFormat { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "storage")
        }
    };
    if err.is_infrastructure() {
        tracing::error!(error = %err, "registry storage failure");
    }
    api_error(status, kind, err)
}

fn verify_error(err: VerifyError) -> ApiError {
    match err {
        VerifyError::Registry(e) => registry_error(e),
        VerifyError::Cancelled => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, "internal", "verification cancelled")
        }
    }
}

fn auth_error(err: CryptoError) -> ApiError {
    tracing::warn!(error = %err, "rejected request authentication");
    api_error(StatusCode::UNAUTHORIZED, "authentication", err)
}

fn parse_identity(value: &str) -> Result<Identity, ApiError> {
    Identity::parse(value)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "invalid_argument", e))
}

/// Verify the request signature and freshness, yielding the caller.
///
/// Each envelope is accepted at most once.
fn authenticate(
    state: &NodeState,
    auth: &RequestAuth,
    action: &SignedAction<'_>,
) -> Result<Identity, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let caller = auth
        .verify(action, now, state.max_clock_skew_secs)
        .map_err(auth_error)?;
    state
        .replay_guard
        .check_and_record(auth, now)
        .map_err(auth_error)?;
    Ok(caller)
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<NodeState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        authority: state.registry.current_authority(),
        total_issued: state.registry.total_issued(),
        uptime_secs: state.uptime_secs(),
    })
}

async fn handle_authority(State(state): State<Arc<NodeState>>) -> Json<AuthorityResponse> {
    Json(AuthorityResponse {
        authority: state.registry.current_authority(),
    })
}

async fn handle_issue(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<IssueRequest>,
) -> Result<Json<IssueResponse>, ApiError> {
    let holder = parse_identity(&req.holder)?;
    let caller = authenticate(
        &state,
        &req.auth,
        &SignedAction::Issue {
            holder: &holder,
            reference: &req.reference,
        },
    )?;

    let (reply_tx, reply_rx) = oneshot::channel();
    let cmd = NodeCommand::Issue {
        caller,
        holder,
        reference: req.reference,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_revoke(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<CredentialId>,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>, ApiError> {
    let caller = authenticate(&state, &req.auth, &SignedAction::Revoke { id })?;

    let (reply_tx, reply_rx) = oneshot::channel();
    let cmd = NodeCommand::Revoke {
        caller,
        id,
        reply: reply_tx,
    };

    send_command_and_await(&state, cmd, reply_rx).await
}

async fn handle_get_credential(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<CredentialId>,
) -> Result<Json<CredentialRecord>, ApiError> {
    state.registry.get_record(id).map(Json).map_err(registry_error)
}

async fn handle_verify_credential(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<CredentialId>,
) -> Result<Json<VerifiedCredential>, ApiError> {
    state
        .verifier
        .verify_credential(id)
        .await
        .map(Json)
        .map_err(verify_error)
}

async fn handle_holder_credentials(
    State(state): State<Arc<NodeState>>,
    Path(holder): Path<String>,
) -> Result<Json<HolderCredentialsResponse>, ApiError> {
    let holder = parse_identity(&holder)?;
    Ok(Json(HolderCredentialsResponse {
        holder,
        ids: state.registry.get_by_holder(&holder),
    }))
}

async fn handle_verify_holder(
    State(state): State<Arc<NodeState>>,
    Path(holder): Path<String>,
) -> Result<Json<HolderVerificationResponse>, ApiError> {
    let holder = parse_identity(&holder)?;
    let credentials = state
        .verifier
        .verify_holder(&holder)
        .await
        .map_err(verify_error)?;
    Ok(Json(HolderVerificationResponse {
        holder,
        credentials,
    }))
}

/// Helper to send a command and await the reply.
async fn send_command_and_await<T: Serialize>(
    state: &NodeState,
    cmd: NodeCommand,
    reply_rx: oneshot::Receiver<Result<T, RegistryError>>,
) -> Result<Json<T>, ApiError> {
    state.command_tx.send(cmd).await.map_err(|_| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "node event loop not running",
        )
    })?;

    match reply_rx.await {
        Ok(Ok(resp)) => Ok(Json(resp)),
        Ok(Err(e)) => Err(registry_error(e)),
        Err(_) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "event loop dropped the reply channel",
        )),
    }
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/authority", get(handle_authority))
        .route("/api/v1/credentials/issue", post(handle_issue))
        .route("/api/v1/credentials/{id}", get(handle_get_credential))
        .route("/api/v1/credentials/{id}/revoke", post(handle_revoke))
        .route("/api/v1/credentials/{id}/verify", get(handle_verify_credential))
        .route(
            "/api/v1/holders/{holder}/credentials",
            get(handle_holder_credentials),
        )
        .route("/api/v1/holders/{holder}/verify", get(handle_verify_holder))
        .with_state(state)
}

pub async fn serve(listener: tokio::net::TcpListener, state: Arc<NodeState>) -> anyhow::Result<()> {
    let app = build_router(state);
    tracing::info!(listen_addr = %listener.local_addr()?, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
