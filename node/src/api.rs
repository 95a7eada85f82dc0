//! HTTP API for BALLOTBOX node

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ballotbox_core::{BallotError, ProposalId, Timestamp, VoterId};
use ballotbox_ledger::{ProposalState, ProposalStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::runtime::NodeRuntime;

/// API state containing node runtime
pub type ApiState = Arc<NodeRuntime>;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Proposal creation request
#[derive(Deserialize)]
pub struct CreateProposalRequest {
    /// Hex voter id of the creator
    pub caller: String,
    /// Deadline in milliseconds since Unix epoch
    pub deadline: u64,
}

/// Proposal creation response
#[derive(Serialize)]
pub struct CreateProposalResponse {
    pub id: u64,
}

/// Vote request
#[derive(Deserialize)]
pub struct VoteRequest {
    /// Hex voter id
    pub voter: String,
    /// true = yes, false = no
    pub choice: bool,
}

/// Tally after an accepted vote
#[derive(Serialize)]
pub struct TallyResponse {
    pub proposal_id: u64,
    pub yes_count: u64,
    pub no_count: u64,
}

/// Proposal response
#[derive(Serialize)]
pub struct ProposalResponse {
    pub id: u64,
    pub creator: String,
    pub deadline: u64,
    pub created_at: u64,
    pub max_votes: u32,
    pub yes_count: u64,
    pub no_count: u64,
    pub status: String,
}

impl ProposalResponse {
    fn new(state: ProposalState, status: ProposalStatus) -> Self {
        Self {
            id: state.id.0,
            creator: state.creator.to_hex(),
            deadline: state.deadline.as_millis(),
            created_at: state.created_at.as_millis(),
            max_votes: state.max_votes,
            yes_count: state.yes_count,
            no_count: state.no_count,
            status: status.to_string(),
        }
    }
}

/// Node status response
#[derive(Serialize)]
pub struct NodeStatusResponse {
    pub name: String,
    pub proposal_count: usize,
    pub next_proposal_id: u64,
    pub owner: Option<String>,
    pub max_votes: u32,
    pub now: u64,
    pub started_at: u64,
}

/// Create API router
pub fn create_router(state: ApiState) -> Router {
    let enable_cors = state.config().api.enable_cors;

    let router = Router::new()
        // Health
        .route("/health", get(health))
        .route("/status", get(status))
        // Proposals
        .route("/proposals", get(list_proposals).post(create_proposal))
        .route("/proposals/:id", get(get_proposal))
        .route("/proposals/:id/votes", post(cast_vote))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// HTTP status for a ledger error
pub fn status_code(err: &BallotError) -> StatusCode {
    match err {
        BallotError::InvalidDeadline { .. } | BallotError::InvalidVoterId(_) => {
            StatusCode::BAD_REQUEST
        }
        BallotError::Unauthorized(_) => StatusCode::FORBIDDEN,
        BallotError::ProposalNotFound(_) => StatusCode::NOT_FOUND,
        BallotError::VotingClosed { .. }
        | BallotError::CapacityExceeded { .. }
        | BallotError::DuplicateVote(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Node status
async fn status(State(runtime): State<ApiState>) -> impl IntoResponse {
    let registry = runtime.registry();
    let status = NodeStatusResponse {
        name: runtime.config().name.clone(),
        proposal_count: registry.len(),
        next_proposal_id: registry.next_proposal_id().0,
        owner: registry.owner().map(|o| o.to_hex()),
        max_votes: registry.config().max_votes,
        now: runtime.now().as_millis(),
        started_at: runtime.started_at().as_millis(),
    };

    Json(ApiResponse::ok(status))
}

/// List proposals
async fn list_proposals(State(runtime): State<ApiState>) -> impl IntoResponse {
    let proposals: Vec<ProposalResponse> = runtime
        .proposals()
        .into_iter()
        .map(|(state, status)| ProposalResponse::new(state, status))
        .collect();

    Json(ApiResponse::ok(proposals))
}

/// Create proposal
async fn create_proposal(
    State(runtime): State<ApiState>,
    Json(req): Json<CreateProposalRequest>,
) -> impl IntoResponse {
    let caller = match parse_voter(&req.caller) {
        Ok(caller) => caller,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<CreateProposalResponse>::err(e)),
            )
        }
    };

    match runtime.create_proposal(caller, Timestamp::from_millis(req.deadline)) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(CreateProposalResponse { id: id.0 })),
        ),
        Err(e) => error_response(e),
    }
}

/// Get proposal
async fn get_proposal(
    State(runtime): State<ApiState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    match runtime.proposal(ProposalId::new(id)) {
        Ok((state, status)) => (
            StatusCode::OK,
            Json(ApiResponse::ok(ProposalResponse::new(state, status))),
        ),
        Err(e) => error_response(e),
    }
}

/// Cast vote
async fn cast_vote(
    State(runtime): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<VoteRequest>,
) -> impl IntoResponse {
    let voter = match parse_voter(&req.voter) {
        Ok(voter) => voter,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<TallyResponse>::err(e)),
            )
        }
    };

    match runtime.cast_vote(ProposalId::new(id), voter, req.choice) {
        Ok(tally) => (
            StatusCode::OK,
            Json(ApiResponse::ok(TallyResponse {
                proposal_id: id,
                yes_count: tally.yes_count,
                no_count: tally.no_count,
            })),
        ),
        Err(e) => error_response(e),
    }
}

fn parse_voter(hex: &str) -> Result<VoterId, BallotError> {
    VoterId::from_hex(hex).map_err(|e| BallotError::InvalidVoterId(e.to_string()))
}

fn error_response<T: Serialize>(err: BallotError) -> (StatusCode, Json<ApiResponse<T>>) {
    let code = status_code(&err);
    if code == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    }
    (code, Json(ApiResponse::err(err)))
}

/// Start API server
pub async fn start_api_server(runtime: Arc<NodeRuntime>, listen_addr: &str) -> anyhow::Result<()> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listen_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
