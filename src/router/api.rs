// HTTP API for the router node
// Exposes swaps, registry and event inspection, balances and metrics over a
// single in-process chain guarded by an async mutex
//
// Numan Thabit 2025 Nov

use crate::chain::{Chain, PermitSingle};
use crate::errors::RouterError;
use crate::metrics;
use crate::router::events::RouterEvent;
use crate::router::registry::ExecutorRecord;
use crate::router::router::{CallEnv, Permit2, Router, SwapGraph, SwapParams};
use crate::types::{de_amount, hex_bytes, Address, Amount};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Router plus the chain it runs on.
#[derive(Debug)]
pub struct Node {
    pub router: Router,
    pub chain: Chain,
}

pub type SharedNode = Arc<Mutex<Node>>;

pub fn create_api_router(node: SharedNode) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .route("/api/v1/swap", post(execute_swap))
        .route("/api/v1/executors", get(list_executors))
        .route("/api/v1/events", get(list_events))
        .route("/api/v1/balances/:token/:owner", get(get_balance))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(node)
}

#[derive(Debug, Deserialize)]
pub struct PermitRequest {
    pub permit: PermitSingle,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    pub caller: Address,
    #[serde(default, deserialize_with = "de_amount")]
    pub value: Amount,
    pub params: SwapParams,
    pub graph: SwapGraph,
    #[serde(default)]
    pub permit: Option<PermitRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwapResponse {
    pub amount_out: String,
    pub block_number: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ExecutorEntry {
    pub executor: Address,
    #[serde(flatten)]
    pub record: ExecutorRecord,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub token: Address,
    pub owner: Address,
    pub balance: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(err: RouterError) -> ApiError {
    let status = match err {
        RouterError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        RouterError::Paused => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            reason: err.label().to_string(),
        }),
    )
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn render_metrics() -> Result<String, (StatusCode, String)> {
    metrics::render().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn execute_swap(
    State(node): State<SharedNode>,
    Json(req): Json<SwapRequest>,
) -> Result<Json<SwapResponse>, ApiError> {
    let mut guard = node.lock().await;
    let Node { router, chain } = &mut *guard;
    let env = CallEnv::new(req.caller).with_value(req.value);

    let amount_out = match &req.permit {
        Some(p) => router.swap_permit2(
            chain,
            env,
            &req.params,
            Permit2 {
                permit: &p.permit,
                signature: &p.signature,
            },
            &req.graph,
        ),
        None => router.swap(chain, env, &req.params, &req.graph),
    }
    .map_err(reject)?;

    Ok(Json(SwapResponse {
        amount_out: amount_out.to_string(),
        block_number: chain.block_number(),
    }))
}

async fn list_executors(State(node): State<SharedNode>) -> Json<Vec<ExecutorEntry>> {
    let guard = node.lock().await;
    let block = guard.chain.block_number();
    let entries = guard
        .router
        .registry()
        .iter()
        .map(|(executor, record)| ExecutorEntry {
            executor: *executor,
            record: *record,
            active: guard.router.registry().is_active(*executor, block),
        })
        .collect();
    Json(entries)
}

async fn list_events(State(node): State<SharedNode>) -> Json<Vec<RouterEvent>> {
    let guard = node.lock().await;
    Json(guard.router.events().all().to_vec())
}

async fn get_balance(
    State(node): State<SharedNode>,
    Path((token, owner)): Path<(Address, Address)>,
) -> Json<BalanceResponse> {
    let guard = node.lock().await;
    Json(BalanceResponse {
        token,
        owner,
        balance: guard.chain.bank.balance_of(token, owner).to_string(),
    })
}
