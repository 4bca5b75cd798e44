use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{delete, get},
};
use engine::Ledger;
use serde::Serialize;

use crate::transactions;

#[derive(Clone)]
pub struct ServerState {
    pub ledger: Arc<Ledger>,
}

#[derive(Serialize)]
struct Banner {
    message: &'static str,
}

async fn banner() -> Json<Banner> {
    Json(Banner {
        message: "Family ledger API is running",
    })
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/reset", delete(transactions::reset))
        .with_state(state)
}

pub async fn run_with_listener(
    ledger: Arc<Ledger>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState { ledger })).await
}
