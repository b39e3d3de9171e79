//! Development gateway: serves the messaging REST contract from memory.

mod routes;
mod store;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use store::{StubSeed, StubStore};

use routes::{chat_handler, list_conversations_handler, send_handler};

pub fn router(store: StubStore) -> Router {
    Router::new()
        .route("/messages/conversations", get(list_conversations_handler))
        .route("/messages/chat/{listing_id}/{receiver_id}", get(chat_handler))
        .route("/messages/send", post(send_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Serves until the listener fails.
pub async fn serve(listener: TcpListener, store: StubStore) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Development gateway listening on http://{addr}/");
    }
    axum::serve(listener, router(store)).await
}
