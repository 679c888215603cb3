//! Route-Definitionen des Verzeichnisdienstes

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Erstellt den vollstaendigen Router inklusive Request-Tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Identitaet
        .route("/identity/public-key", put(handlers::put_public_key))
        .route(
            "/identity/:user_id/public-key",
            get(handlers::get_public_key),
        )
        // Gruppen-Schluessel
        .route("/servers/:server_id/keys", put(handlers::put_own_server_key))
        .route(
            "/servers/:server_id/keys/me",
            get(handlers::get_own_server_key),
        )
        .route(
            "/servers/:server_id/keys/:recipient",
            put(handlers::put_server_key_for),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
