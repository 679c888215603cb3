//! REST-Handler fuer die Verzeichnis-Endpunkte

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use fluester_core::{EncryptedKeyRecord, PublicKeyBody, PublicKeyResponse, ServerId, UserId};

use crate::error::{DirectoryError, DirectoryResult};
use crate::state::AppState;

/// PUT /identity/public-key
pub async fn put_public_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PublicKeyBody>,
) -> DirectoryResult<StatusCode> {
    let me = state.benutzer_aus_headers(&headers)?;
    nicht_leer(&body.public_key, "publicKey")?;

    state.verzeichnis.public_key_setzen(me, body.public_key);
    tracing::info!(user_id = %me, "Public Key veroeffentlicht");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /identity/:user_id/public-key
pub async fn get_public_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> DirectoryResult<Json<PublicKeyResponse>> {
    state.benutzer_aus_headers(&headers)?;
    Ok(Json(PublicKeyResponse {
        public_key: state.verzeichnis.public_key(UserId(user_id)),
    }))
}

/// PUT /servers/:server_id/keys – eigener, selbst-eingewickelter Umschlag
pub async fn put_own_server_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(server_id): Path<Uuid>,
    Json(record): Json<EncryptedKeyRecord>,
) -> DirectoryResult<StatusCode> {
    let me = state.benutzer_aus_headers(&headers)?;
    umschlag_speichern(&state, ServerId(server_id), me, record)
}

/// GET /servers/:server_id/keys/me
pub async fn get_own_server_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(server_id): Path<Uuid>,
) -> DirectoryResult<Json<Option<EncryptedKeyRecord>>> {
    let me = state.benutzer_aus_headers(&headers)?;
    Ok(Json(state.verzeichnis.server_key(ServerId(server_id), me)))
}

/// PUT /servers/:server_id/keys/:recipient – Umschlag fuer ein anderes Mitglied
pub async fn put_server_key_for(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((server_id, recipient)): Path<(Uuid, Uuid)>,
    Json(record): Json<EncryptedKeyRecord>,
) -> DirectoryResult<StatusCode> {
    state.benutzer_aus_headers(&headers)?;
    umschlag_speichern(&state, ServerId(server_id), UserId(recipient), record)
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

fn umschlag_speichern(
    state: &AppState,
    server_id: ServerId,
    empfaenger: UserId,
    record: EncryptedKeyRecord,
) -> DirectoryResult<StatusCode> {
    nicht_leer(&record.encrypted_key, "encryptedKey")?;

    tracing::info!(
        server_id = %server_id,
        empfaenger = %empfaenger,
        sender = %record.sender_id,
        "Umschlag gespeichert"
    );
    state.verzeichnis.server_key_setzen(server_id, empfaenger, record);
    Ok(StatusCode::NO_CONTENT)
}

fn nicht_leer(wert: &str, feld: &str) -> DirectoryResult<()> {
    if wert.trim().is_empty() {
        return Err(DirectoryError::UngueltigeEingabe(format!("{feld} darf nicht leer sein")));
    }
    Ok(())
}
