//! Axum-State: In-Memory-Verzeichnis und Token-Pruefung

use std::sync::Arc;

use axum::http::HeaderMap;
use dashmap::DashMap;
use uuid::Uuid;

use fluester_core::{EncryptedKeyRecord, ServerId, UserId};

use crate::error::{DirectoryError, DirectoryResult};

/// Funktor-Typ: bildet ein Bearer-Token synchron auf den Benutzer ab
pub type TokenValidatorFn = Arc<dyn Fn(&str) -> DirectoryResult<UserId> + Send + Sync>;

/// Entwicklungs-Validator: das Token ist die UUID des Benutzers
pub fn uuid_token_validator() -> TokenValidatorFn {
    Arc::new(|token: &str| {
        Uuid::parse_str(token)
            .map(UserId)
            .map_err(|_| DirectoryError::Authentifizierung("Token ist keine Benutzer-ID".into()))
    })
}

/// Gespeicherte Schluessel. Der Dienst sieht nur undurchsichtige Strings.
#[derive(Debug, Default)]
pub struct Verzeichnis {
    public_keys: DashMap<UserId, String>,
    /// Genau ein Umschlag pro (Server, Empfaenger), letzter Schreiber gewinnt
    server_keys: DashMap<(ServerId, UserId), EncryptedKeyRecord>,
}

impl Verzeichnis {
    pub fn public_key_setzen(&self, user_id: UserId, public_key: String) {
        self.public_keys.insert(user_id, public_key);
    }

    pub fn public_key(&self, user_id: UserId) -> Option<String> {
        self.public_keys.get(&user_id).map(|e| e.value().clone())
    }

    pub fn server_key_setzen(&self, server_id: ServerId, empfaenger: UserId, record: EncryptedKeyRecord) {
        self.server_keys.insert((server_id, empfaenger), record);
    }

    pub fn server_key(&self, server_id: ServerId, empfaenger: UserId) -> Option<EncryptedKeyRecord> {
        self.server_keys
            .get(&(server_id, empfaenger))
            .map(|e| e.value().clone())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub verzeichnis: Arc<Verzeichnis>,
    pub token_validator: TokenValidatorFn,
}

impl AppState {
    pub fn neu(token_validator: TokenValidatorFn) -> Self {
        Self {
            verzeichnis: Arc::new(Verzeichnis::default()),
            token_validator,
        }
    }

    /// Ermittelt den aufrufenden Benutzer ("me") aus dem Authorization-Header
    pub fn benutzer_aus_headers(&self, headers: &HeaderMap) -> DirectoryResult<UserId> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .ok_or_else(|| DirectoryError::Authentifizierung("Authorization-Header fehlt".into()))?;

        (self.token_validator)(token.trim())
    }
}
