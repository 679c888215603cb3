//! Wire-DTOs des Schluessel-Verzeichnisdienstes (REST, JSON)
//!
//! | Methode | Pfad | Body / Antwort |
//! |---|---|---|
//! | PUT | `/identity/public-key` | [`PublicKeyBody`] |
//! | GET | `/identity/{userId}/public-key` | [`PublicKeyResponse`] |
//! | PUT | `/servers/{serverId}/keys` | [`EncryptedKeyRecord`] |
//! | GET | `/servers/{serverId}/keys/me` | [`EncryptedKeyRecord`] oder `null` |
//! | PUT | `/servers/{serverId}/keys/{recipientUserId}` | [`EncryptedKeyRecord`] |

use serde::{Deserialize, Serialize};

use crate::types::{ServerId, UserId};

/// Body zum Veroeffentlichen des eigenen oeffentlichen Schluessels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyBody {
    pub public_key: String,
}

/// Antwort beim Abruf eines oeffentlichen Schluessels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: Option<String>,
}

/// Eingewickelter Gruppen-Schluessel plus Absender, dessen oeffentlicher
/// Schluessel zum Auswickeln gebraucht wird
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedKeyRecord {
    /// `base64(iv(12) || wrap(raw_key))`
    pub encrypted_key: String,
    pub sender_id: UserId,
}

/// REST-Pfade (relativ zur Basis-URL)
pub mod pfade {
    use super::{ServerId, UserId};

    pub const EIGENER_PUBLIC_KEY: &str = "/identity/public-key";

    pub fn public_key_von(user_id: UserId) -> String {
        format!("/identity/{}/public-key", user_id.inner())
    }

    pub fn server_keys(server_id: ServerId) -> String {
        format!("/servers/{}/keys", server_id.inner())
    }

    pub fn eigener_server_key(server_id: ServerId) -> String {
        format!("/servers/{}/keys/me", server_id.inner())
    }

    pub fn server_key_fuer(server_id: ServerId, empfaenger: UserId) -> String {
        format!("/servers/{}/keys/{}", server_id.inner(), empfaenger.inner())
    }
}
