//! Schluessel-Verzeichnisdienst (Client-Seite)
//!
//! Der Verzeichnisdienst speichert oeffentliche Schluessel und pro
//! (Server, Benutzer) genau einen eingewickelten Gruppen-Schluessel. Er
//! sieht nur undurchsichtige Umschlaege, nie Klartext-Schluessel.
//!
//! Jede Instanz spricht im Namen genau eines Benutzers ("me").

mod http;
mod memory;

use async_trait::async_trait;

use fluester_core::{EncryptedKeyRecord, ServerId, UserId};
use fluester_crypto::{import_public_key, PublicKey};

use crate::error::{E2eeError, E2eeResult};

pub use http::HttpDirectory;
pub use memory::{MemoryDirectory, MemoryDirectoryBackend};

/// Eine Methode pro REST-Endpunkt des Verzeichnisdienstes
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    /// `PUT /identity/public-key`
    async fn publish_public_key(&self, public_key: &str) -> E2eeResult<()>;

    /// `GET /identity/{userId}/public-key`
    async fn fetch_public_key(&self, user_id: UserId) -> E2eeResult<Option<String>>;

    /// `PUT /servers/{serverId}/keys` – eigener, selbst-eingewickelter Umschlag
    async fn store_own_server_key(
        &self,
        server_id: ServerId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()>;

    /// `GET /servers/{serverId}/keys/me`
    async fn fetch_own_server_key(&self, server_id: ServerId)
        -> E2eeResult<Option<EncryptedKeyRecord>>;

    /// `PUT /servers/{serverId}/keys/{recipientUserId}`
    async fn store_server_key_for(
        &self,
        server_id: ServerId,
        recipient: UserId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()>;
}

/// Holt und importiert den oeffentlichen Schluessel eines Benutzers
///
/// - nicht veroeffentlicht -> [`E2eeError::SchluesselNichtVerfuegbar`]
/// - kaputtes Format -> [`E2eeError::SchluesselFormat`] (Benutzer gilt als schluessellos)
pub async fn public_key_holen(
    directory: &dyn KeyDirectory,
    user_id: UserId,
) -> E2eeResult<PublicKey> {
    let encoded = directory
        .fetch_public_key(user_id)
        .await?
        .ok_or(E2eeError::SchluesselNichtVerfuegbar(user_id))?;

    import_public_key(&encoded).map_err(|e| E2eeError::SchluesselFormat {
        user_id,
        grund: e.to_string(),
    })
}
