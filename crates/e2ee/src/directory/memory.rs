//! In-Prozess-Verzeichnis
//!
//! Ein gemeinsames Backend, mehrere Benutzer-Sichten. Damit koennen
//! mehrere Clients in einem Prozess (Tests, lokale Demos) dasselbe
//! Verzeichnis teilen.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use fluester_core::{EncryptedKeyRecord, ServerId, UserId};

use super::KeyDirectory;
use crate::error::E2eeResult;

/// Gemeinsamer Zustand aller Sichten
#[derive(Debug, Default)]
pub struct MemoryDirectoryBackend {
    public_keys: DashMap<UserId, String>,
    server_keys: DashMap<(ServerId, UserId), EncryptedKeyRecord>,
}

impl MemoryDirectoryBackend {
    pub fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sicht fuer einen Benutzer
    pub fn fuer_benutzer(self: &Arc<Self>, user_id: UserId) -> MemoryDirectory {
        MemoryDirectory {
            backend: Arc::clone(self),
            user_id,
        }
    }

    /// Gespeicherter Umschlag fuer (Server, Benutzer)
    pub fn server_key(&self, server_id: ServerId, user_id: UserId) -> Option<EncryptedKeyRecord> {
        self.server_keys
            .get(&(server_id, user_id))
            .map(|entry| entry.value().clone())
    }

    /// Setzt einen Roh-Eintrag (z.B. absichtlich kaputte Schluessel in Tests)
    pub fn public_key_setzen(&self, user_id: UserId, public_key: impl Into<String>) {
        self.public_keys.insert(user_id, public_key.into());
    }
}

/// Verzeichnis-Sicht eines einzelnen Benutzers
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    backend: Arc<MemoryDirectoryBackend>,
    user_id: UserId,
}

#[async_trait]
impl KeyDirectory for MemoryDirectory {
    async fn publish_public_key(&self, public_key: &str) -> E2eeResult<()> {
        self.backend
            .public_keys
            .insert(self.user_id, public_key.to_string());
        Ok(())
    }

    async fn fetch_public_key(&self, user_id: UserId) -> E2eeResult<Option<String>> {
        Ok(self
            .backend
            .public_keys
            .get(&user_id)
            .map(|entry| entry.value().clone()))
    }

    async fn store_own_server_key(
        &self,
        server_id: ServerId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()> {
        self.backend
            .server_keys
            .insert((server_id, self.user_id), record.clone());
        Ok(())
    }

    async fn fetch_own_server_key(
        &self,
        server_id: ServerId,
    ) -> E2eeResult<Option<EncryptedKeyRecord>> {
        Ok(self.backend.server_key(server_id, self.user_id))
    }

    async fn store_server_key_for(
        &self,
        server_id: ServerId,
        recipient: UserId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()> {
        self.backend
            .server_keys
            .insert((server_id, recipient), record.clone());
        Ok(())
    }
}
