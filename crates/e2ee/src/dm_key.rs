//! DM Key Deriver – Schluessel pro Direktnachrichten-Unterhaltung
//!
//! Der Schluessel ist eine reine Funktion von
//! (eigener privater Schluessel, oeffentlicher Schluessel des Gegenuebers,
//! Unterhaltungs-ID). Beide Seiten leiten denselben Wert ab. Er liegt nur
//! im Speicher und wird nie persistiert oder uebertragen.

use std::sync::Arc;

use dashmap::DashMap;

use fluester_core::{DmChannelId, UserId};
use fluester_crypto::{derive_shared_key, SymmetricKey, DM_INFO};

use crate::directory::{public_key_holen, KeyDirectory};
use crate::error::E2eeResult;
use crate::identity_store::IdentityStore;

/// Leitet DM-Schluessel ab und cached sie pro Unterhaltung
pub struct DmKeyDeriver {
    identity: Arc<IdentityStore>,
    directory: Arc<dyn KeyDirectory>,
    cache: DashMap<DmChannelId, Arc<SymmetricKey>>,
}

impl DmKeyDeriver {
    pub fn neu(identity: Arc<IdentityStore>, directory: Arc<dyn KeyDirectory>) -> Self {
        Self {
            identity,
            directory,
            cache: DashMap::new(),
        }
    }

    /// Gibt den Schluessel fuer `dm_channel_id` zurueck, leitet ihn bei Bedarf ab.
    ///
    /// Parallele Aufrufe fuer dieselbe Unterhaltung duerfen beide ableiten;
    /// das Ergebnis ist deterministisch, der Cache konvergiert.
    pub async fn get_dm_key(
        &self,
        dm_channel_id: DmChannelId,
        peer_user_id: UserId,
    ) -> E2eeResult<Arc<SymmetricKey>> {
        if let Some(key) = self.cache.get(&dm_channel_id) {
            return Ok(Arc::clone(key.value()));
        }

        let identity = self.identity.ensure_identity().await?;
        let peer_public = public_key_holen(self.directory.as_ref(), peer_user_id).await?;

        let key = derive_shared_key(
            &identity,
            &peer_public,
            &dm_channel_id.salt_bytes(),
            DM_INFO,
        )?;
        let key = Arc::new(key);
        self.cache.insert(dm_channel_id, Arc::clone(&key));

        tracing::debug!(dm = %dm_channel_id, peer = %peer_user_id, "DM-Schluessel abgeleitet");
        Ok(key)
    }

    /// Bereits abgeleiteter Schluessel, ohne Netzwerkzugriff
    pub fn cached(&self, dm_channel_id: DmChannelId) -> Option<Arc<SymmetricKey>> {
        self.cache
            .get(&dm_channel_id)
            .map(|entry| Arc::clone(entry.value()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
