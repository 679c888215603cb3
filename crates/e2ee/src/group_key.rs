//! Group Key Manager – ein Gruppen-Schluessel pro Server
//!
//! Zustand pro Server aus Sicht dieses Geraets:
//!
//! ```text
//! Unknown ──request_key──> Pending ──handle_key_shared──> Known
//!    └──────── create_and_store / restore / share ──────────┘
//! ```
//!
//! Aus `Known` fuehrt kein Weg zurueck (keine Rotation, kein Widerruf).
//! Die Verteilung ist ein Konvergenz-Protokoll: ein einmal gecachter
//! Schluessel wird nicht durch einen spaeter eintreffenden ersetzt.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;

use fluester_core::{EncryptedKeyRecord, KeyEvent, ServerId, UserId};
use fluester_crypto::{
    create_group_key, unwrap_key_from_sender, wrap_key_for_recipient, SymmetricKey,
};

use crate::directory::{public_key_holen, KeyDirectory};
use crate::error::{E2eeError, E2eeResult};
use crate::identity_store::IdentityStore;
use crate::transport::EventTransport;

/// Schluessel-Zustand eines Servers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// Noch nichts angefragt, kein Schluessel
    Unknown,
    /// Anfrage gesendet, noch kein Schluessel erhalten
    Pending,
    /// Schluessel liegt im Speicher
    Known,
}

/// Verwaltet Gruppen-Schluessel fuer alle Server des Benutzers
pub struct GroupKeyManager {
    user_id: UserId,
    identity: Arc<IdentityStore>,
    directory: Arc<dyn KeyDirectory>,
    transport: Arc<dyn EventTransport>,
    /// Bekannte Schluessel (server_id -> GroupKey)
    keys: DashMap<ServerId, Arc<SymmetricKey>>,
    /// Angefragte, noch nicht erhaltene Schluessel
    pending: DashSet<ServerId>,
    /// Serialisiert das Erzeugen pro Server
    erzeugung: DashMap<ServerId, Arc<Mutex<()>>>,
}

impl GroupKeyManager {
    pub fn neu(
        user_id: UserId,
        identity: Arc<IdentityStore>,
        directory: Arc<dyn KeyDirectory>,
        transport: Arc<dyn EventTransport>,
    ) -> Self {
        Self {
            user_id,
            identity,
            directory,
            transport,
            keys: DashMap::new(),
            pending: DashSet::new(),
            erzeugung: DashMap::new(),
        }
    }

    pub fn key_state(&self, server_id: ServerId) -> KeyState {
        if self.keys.contains_key(&server_id) {
            KeyState::Known
        } else if self.pending.contains(&server_id) {
            KeyState::Pending
        } else {
            KeyState::Unknown
        }
    }

    /// Gecachter Schluessel eines Servers
    pub fn server_key(&self, server_id: ServerId) -> Option<Arc<SymmetricKey>> {
        self.keys
            .get(&server_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn pending_servers(&self) -> Vec<ServerId> {
        self.pending.iter().map(|entry| *entry.key()).collect()
    }

    /// Erzeugt den Gruppen-Schluessel eines Servers, der noch keinen hat.
    ///
    /// Der Schluessel wird fuer uns selbst eingewickelt im Verzeichnis
    /// abgelegt und danach gecacht. Ist bereits ein Schluessel bekannt,
    /// bleibt dieser bestehen. Parallele Aufrufe fuer denselben Server
    /// erzeugen genau einen Schluessel.
    pub async fn create_and_store_server_key(
        &self,
        server_id: ServerId,
    ) -> E2eeResult<Arc<SymmetricKey>> {
        let sperre = Arc::clone(self.erzeugung.entry(server_id).or_default().value());
        let _guard = sperre.lock().await;

        if let Some(key) = self.server_key(server_id) {
            tracing::warn!(server_id = %server_id, "Gruppen-Schluessel existiert bereits");
            return Ok(key);
        }

        let key = create_group_key();
        self.eigenen_umschlag_speichern(server_id, &key).await?;
        tracing::info!(server_id = %server_id, "Gruppen-Schluessel erzeugt");

        let cached = self.key_uebernehmen(server_id, key.clone());
        if cached.as_bytes() != key.as_bytes() {
            // Waehrenddessen geteilt: der gecachte Schluessel muss im Verzeichnis stehen
            self.eigenen_umschlag_speichern(server_id, &cached).await?;
        }
        Ok(cached)
    }

    /// Wickelt `key` fuer uns selbst ein und legt ihn als eigenen Umschlag ab
    async fn eigenen_umschlag_speichern(
        &self,
        server_id: ServerId,
        key: &SymmetricKey,
    ) -> E2eeResult<()> {
        let identity = self.identity.ensure_identity().await?;
        let encrypted_key = wrap_key_for_recipient(key, &identity.public_key(), &identity)?;

        self.directory
            .store_own_server_key(
                server_id,
                &EncryptedKeyRecord {
                    encrypted_key,
                    sender_id: self.user_id,
                },
            )
            .await
    }

    /// Stellt den Schluessel aus dem eigenen Umschlag im Verzeichnis wieder her.
    ///
    /// `Ok(false)` wenn kein Umschlag hinterlegt ist.
    pub async fn restore_from_directory(&self, server_id: ServerId) -> E2eeResult<bool> {
        let Some(record) = self.directory.fetch_own_server_key(server_id).await? else {
            return Ok(false);
        };

        let key = self
            .auswickeln(&record.encrypted_key, record.sender_id)
            .await?;
        self.key_uebernehmen(server_id, key);

        tracing::info!(
            server_id = %server_id,
            sender = %record.sender_id,
            "Gruppen-Schluessel aus Verzeichnis wiederhergestellt"
        );
        Ok(true)
    }

    /// Markiert den Server als `Pending` und sendet eine Anfrage an alle.
    ///
    /// Pro Pending-Phase wird hoechstens eine Anfrage gesendet; `Ok(false)`
    /// wenn nichts gesendet wurde (Schluessel bekannt oder bereits angefragt).
    pub fn request_key(&self, server_id: ServerId) -> E2eeResult<bool> {
        if self.keys.contains_key(&server_id) || !self.pending.insert(server_id) {
            return Ok(false);
        }

        if let Err(e) = self.transport.senden(KeyEvent::RequestServerKey { server_id }) {
            // Nicht gesendet: kein Pending, damit ein spaeterer Versuch erneut sendet
            self.pending.remove(&server_id);
            return Err(e);
        }

        tracing::info!(server_id = %server_id, "Gruppen-Schluessel angefragt");
        Ok(true)
    }

    /// Ein anderes Mitglied fragt nach dem Schluessel.
    ///
    /// `Ok(false)` wenn wir den Schluessel selbst nicht haben.
    pub async fn handle_key_requested(
        &self,
        server_id: ServerId,
        requester: UserId,
    ) -> E2eeResult<bool> {
        self.teilen_falls_bekannt(server_id, requester).await
    }

    /// Neues Mitglied: Schluessel proaktiv teilen, ohne auf eine Anfrage zu warten
    pub async fn handle_member_joined(
        &self,
        server_id: ServerId,
        new_member: UserId,
    ) -> E2eeResult<bool> {
        self.teilen_falls_bekannt(server_id, new_member).await
    }

    /// Ein anderes Mitglied hat uns den Schluessel eingewickelt.
    ///
    /// Wirft nie: Fehlschlaege werden geloggt, der Zustand bleibt wie er
    /// ist und ein spaeterer Versuch wird wieder angenommen.
    pub async fn handle_key_shared(
        &self,
        server_id: ServerId,
        encrypted_key: &str,
        sender_id: UserId,
    ) -> bool {
        match self.auswickeln(encrypted_key, sender_id).await {
            Ok(key) => {
                self.key_uebernehmen(server_id, key);
                tracing::info!(
                    server_id = %server_id,
                    sender = %sender_id,
                    "Gruppen-Schluessel erhalten"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    server_id = %server_id,
                    sender = %sender_id,
                    fehler = %e,
                    "Geteilter Schluessel verworfen"
                );
                false
            }
        }
    }

    /// Vergisst alle Pending-Markierungen (bekannte Schluessel bleiben)
    pub fn pending_zuruecksetzen(&self) {
        self.pending.clear();
    }

    async fn teilen_falls_bekannt(&self, server_id: ServerId, empfaenger: UserId) -> E2eeResult<bool> {
        if empfaenger == self.user_id {
            return Ok(false);
        }
        let Some(key) = self.server_key(server_id) else {
            tracing::debug!(
                server_id = %server_id,
                empfaenger = %empfaenger,
                "Schluessel unbekannt, kann nicht teilen"
            );
            return Ok(false);
        };

        self.teilen(server_id, empfaenger, &key).await?;
        Ok(true)
    }

    /// Einwickeln fuer `empfaenger`, per Unicast senden und im Verzeichnis ablegen
    async fn teilen(
        &self,
        server_id: ServerId,
        empfaenger: UserId,
        key: &SymmetricKey,
    ) -> E2eeResult<()> {
        let identity = self.identity.ensure_identity().await?;
        let empfaenger_public = public_key_holen(self.directory.as_ref(), empfaenger).await?;
        let encrypted_key = wrap_key_for_recipient(key, &empfaenger_public, &identity)?;

        let gesendet = self.transport.senden(KeyEvent::ShareServerKey {
            server_id,
            user_id: empfaenger,
            encrypted_key: encrypted_key.clone(),
        });
        if let Err(e) = &gesendet {
            tracing::warn!(
                server_id = %server_id,
                empfaenger = %empfaenger,
                fehler = %e,
                "Share-Event nicht gesendet, Umschlag wird trotzdem hinterlegt"
            );
        }

        self.directory
            .store_server_key_for(
                server_id,
                empfaenger,
                &EncryptedKeyRecord {
                    encrypted_key,
                    sender_id: self.user_id,
                },
            )
            .await?;

        tracing::info!(server_id = %server_id, empfaenger = %empfaenger, "Gruppen-Schluessel geteilt");
        gesendet
    }

    async fn auswickeln(&self, encrypted_key: &str, sender_id: UserId) -> E2eeResult<SymmetricKey> {
        let identity = self.identity.ensure_identity().await?;
        let sender_public = public_key_holen(self.directory.as_ref(), sender_id).await?;
        unwrap_key_from_sender(encrypted_key, &sender_public, &identity)
            .map_err(|e| E2eeError::Unwrap(e.to_string()))
    }

    /// Uebernimmt einen Schluessel in den Cache (der erste gewinnt) und beendet `Pending`
    fn key_uebernehmen(&self, server_id: ServerId, key: SymmetricKey) -> Arc<SymmetricKey> {
        let cached = {
            let entry = self
                .keys
                .entry(server_id)
                .or_insert_with(|| Arc::new(key.clone()));
            Arc::clone(entry.value())
        };
        if cached.as_bytes() != key.as_bytes() {
            tracing::warn!(
                server_id = %server_id,
                "Abweichender Gruppen-Schluessel ignoriert, bekannter bleibt gueltig"
            );
        }
        self.pending.remove(&server_id);
        cached
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{MemoryDirectory, MemoryDirectoryBackend};
    use crate::identity_store::MemoryIdentityStorage;
    use crate::transport::ChannelTransport;
    use tokio::sync::mpsc;

    struct Mitglied {
        user_id: UserId,
        manager: GroupKeyManager,
        ausgang: mpsc::Receiver<KeyEvent>,
        directory: Arc<MemoryDirectory>,
    }

    async fn mitglied(backend: &Arc<MemoryDirectoryBackend>) -> Mitglied {
        let user_id = UserId::new();
        let directory = Arc::new(backend.fuer_benutzer(user_id));
        let identity = Arc::new(IdentityStore::neu(Arc::new(MemoryIdentityStorage::new())));
        let public = identity.ensure_identity().await.unwrap().export_public_key();
        directory.publish_public_key(&public).await.unwrap();

        let (transport, ausgang) = ChannelTransport::neu(16);
        let manager = GroupKeyManager::neu(
            user_id,
            identity,
            directory.clone(),
            Arc::new(transport),
        );
        Mitglied {
            user_id,
            manager,
            ausgang,
            directory,
        }
    }

    #[tokio::test]
    async fn erzeugen_macht_known_und_speichert_selbst_umschlag() {
        let backend = MemoryDirectoryBackend::neu();
        let d = mitglied(&backend).await;
        let server = ServerId::new();

        assert_eq!(d.manager.key_state(server), KeyState::Unknown);
        let key = d.manager.create_and_store_server_key(server).await.unwrap();

        assert_eq!(d.manager.key_state(server), KeyState::Known);
        let record = backend.server_key(server, d.user_id).unwrap();
        assert_eq!(record.sender_id, d.user_id);
        assert_ne!(record.encrypted_key.as_bytes(), key.as_bytes());
    }

    #[tokio::test]
    async fn zweites_erzeugen_behaelt_schluessel() {
        let backend = MemoryDirectoryBackend::neu();
        let d = mitglied(&backend).await;
        let server = ServerId::new();

        let k1 = d.manager.create_and_store_server_key(server).await.unwrap();
        let k2 = d.manager.create_and_store_server_key(server).await.unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    /// Verzeichnis, das beim Ablegen des eigenen Umschlags die Kontrolle abgibt
    struct LangsamesVerzeichnis(Arc<MemoryDirectory>);

    #[async_trait::async_trait]
    impl KeyDirectory for LangsamesVerzeichnis {
        async fn publish_public_key(&self, public_key: &str) -> E2eeResult<()> {
            self.0.publish_public_key(public_key).await
        }

        async fn fetch_public_key(&self, user_id: UserId) -> E2eeResult<Option<String>> {
            self.0.fetch_public_key(user_id).await
        }

        async fn store_own_server_key(
            &self,
            server_id: ServerId,
            record: &EncryptedKeyRecord,
        ) -> E2eeResult<()> {
            tokio::task::yield_now().await;
            self.0.store_own_server_key(server_id, record).await
        }

        async fn fetch_own_server_key(
            &self,
            server_id: ServerId,
        ) -> E2eeResult<Option<EncryptedKeyRecord>> {
            self.0.fetch_own_server_key(server_id).await
        }

        async fn store_server_key_for(
            &self,
            server_id: ServerId,
            recipient: UserId,
            record: &EncryptedKeyRecord,
        ) -> E2eeResult<()> {
            self.0.store_server_key_for(server_id, recipient, record).await
        }
    }

    #[tokio::test]
    async fn paralleles_erzeugen_ergibt_einen_schluessel() {
        let backend = MemoryDirectoryBackend::neu();
        let d = mitglied(&backend).await;
        let server = ServerId::new();

        let (transport, _rx) = ChannelTransport::neu(4);
        let manager = GroupKeyManager::neu(
            d.user_id,
            Arc::clone(&d.manager.identity),
            Arc::new(LangsamesVerzeichnis(d.directory.clone())),
            Arc::new(transport),
        );

        let (a, b) = tokio::join!(
            manager.create_and_store_server_key(server),
            manager.create_and_store_server_key(server)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.as_bytes(), b.as_bytes());

        // Nach einem Neustart kommt derselbe Schluessel aus dem Verzeichnis
        let (transport, _rx) = ChannelTransport::neu(4);
        let neu = GroupKeyManager::neu(
            d.user_id,
            Arc::clone(&d.manager.identity),
            d.directory.clone(),
            Arc::new(transport),
        );
        assert!(neu.restore_from_directory(server).await.unwrap());
        assert_eq!(neu.server_key(server).unwrap().as_bytes(), a.as_bytes());
    }

    #[tokio::test]
    async fn waehrend_erzeugen_geteilter_schluessel_landet_im_verzeichnis() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d = mitglied(&backend).await;
        let c = mitglied(&backend).await;
        let server = ServerId::new();
        let geteilt = d.manager.create_and_store_server_key(server).await.unwrap();
        d.manager.handle_member_joined(server, c.user_id).await.unwrap();
        let Ok(KeyEvent::ShareServerKey { encrypted_key, .. }) = d.ausgang.try_recv() else {
            panic!("Share-Event erwartet");
        };

        let (transport, _rx) = ChannelTransport::neu(4);
        let manager = Arc::new(GroupKeyManager::neu(
            c.user_id,
            Arc::clone(&c.manager.identity),
            Arc::new(LangsamesVerzeichnis(c.directory.clone())),
            Arc::new(transport),
        ));

        // Share trifft ein, waehrend C selbst erzeugt
        let (erzeugt, angenommen) = tokio::join!(
            manager.create_and_store_server_key(server),
            manager.handle_key_shared(server, &encrypted_key, d.user_id)
        );
        assert!(angenommen);
        assert_eq!(erzeugt.unwrap().as_bytes(), geteilt.as_bytes());

        let (transport, _rx) = ChannelTransport::neu(4);
        let neu = GroupKeyManager::neu(
            c.user_id,
            Arc::clone(&c.manager.identity),
            c.directory.clone(),
            Arc::new(transport),
        );
        assert!(neu.restore_from_directory(server).await.unwrap());
        assert_eq!(neu.server_key(server).unwrap().as_bytes(), geteilt.as_bytes());
    }

    #[tokio::test]
    async fn restore_nach_neustart() {
        let backend = MemoryDirectoryBackend::neu();
        let d = mitglied(&backend).await;
        let server = ServerId::new();
        let original = d.manager.create_and_store_server_key(server).await.unwrap();

        // Neuer Manager, gleiche Identitaet und gleiches Verzeichnis
        let (transport, _rx) = ChannelTransport::neu(4);
        let neu = GroupKeyManager::neu(
            d.user_id,
            Arc::clone(&d.manager.identity),
            d.directory.clone(),
            Arc::new(transport),
        );
        assert!(neu.restore_from_directory(server).await.unwrap());
        assert_eq!(neu.server_key(server).unwrap().as_bytes(), original.as_bytes());
    }

    #[tokio::test]
    async fn restore_ohne_umschlag() {
        let backend = MemoryDirectoryBackend::neu();
        let c = mitglied(&backend).await;
        assert!(!c.manager.restore_from_directory(ServerId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn anfrage_nur_einmal_pro_pending() {
        let backend = MemoryDirectoryBackend::neu();
        let mut c = mitglied(&backend).await;
        let server = ServerId::new();

        assert!(c.manager.request_key(server).unwrap());
        assert!(!c.manager.request_key(server).unwrap());
        assert_eq!(c.manager.key_state(server), KeyState::Pending);
        assert_eq!(c.manager.pending_servers(), vec![server]);

        assert_eq!(
            c.ausgang.try_recv().unwrap(),
            KeyEvent::RequestServerKey { server_id: server }
        );
        assert!(c.ausgang.try_recv().is_err());
    }

    #[tokio::test]
    async fn anfrage_bei_bekanntem_schluessel_entfaellt() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d = mitglied(&backend).await;
        let server = ServerId::new();
        d.manager.create_and_store_server_key(server).await.unwrap();

        assert!(!d.manager.request_key(server).unwrap());
        assert!(d.ausgang.try_recv().is_err());
    }

    #[tokio::test]
    async fn fehlgeschlagene_anfrage_bleibt_unknown() {
        let backend = MemoryDirectoryBackend::neu();
        let c = mitglied(&backend).await;
        let server = ServerId::new();
        let Mitglied { manager, ausgang, .. } = c;
        drop(ausgang);

        assert!(manager.request_key(server).is_err());
        assert_eq!(manager.key_state(server), KeyState::Unknown);
    }

    #[tokio::test]
    async fn anfrage_teilen_und_annehmen() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d = mitglied(&backend).await;
        let c = mitglied(&backend).await;
        let server = ServerId::new();
        let key = d.manager.create_and_store_server_key(server).await.unwrap();

        c.manager.request_key(server).unwrap();
        assert!(d.manager.handle_key_requested(server, c.user_id).await.unwrap());

        let KeyEvent::ShareServerKey {
            server_id,
            user_id,
            encrypted_key,
        } = d.ausgang.try_recv().unwrap()
        else {
            panic!("Share-Event erwartet");
        };
        assert_eq!(server_id, server);
        assert_eq!(user_id, c.user_id);

        // Umschlag fuer C liegt auch im Verzeichnis
        let hinterlegt = backend.server_key(server, c.user_id).unwrap();
        assert_eq!(hinterlegt.sender_id, d.user_id);

        assert!(c.manager.handle_key_shared(server, &encrypted_key, d.user_id).await);
        assert_eq!(c.manager.key_state(server), KeyState::Known);
        assert_eq!(c.manager.server_key(server).unwrap().as_bytes(), key.as_bytes());
    }

    #[tokio::test]
    async fn ohne_schluessel_keine_hilfe() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d = mitglied(&backend).await;
        let c = mitglied(&backend).await;
        let server = ServerId::new();

        assert!(!d.manager.handle_key_requested(server, c.user_id).await.unwrap());
        assert!(!d.manager.handle_member_joined(server, c.user_id).await.unwrap());
        assert!(d.ausgang.try_recv().is_err());
    }

    #[tokio::test]
    async fn eigene_anfrage_wird_ignoriert() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d = mitglied(&backend).await;
        let server = ServerId::new();
        d.manager.create_and_store_server_key(server).await.unwrap();

        assert!(!d.manager.handle_key_requested(server, d.user_id).await.unwrap());
        assert!(d.ausgang.try_recv().is_err());
    }

    #[tokio::test]
    async fn anfragender_ohne_public_key() {
        let backend = MemoryDirectoryBackend::neu();
        let d = mitglied(&backend).await;
        let server = ServerId::new();
        d.manager.create_and_store_server_key(server).await.unwrap();

        let result = d.manager.handle_key_requested(server, UserId::new()).await;
        assert!(matches!(result, Err(E2eeError::SchluesselNichtVerfuegbar(_))));
    }

    #[tokio::test]
    async fn manipulierter_share_laesst_pending() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d = mitglied(&backend).await;
        let c = mitglied(&backend).await;
        let server = ServerId::new();
        d.manager.create_and_store_server_key(server).await.unwrap();
        c.manager.request_key(server).unwrap();
        d.manager.handle_member_joined(server, c.user_id).await.unwrap();

        let Ok(KeyEvent::ShareServerKey { encrypted_key, .. }) = d.ausgang.try_recv() else {
            panic!("Share-Event erwartet");
        };

        // Falscher Absender
        let fremd = mitglied(&backend).await;
        assert!(!c.manager.handle_key_shared(server, &encrypted_key, fremd.user_id).await);
        // Unbekannter Absender ohne Public Key
        assert!(!c.manager.handle_key_shared(server, &encrypted_key, UserId::new()).await);
        // Kaputter Umschlag
        assert!(!c.manager.handle_key_shared(server, "AAAA", d.user_id).await);
        assert_eq!(c.manager.key_state(server), KeyState::Pending);

        // Spaeterer gueltiger Versuch wird angenommen
        assert!(c.manager.handle_key_shared(server, &encrypted_key, d.user_id).await);
        assert_eq!(c.manager.key_state(server), KeyState::Known);
    }

    #[tokio::test]
    async fn doppelter_share_ist_harmlos() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d = mitglied(&backend).await;
        let c = mitglied(&backend).await;
        let server = ServerId::new();
        let key = d.manager.create_and_store_server_key(server).await.unwrap();
        d.manager.handle_member_joined(server, c.user_id).await.unwrap();
        let Ok(KeyEvent::ShareServerKey { encrypted_key, .. }) = d.ausgang.try_recv() else {
            panic!("Share-Event erwartet");
        };

        assert!(c.manager.handle_key_shared(server, &encrypted_key, d.user_id).await);
        assert!(c.manager.handle_key_shared(server, &encrypted_key, d.user_id).await);
        assert_eq!(c.manager.server_key(server).unwrap().as_bytes(), key.as_bytes());
    }

    #[tokio::test]
    async fn spaeterer_abweichender_schluessel_ersetzt_nicht() {
        let backend = MemoryDirectoryBackend::neu();
        let mut d1 = mitglied(&backend).await;
        let mut d2 = mitglied(&backend).await;
        let c = mitglied(&backend).await;
        let server = ServerId::new();

        let erster = d1.manager.create_and_store_server_key(server).await.unwrap();
        d2.manager.create_and_store_server_key(server).await.unwrap();

        d1.manager.handle_member_joined(server, c.user_id).await.unwrap();
        d2.manager.handle_member_joined(server, c.user_id).await.unwrap();
        let Ok(KeyEvent::ShareServerKey { encrypted_key: von_d1, .. }) = d1.ausgang.try_recv() else {
            panic!("Share-Event erwartet");
        };
        let Ok(KeyEvent::ShareServerKey { encrypted_key: von_d2, .. }) = d2.ausgang.try_recv() else {
            panic!("Share-Event erwartet");
        };

        assert!(c.manager.handle_key_shared(server, &von_d1, d1.user_id).await);
        assert!(c.manager.handle_key_shared(server, &von_d2, d2.user_id).await);
        assert_eq!(c.manager.server_key(server).unwrap().as_bytes(), erster.as_bytes());
    }

    #[tokio::test]
    async fn pending_zuruecksetzen_erlaubt_neue_anfrage() {
        let backend = MemoryDirectoryBackend::neu();
        let mut c = mitglied(&backend).await;
        let server = ServerId::new();

        c.manager.request_key(server).unwrap();
        c.manager.pending_zuruecksetzen();
        assert_eq!(c.manager.key_state(server), KeyState::Unknown);
        assert!(c.manager.request_key(server).unwrap());

        assert!(c.ausgang.try_recv().is_ok());
        assert!(c.ausgang.try_recv().is_ok());
    }
}
