//! KeyManager – Einstiegspunkt der Ende-zu-Ende-Verschluesselung
//!
//! Besitzt Identity Store, DM Key Deriver und Group Key Manager und
//! verbindet sie mit Verzeichnisdienst, Event-Transport und der
//! Mitgliedschafts-Sicht. Alle Caches leben hier, nicht global.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};

use fluester_core::{DmChannelId, KeyEvent, ServerId, UserId};
use fluester_crypto::{decrypt_message, encrypt_message, EncryptedMessage, EPOCH_LEGACY};

use crate::config::ClientConfig;
use crate::directory::{HttpDirectory, KeyDirectory};
use crate::dm_key::DmKeyDeriver;
use crate::error::{E2eeError, E2eeResult};
use crate::group_key::{GroupKeyManager, KeyState};
use crate::identity_store::{FileIdentityStorage, IdentityStorage, IdentityStore};
use crate::membership::Membership;
use crate::transport::{ChannelTransport, EventTransport};

/// Zustand der Verschluesselung aus Sicht der Oberflaeche
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionStatus {
    /// `initialize` wurde noch nicht erfolgreich ausgefuehrt
    Uninitialisiert,
    /// `initialize` laeuft gerade
    Initialisierung,
    Bereit,
    /// Letzte Initialisierung fehlgeschlagen; `reinitialize` versucht es erneut
    Fehler(String),
}

pub struct KeyManager {
    user_id: UserId,
    membership: Arc<dyn Membership>,
    directory: Arc<dyn KeyDirectory>,
    identity: Arc<IdentityStore>,
    dm_keys: DmKeyDeriver,
    group_keys: GroupKeyManager,
    status: RwLock<EncryptionStatus>,
    /// Haelt waehrend `initialize` den Lock, parallele Aufrufe warten
    init_sperre: Mutex<()>,
}

impl KeyManager {
    pub fn neu(
        membership: Arc<dyn Membership>,
        identity_storage: Arc<dyn IdentityStorage>,
        directory: Arc<dyn KeyDirectory>,
        transport: Arc<dyn EventTransport>,
    ) -> Arc<Self> {
        let user_id = membership.current_user_id();
        let identity = Arc::new(IdentityStore::neu(identity_storage));

        Arc::new(Self {
            user_id,
            dm_keys: DmKeyDeriver::neu(Arc::clone(&identity), Arc::clone(&directory)),
            group_keys: GroupKeyManager::neu(
                user_id,
                Arc::clone(&identity),
                Arc::clone(&directory),
                transport,
            ),
            membership,
            directory,
            identity,
            status: RwLock::new(EncryptionStatus::Uninitialisiert),
            init_sperre: Mutex::new(()),
        })
    }

    /// Baut den Manager aus der Client-Konfiguration auf
    ///
    /// Gibt zusaetzlich den Receiver der ausgehenden Events zurueck; die
    /// einbettende Anwendung leitet diese an den Echtzeit-Kanal weiter.
    pub fn aus_config(
        config: &ClientConfig,
        membership: Arc<dyn Membership>,
    ) -> E2eeResult<(Arc<Self>, mpsc::Receiver<KeyEvent>)> {
        let storage = FileIdentityStorage::new(PathBuf::from(&config.identitaet.verzeichnis));
        let directory = HttpDirectory::aus_config(&config.verzeichnisdienst)?;
        let (transport, ausgang) = ChannelTransport::neu(config.transport.queue_groesse);

        let manager = Self::neu(
            membership,
            Arc::new(storage),
            Arc::new(directory),
            Arc::new(transport),
        );
        Ok((manager, ausgang))
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn identity_store(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn dm_keys(&self) -> &DmKeyDeriver {
        &self.dm_keys
    }

    pub fn group_keys(&self) -> &GroupKeyManager {
        &self.group_keys
    }

    /// Aktueller Status; blockiert nicht waehrend einer laufenden Initialisierung
    pub fn status(&self) -> EncryptionStatus {
        self.status.read().clone()
    }

    fn status_setzen(&self, status: EncryptionStatus) {
        *self.status.write() = status;
    }

    /// Identitaet sicherstellen, Public Key veroeffentlichen, Server-Schluessel laden.
    ///
    /// Idempotent: nach Erfolg kehren weitere Aufrufe sofort zurueck.
    /// Schlaegt die Identitaet oder das Veroeffentlichen fehl, wechselt der
    /// Status auf `Fehler` und der Fehler wird zurueckgegeben.
    pub async fn initialize(&self) -> E2eeResult<()> {
        let _sperre = self.init_sperre.lock().await;
        if self.status() == EncryptionStatus::Bereit {
            tracing::debug!("Verschluesselung bereits initialisiert");
            return Ok(());
        }

        self.status_setzen(EncryptionStatus::Initialisierung);
        match self.initialisieren().await {
            Ok(()) => {
                self.status_setzen(EncryptionStatus::Bereit);
                tracing::info!(user_id = %self.user_id, "Verschluesselung bereit");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    fehler = %e,
                    wiederholbar = e.ist_wiederholbar(),
                    "Initialisierung der Verschluesselung fehlgeschlagen"
                );
                self.status_setzen(EncryptionStatus::Fehler(e.to_string()));
                Err(e)
            }
        }
    }

    /// Setzt Initialisierung und Pending-Markierungen zurueck und initialisiert neu.
    ///
    /// Bekannte Gruppen-Schluessel bleiben erhalten; fuer alle anderen
    /// Server wird erneut angefragt.
    pub async fn reinitialize(&self) -> E2eeResult<()> {
        {
            let _sperre = self.init_sperre.lock().await;
            self.status_setzen(EncryptionStatus::Uninitialisiert);
            self.group_keys.pending_zuruecksetzen();
        }
        tracing::info!("Verschluesselung wird neu initialisiert");
        self.initialize().await
    }

    async fn initialisieren(&self) -> E2eeResult<()> {
        let identity = self.identity.ensure_identity().await?;
        self.directory
            .publish_public_key(&identity.export_public_key())
            .await?;

        for server_id in self.membership.server_ids() {
            self.server_schluessel_laden(server_id).await;
        }
        Ok(())
    }

    /// Eigenen Umschlag wiederherstellen, sonst anfragen
    async fn server_schluessel_laden(&self, server_id: ServerId) {
        if self.group_keys.key_state(server_id) == KeyState::Known {
            return;
        }

        match self.group_keys.restore_from_directory(server_id).await {
            Ok(true) => return,
            Ok(false) => {
                tracing::debug!(server_id = %server_id, "Kein eigener Umschlag hinterlegt");
            }
            Err(e) => {
                tracing::warn!(
                    server_id = %server_id,
                    fehler = %e,
                    "Wiederherstellung fehlgeschlagen, frage Mitglieder an"
                );
            }
        }

        if let Err(e) = self.group_keys.request_key(server_id) {
            tracing::warn!(server_id = %server_id, fehler = %e, "Schluessel-Anfrage nicht gesendet");
        }
    }

    pub fn key_state(&self, server_id: ServerId) -> KeyState {
        self.group_keys.key_state(server_id)
    }

    pub fn pending_servers(&self) -> Vec<ServerId> {
        self.group_keys.pending_servers()
    }

    /// Erzeugt den Schluessel fuer einen neu angelegten Server
    pub async fn create_and_store_server_key(&self, server_id: ServerId) -> E2eeResult<()> {
        self.group_keys
            .create_and_store_server_key(server_id)
            .await
            .map(|_| ())
    }

    /// Verarbeitet ein eingehendes Event. Fehler werden geloggt, nie weitergereicht.
    pub async fn handle_event(&self, event: KeyEvent) {
        let name = event.name();
        let ergebnis = match event {
            KeyEvent::ServerKeyShared {
                server_id,
                encrypted_key,
                sender_id,
            } => {
                self.group_keys
                    .handle_key_shared(server_id, &encrypted_key, sender_id)
                    .await;
                Ok(())
            }
            KeyEvent::ServerKeyRequested { server_id, user_id } => self
                .group_keys
                .handle_key_requested(server_id, user_id)
                .await
                .map(|_| ()),
            KeyEvent::MemberJoined { server_id, user_id } => self
                .group_keys
                .handle_member_joined(server_id, user_id)
                .await
                .map(|_| ()),
            KeyEvent::RequestServerKey { .. } | KeyEvent::ShareServerKey { .. } => {
                tracing::debug!(event = name, "Ausgehendes Event empfangen, ignoriert");
                Ok(())
            }
        };

        if let Err(e) = ergebnis {
            tracing::warn!(event = name, fehler = %e, "Event-Verarbeitung fehlgeschlagen");
        }
    }

    /// Verarbeitet eingehende Events bis der Kanal geschlossen wird
    pub async fn ereignisse_verarbeiten(self: Arc<Self>, mut eingang: mpsc::Receiver<KeyEvent>) {
        while let Some(event) = eingang.recv().await {
            self.handle_event(event).await;
        }
        tracing::debug!(user_id = %self.user_id, "Event-Eingang geschlossen");
    }

    // -----------------------------------------------------------------------
    // Nachrichten
    // -----------------------------------------------------------------------

    /// Verschluesselt eine Kanal-Nachricht mit dem Gruppen-Schluessel des Servers
    pub fn encrypt_server_message(
        &self,
        server_id: ServerId,
        plaintext: &str,
    ) -> E2eeResult<EncryptedMessage> {
        let key = self
            .group_keys
            .server_key(server_id)
            .ok_or(E2eeError::KeinGruppenSchluessel(server_id))?;
        Ok(encrypt_message(plaintext, &key)?)
    }

    /// Entschluesselt eine Kanal-Nachricht; liefert bei Fehlern einen Anzeigetext
    pub fn decrypt_server_message(&self, server_id: ServerId, message: &EncryptedMessage) -> String {
        let key = self.group_keys.server_key(server_id);
        decrypt_message(&message.content, key.as_deref(), message.epoch)
    }

    pub async fn encrypt_dm_message(
        &self,
        dm_channel_id: DmChannelId,
        peer_user_id: UserId,
        plaintext: &str,
    ) -> E2eeResult<EncryptedMessage> {
        let key = self.dm_keys.get_dm_key(dm_channel_id, peer_user_id).await?;
        Ok(encrypt_message(plaintext, &key)?)
    }

    pub async fn decrypt_dm_message(
        &self,
        dm_channel_id: DmChannelId,
        peer_user_id: UserId,
        message: &EncryptedMessage,
    ) -> String {
        if message.epoch == EPOCH_LEGACY {
            return decrypt_message(&message.content, None, message.epoch);
        }

        // Ohne Schluessel liefert decrypt_message den Platzhalter
        let key = match self.dm_keys.get_dm_key(dm_channel_id, peer_user_id).await {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::debug!(dm = %dm_channel_id, fehler = %e, "DM-Schluessel nicht verfuegbar");
                None
            }
        };
        decrypt_message(&message.content, key.as_deref(), message.epoch)
    }
}
