//! Identity Store – Langzeit-Schluessel-Paar des Geraets
//!
//! Das Schluessel-Paar wird einmalig erzeugt und in genau einem festen
//! Slot im lokalen Speicher abgelegt. Das `IdentityStorage`-Trait
//! abstrahiert den konkreten Speicher (Datei, Speicher, Keychain, ...).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;

use fluester_crypto::IdentityKeyPair;

use crate::error::{E2eeError, E2eeResult};

/// Name des festen Identitaets-Slots
pub const IDENTITY_SLOT: &str = "identity.json";

/// Dateirechte des Slots: nur der Besitzer darf lesen und schreiben
#[cfg(unix)]
const SLOT_MODUS: u32 = 0o600;

/// Persistierte Form der Identitaet (beide Haelften, base64)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub private_key: String,
    pub public_key: String,
}

impl StoredIdentity {
    fn aus_identity(identity: &IdentityKeyPair) -> Self {
        Self {
            private_key: STANDARD.encode(identity.private_key_bytes()),
            public_key: identity.export_public_key(),
        }
    }

    /// Stellt das Schluessel-Paar wieder her und prueft, dass beide Haelften zusammenpassen
    fn zu_identity(&self) -> E2eeResult<IdentityKeyPair> {
        let raw = STANDARD
            .decode(&self.private_key)
            .map_err(|e| E2eeError::Speicher(format!("Identitaet unlesbar: {e}")))?;
        let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
            E2eeError::Speicher(format!("privater Schluessel hat {} Bytes", raw.len()))
        })?;

        let identity = IdentityKeyPair::from_bytes(bytes);
        if identity.export_public_key() != self.public_key {
            return Err(E2eeError::Speicher(
                "gespeicherter oeffentlicher Schluessel passt nicht zum privaten".into(),
            ));
        }
        Ok(identity)
    }
}

/// Abstrakter lokaler Speicher fuer den Identitaets-Slot
#[async_trait]
pub trait IdentityStorage: Send + Sync {
    /// Laedt die Identitaet, `None` wenn der Slot leer ist
    async fn laden(&self) -> E2eeResult<Option<StoredIdentity>>;

    /// Schreibt die Identitaet in den Slot
    async fn speichern(&self, identity: &StoredIdentity) -> E2eeResult<()>;
}

/// Datei-basierter Identitaets-Speicher
///
/// Speichert den Slot unter `base_dir/identity.json`.
#[derive(Debug, Clone)]
pub struct FileIdentityStorage {
    base_dir: PathBuf,
}

impl FileIdentityStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn slot_pfad(&self) -> PathBuf {
        self.base_dir.join(IDENTITY_SLOT)
    }
}

#[async_trait]
impl IdentityStorage for FileIdentityStorage {
    async fn laden(&self) -> E2eeResult<Option<StoredIdentity>> {
        let pfad = self.slot_pfad();
        match tokio::fs::read(&pfad).await {
            Ok(inhalt) => {
                let stored = serde_json::from_slice(&inhalt).map_err(|e| {
                    E2eeError::Speicher(format!("Identitaets-Slot '{}' kaputt: {e}", pfad.display()))
                })?;
                tracing::debug!(pfad = %pfad.display(), "Identitaet geladen");
                Ok(Some(stored))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn speichern(&self, identity: &StoredIdentity) -> E2eeResult<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let inhalt = serde_json::to_vec_pretty(identity)
            .map_err(|e| E2eeError::Speicher(e.to_string()))?;

        // Erst in temporaere Datei schreiben, dann atomar umbenennen
        let pfad = self.slot_pfad();
        let tmp = pfad.with_extension("json.tmp");

        let mut optionen = tokio::fs::OpenOptions::new();
        optionen.create(true).truncate(true).write(true);
        #[cfg(unix)]
        optionen.mode(SLOT_MODUS);

        let mut datei = optionen.open(&tmp).await?;
        datei.write_all(&inhalt).await?;
        datei.sync_all().await?;
        drop(datei);

        tokio::fs::rename(&tmp, &pfad).await?;

        // Eine vorher vorhandene tmp-Datei behaelt ihre alten Rechte
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&pfad, std::fs::Permissions::from_mode(SLOT_MODUS))
                .await?;
        }

        tracing::debug!(pfad = %pfad.display(), "Identitaet gespeichert");
        Ok(())
    }
}

/// Fluechtiger Identitaets-Speicher (Tests, Sitzungen ohne Persistenz)
#[derive(Debug, Default)]
pub struct MemoryIdentityStorage {
    slot: parking_lot::Mutex<Option<StoredIdentity>>,
    schreibvorgaenge: std::sync::atomic::AtomicUsize,
}

impl MemoryIdentityStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anzahl bisheriger `speichern`-Aufrufe
    pub fn schreibvorgaenge(&self) -> usize {
        self.schreibvorgaenge
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStorage for MemoryIdentityStorage {
    async fn laden(&self) -> E2eeResult<Option<StoredIdentity>> {
        Ok(self.slot.lock().clone())
    }

    async fn speichern(&self, identity: &StoredIdentity) -> E2eeResult<()> {
        *self.slot.lock() = Some(identity.clone());
        self.schreibvorgaenge
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

/// Stellt genau eine Identitaet pro Geraet bereit
///
/// Nach der ersten erfolgreichen Initialisierung ist die Identitaet
/// unveraenderlich. Schlaegt die Initialisierung fehl, bleibt der Store
/// leer und der naechste Aufruf versucht es erneut.
pub struct IdentityStore {
    storage: Arc<dyn IdentityStorage>,
    identity: OnceCell<Arc<IdentityKeyPair>>,
}

impl IdentityStore {
    pub fn neu(storage: Arc<dyn IdentityStorage>) -> Self {
        Self {
            storage,
            identity: OnceCell::new(),
        }
    }

    /// Laedt die gespeicherte Identitaet oder erzeugt und speichert eine neue.
    ///
    /// Parallele Aufrufe warten auf dieselbe Initialisierung, es entsteht
    /// hoechstens eine Identitaet.
    pub async fn ensure_identity(&self) -> E2eeResult<Arc<IdentityKeyPair>> {
        let identity = self
            .identity
            .get_or_try_init(|| async {
                if let Some(stored) = self.storage.laden().await? {
                    let identity = stored.zu_identity()?;
                    tracing::info!("Vorhandene Identitaet geladen");
                    return Ok::<_, E2eeError>(Arc::new(identity));
                }

                let identity = IdentityKeyPair::generate();
                self.storage
                    .speichern(&StoredIdentity::aus_identity(&identity))
                    .await?;
                tracing::info!("Neue Identitaet erzeugt und gespeichert");
                Ok(Arc::new(identity))
            })
            .await?;
        Ok(Arc::clone(identity))
    }

    /// Bereits initialisierte Identitaet, ohne Speicherzugriff
    pub fn identity(&self) -> Option<Arc<IdentityKeyPair>> {
        self.identity.get().cloned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
