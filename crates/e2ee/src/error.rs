//! Fehlertypen fuer das E2EE-Subsystem

use fluester_core::{ServerId, UserId};
use fluester_crypto::CryptoError;
use thiserror::Error;

/// Fehler der Schluesselverwaltung
#[derive(Debug, Error)]
pub enum E2eeError {
    /// Lokale Persistenz nicht verfuegbar (StorageError)
    #[error("Speicher-Fehler: {0}")]
    Speicher(String),

    /// Oeffentlicher Schluessel im Verzeichnis ist kaputt (KeyFormatError)
    #[error("Ungueltiges Schluessel-Format von {user_id}: {grund}")]
    SchluesselFormat { user_id: UserId, grund: String },

    /// Benutzer hat keinen oeffentlichen Schluessel veroeffentlicht (KeyUnavailable)
    #[error("Kein oeffentlicher Schluessel fuer {0}")]
    SchluesselNichtVerfuegbar(UserId),

    /// Gruppen-Schluessel fuer den Server ist (noch) nicht bekannt
    #[error("Kein Gruppen-Schluessel fuer {0}")]
    KeinGruppenSchluessel(ServerId),

    /// Eingewickelter Schluessel hat die Authentifizierung nicht bestanden (UnwrapError)
    #[error("Schluessel-Unwrap fehlgeschlagen: {0}")]
    Unwrap(String),

    #[error("Verzeichnisdienst-Fehler: {0}")]
    Verzeichnis(String),

    #[error("Transport-Fehler: {0}")]
    Transport(String),

    #[error("Krypto-Fehler: {0}")]
    Krypto(#[from] CryptoError),
}

pub type E2eeResult<T> = Result<T, E2eeError>;

impl E2eeError {
    /// Gibt true zurueck wenn ein erneuter Versuch sinnvoll ist
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(
            self,
            Self::Speicher(_)
                | Self::SchluesselNichtVerfuegbar(_)
                | Self::KeinGruppenSchluessel(_)
                | Self::Verzeichnis(_)
                | Self::Transport(_)
        )
    }
}

impl From<std::io::Error> for E2eeError {
    fn from(e: std::io::Error) -> Self {
        Self::Speicher(e.to_string())
    }
}

impl From<reqwest::Error> for E2eeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Verzeichnis(e.to_string())
    }
}
