//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Oeffentlicher Schluessel nicht im erwarteten Export-Format (KeyFormatError)
    #[error("Ungueltiges Schluessel-Format: {0}")]
    SchluesselFormat(String),

    /// Eingewickelter Schluessel liess sich nicht auswickeln (UnwrapError)
    #[error("Schluessel-Unwrap fehlgeschlagen: {0}")]
    Unwrap(String),

    /// Nachricht liess sich nicht entschluesseln (DecryptError)
    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
