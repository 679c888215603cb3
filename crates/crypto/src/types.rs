//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Laenge symmetrischer Schluessel (AES-256-GCM)
pub const KEY_LEN: usize = 32;
/// Laenge des IV-Praefix jedes Umschlags
pub const IV_LEN: usize = 12;
/// Laenge des angehaengten GCM-Auth-Tags
pub const TAG_LEN: usize = 16;

/// Epoch fuer Legacy-Klartext (base64 von UTF-8, keine Kryptografie)
pub const EPOCH_LEGACY: u32 = 0;
/// Epoch fuer neu verschluesselte Nachrichten
pub const EPOCH_AKTUELL: u32 = 1;

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(pub Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 256-Bit Schluessel fuer AES-256-GCM
///
/// Gruppen-Schluessel, DM-Schluessel und Wrapping-Schluessel haben alle
/// diese Form. Die Laenge ist bei der Konstruktion geprueft.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: SecretBytes,
}

impl SymmetricKey {
    /// Erzeugt einen frischen Zufallsschluessel aus dem OS-RNG
    pub fn generate() -> Self {
        let mut key_bytes = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key_bytes);
        Self {
            bytes: SecretBytes::new(key_bytes),
        }
    }

    /// Importiert rohe Schluessel-Bytes (genau 32)
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: KEY_LEN,
                erhalten: bytes.len(),
            });
        }
        Ok(Self {
            bytes: SecretBytes::new(bytes.to_vec()),
        })
    }

    /// Rohe Schluessel-Bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// Verschluesselte Nachricht wie sie gespeichert und uebertragen wird
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    /// Epoch 0: base64(UTF-8), Epoch >= 1: base64(iv || ciphertext)
    pub content: String,
    pub epoch: u32,
}
