//! Nachrichten-Verschluesselung (AES-256-GCM)
//!
//! ## Format
//! ```text
//! base64( [iv(12)] [ciphertext + auth_tag(16)] )
//! ```
//!
//! Jeder Aufruf zieht einen frischen Zufalls-IV aus dem OS-RNG. Es gibt
//! keinen Zaehler und keinen geteilten Zustand, parallele Aufrufe koennen
//! denselben IV daher nur mit vernachlaessigbarer Wahrscheinlichkeit erzeugen.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{EncryptedMessage, SymmetricKey, EPOCH_AKTUELL, IV_LEN, KEY_LEN};

/// Verschluesselt einen Klartext, Ergebnis ist `base64(iv || ciphertext)`
pub fn encrypt(plaintext: &str, key: &SymmetricKey) -> CryptoResult<String> {
    let sealed = encrypt_aes256gcm(plaintext.as_bytes(), key.as_bytes())?;
    Ok(STANDARD.encode(sealed))
}

/// Verschluesselt einen Klartext und markiert ihn mit der aktuellen Epoch
pub fn encrypt_message(plaintext: &str, key: &SymmetricKey) -> CryptoResult<EncryptedMessage> {
    Ok(EncryptedMessage {
        content: encrypt(plaintext, key)?,
        epoch: EPOCH_AKTUELL,
    })
}

/// AES-256-GCM mit frischem IV, Ausgabe `iv || ciphertext || tag`
pub(crate) fn encrypt_aes256gcm(plaintext: &[u8], key_bytes: &[u8]) -> CryptoResult<Vec<u8>> {
    if key_bytes.len() != KEY_LEN {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: KEY_LEN,
            erhalten: key_bytes.len(),
        });
    }

    let key = Key::<Aes256Gcm>::from_slice(key_bytes);
    let cipher = Aes256Gcm::new(key);

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let nonce = AesNonce::from_slice(&iv);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
