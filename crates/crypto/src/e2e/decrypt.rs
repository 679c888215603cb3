//! Nachrichten-Entschluesselung
//!
//! [`decrypt`] liefert Fehler, [`decrypt_message`] nie: sie ist der
//! Einstiegspunkt fuer die Anzeige und wandelt jeden Fehlschlag in einen
//! festen Platzhalter-Text um.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{SymmetricKey, EPOCH_LEGACY, IV_LEN, KEY_LEN, TAG_LEN};

/// Platzhalter fuer kaputte Legacy-Nachrichten
pub const UNREADABLE_MESSAGE: &str = "[unreadable message]";
/// Platzhalter wenn der Schluessel (noch) fehlt
pub const KEY_UNAVAILABLE: &str = "[encrypted message - key unavailable]";
/// Platzhalter wenn die Authentifizierung fehlschlaegt
pub const DECRYPTION_FAILED: &str = "[encrypted message - decryption failed]";

/// Entschluesselt `base64(iv || ciphertext)` zu UTF-8-Klartext
pub fn decrypt(envelope: &str, key: &SymmetricKey) -> CryptoResult<String> {
    let data = STANDARD
        .decode(envelope.trim())
        .map_err(|e| CryptoError::Entschluesselung(format!("kein base64: {e}")))?;
    let plaintext = decrypt_aes256gcm(&data, key.as_bytes())?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Entschluesselung("Klartext ist kein UTF-8".to_string()))
}

/// Dispatch nach Epoch, wirft nie
///
/// - Epoch 0: base64 von UTF-8-Klartext, kein Schluessel noetig
/// - Epoch >= 1 ohne Schluessel: [`KEY_UNAVAILABLE`]
/// - Epoch >= 1 mit Schluessel: [`decrypt`], bei Fehler [`DECRYPTION_FAILED`]
pub fn decrypt_message(envelope: &str, key: Option<&SymmetricKey>, epoch: u32) -> String {
    if epoch == EPOCH_LEGACY {
        return STANDARD
            .decode(envelope.trim())
            .ok()
            .and_then(|raw| String::from_utf8(raw).ok())
            .unwrap_or_else(|| UNREADABLE_MESSAGE.to_string());
    }

    let Some(key) = key else {
        return KEY_UNAVAILABLE.to_string();
    };

    match decrypt(envelope, key) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            tracing::debug!(epoch, fehler = %e, "Nachricht nicht entschluesselbar");
            DECRYPTION_FAILED.to_string()
        }
    }
}

/// Oeffnet `iv || ciphertext || tag` mit AES-256-GCM
pub(crate) fn decrypt_aes256gcm(data: &[u8], key_bytes: &[u8]) -> CryptoResult<Vec<u8>> {
    if key_bytes.len() != KEY_LEN {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: KEY_LEN,
            erhalten: key_bytes.len(),
        });
    }
    if data.len() < IV_LEN + TAG_LEN {
        return Err(CryptoError::Entschluesselung(format!(
            "Umschlag zu kurz: {} Bytes",
            data.len()
        )));
    }

    let (iv, ciphertext) = data.split_at(IV_LEN);
    let key = Key::<Aes256Gcm>::from_slice(key_bytes);
    let cipher = Aes256Gcm::new(key);
    let nonce = AesNonce::from_slice(iv);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
