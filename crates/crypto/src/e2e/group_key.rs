//! Gruppen-Schluessel und Key-Wrapping
//!
//! Jeder Server hat genau einen symmetrischen Schluessel (AES-256-GCM).
//! Fuer die Verteilung wird er fuer einen Empfaenger eingewickelt:
//! 1. Statisches ECDH(eigener privater, fremder oeffentlicher Schluessel)
//! 2. HKDF mit Wrap-Salt/-Info -> Wrapping Key
//! 3. AES-256-GCM mit frischem IV
//!
//! Der Empfaenger rechnet dasselbe mit vertauschten Rollen nach. Der
//! Wrapping Key selbst wird nie uebertragen.
//!
//! ## Format
//! ```text
//! base64( [iv(12)] [wrapped_key(32) + auth_tag(16)] )
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::e2e::decrypt::decrypt_aes256gcm;
use crate::e2e::encrypt::encrypt_aes256gcm;
use crate::e2e::key_exchange::{derive_shared_key, WRAP_INFO, WRAP_SALT};
use crate::error::{CryptoError, CryptoResult};
use crate::identity::{IdentityKeyPair, PublicKey};
use crate::types::SymmetricKey;

/// Erstellt einen neuen Gruppen-Schluessel fuer einen Server
pub fn create_group_key() -> SymmetricKey {
    SymmetricKey::generate()
}

/// Wickelt `key` fuer `recipient_public` ein (wrap)
pub fn wrap_key_for_recipient(
    key: &SymmetricKey,
    recipient_public: &PublicKey,
    own_identity: &IdentityKeyPair,
) -> CryptoResult<String> {
    let wrapping_key = derive_shared_key(own_identity, recipient_public, WRAP_SALT, WRAP_INFO)?;
    let sealed = encrypt_aes256gcm(key.as_bytes(), wrapping_key.as_bytes())?;
    Ok(STANDARD.encode(sealed))
}

/// Wickelt einen von `sender_public` eingewickelten Schluessel aus (unwrap)
///
/// Jeder Fehlschlag (kaputter Umschlag, falscher Absender, Manipulation)
/// wird zu [`CryptoError::Unwrap`].
pub fn unwrap_key_from_sender(
    envelope: &str,
    sender_public: &PublicKey,
    own_identity: &IdentityKeyPair,
) -> CryptoResult<SymmetricKey> {
    let data = STANDARD
        .decode(envelope.trim())
        .map_err(|e| CryptoError::Unwrap(format!("kein base64: {e}")))?;

    let wrapping_key = derive_shared_key(own_identity, sender_public, WRAP_SALT, WRAP_INFO)
        .map_err(|e| CryptoError::Unwrap(e.to_string()))?;

    let raw = decrypt_aes256gcm(&data, wrapping_key.as_bytes())
        .map_err(|e| CryptoError::Unwrap(e.to_string()))?;

    SymmetricKey::from_bytes(&raw).map_err(|e| CryptoError::Unwrap(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
