//! # fluester-crypto
//!
//! Reine Krypto-Primitiven fuer Fluester, ohne Ein-/Ausgabe.
//!
//! ## Module
//! - `identity` - X25519 Langzeit-Identitaet, Export/Import des oeffentlichen Schluessels
//! - `e2e` - Key-Ableitung, Key-Wrapping, Nachrichten-Cipher
//! - `types` - Gemeinsame Typen (SymmetricKey, SecretBytes, EncryptedMessage)
//! - `error` - Fehlertypen

pub mod e2e;
pub mod error;
pub mod identity;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use identity::{export_public_key, import_public_key, IdentityKeyPair, PublicKey};
pub use types::{EncryptedMessage, SecretBytes, SymmetricKey, EPOCH_AKTUELL, EPOCH_LEGACY};

pub use e2e::{
    create_group_key, decrypt, decrypt_message, derive_shared_key, encrypt, encrypt_message,
    hkdf_derive, unwrap_key_from_sender, wrap_key_for_recipient, DECRYPTION_FAILED, DM_INFO,
    KEY_UNAVAILABLE, UNREADABLE_MESSAGE, WRAP_INFO, WRAP_SALT,
};
