//! E2E Verschluesselung (End-to-End)
//!
//! Client <-> Client Verschluesselung. Der Verzeichnisdienst und der
//! Echtzeit-Transport sehen nur undurchsichtige Umschlaege.
//!
//! ## Ablauf
//! 1. Jedes Geraet hat eine `IdentityKeyPair` (X25519 Langzeit-Key)
//! 2. Gruppen-Schluessel werden per ECDH + HKDF eingewickelt verteilt
//! 3. DM-Schluessel werden aus ECDH + Unterhaltungs-ID abgeleitet
//! 4. Nachrichten werden mit AES-256-GCM verschluesselt

pub mod decrypt;
pub mod encrypt;
pub mod group_key;
pub mod key_exchange;

pub use decrypt::{decrypt, decrypt_message, DECRYPTION_FAILED, KEY_UNAVAILABLE, UNREADABLE_MESSAGE};
pub use encrypt::{encrypt, encrypt_message};
pub use group_key::{create_group_key, unwrap_key_from_sender, wrap_key_for_recipient};
pub use key_exchange::{derive_shared_key, hkdf_derive, DM_INFO, WRAP_INFO, WRAP_SALT};
