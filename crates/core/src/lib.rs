//! fluester-core – Gemeinsame IDs, Events und Wire-Typen
//!
//! Dieses Crate stellt die Bausteine bereit, die Client-Subsystem und
//! Verzeichnisdienst gemeinsam nutzen.

pub mod directory;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use directory::{EncryptedKeyRecord, PublicKeyBody, PublicKeyResponse};
pub use event::KeyEvent;
pub use types::{DmChannelId, ServerId, UserId};
