//! fluester-e2ee – Schluesselverwaltung fuer Ende-zu-Ende-Verschluesselung
//!
//! Dieses Crate implementiert:
//! - IdentityStore: ein Langzeit-Schluessel-Paar pro Geraet, persistent
//! - DmKeyDeriver: deterministische Schluessel pro DM-Unterhaltung
//! - GroupKeyManager: ein Gruppen-Schluessel pro Server, verteilt per
//!   Anfrage/Teilen ueber den Echtzeit-Kanal und den Verzeichnisdienst
//! - KeyManager: Fassade mit Initialisierung, Event-Verarbeitung und
//!   Nachrichten-Ver-/Entschluesselung
//!
//! # Beispiel
//!
//! ```no_run
//! use fluester_core::{ServerId, UserId};
//! use fluester_e2ee::{ClientConfig, KeyManager, StaticMembership};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::laden("client.toml")?;
//!     fluester_e2ee::logging::logging_initialisieren(&config.logging);
//!
//!     let membership = StaticMembership::neu(UserId::new(), vec![ServerId::new()]);
//!     let (manager, _ausgang) = KeyManager::aus_config(&config, membership)?;
//!     manager.initialize().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod directory;
pub mod dm_key;
pub mod error;
pub mod group_key;
pub mod identity_store;
pub mod logging;
pub mod manager;
pub mod membership;
pub mod transport;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use config::ClientConfig;
pub use directory::{HttpDirectory, KeyDirectory, MemoryDirectory, MemoryDirectoryBackend};
pub use dm_key::DmKeyDeriver;
pub use error::{E2eeError, E2eeResult};
pub use group_key::{GroupKeyManager, KeyState};
pub use identity_store::{FileIdentityStorage, IdentityStorage, IdentityStore, MemoryIdentityStorage};
pub use manager::{EncryptionStatus, KeyManager};
pub use membership::{Membership, StaticMembership};
pub use transport::{ChannelTransport, EventTransport};
