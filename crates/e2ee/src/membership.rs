//! Lesende Sicht auf Benutzer und Server-Mitgliedschaften
//!
//! Die Schluesselverwaltung fragt hierueber, wer "ich" bin und zu welchen
//! Servern ich gehoere. Die konkrete Quelle (Sitzung, Mitgliederliste)
//! wird beim Erstellen injiziert.

use std::sync::Arc;

use parking_lot::RwLock;

use fluester_core::{ServerId, UserId};

/// Wer bin ich, wo bin ich Mitglied
pub trait Membership: Send + Sync {
    fn current_user_id(&self) -> UserId;

    fn server_ids(&self) -> Vec<ServerId>;
}

/// Einfache Mitgliedschafts-Liste, zur Laufzeit erweiterbar
#[derive(Debug)]
pub struct StaticMembership {
    user_id: UserId,
    servers: RwLock<Vec<ServerId>>,
}

impl StaticMembership {
    pub fn neu(user_id: UserId, servers: Vec<ServerId>) -> Arc<Self> {
        Arc::new(Self {
            user_id,
            servers: RwLock::new(servers),
        })
    }

    /// Fuegt einen Server hinzu (doppelte Eintraege werden ignoriert)
    pub fn server_beitreten(&self, server_id: ServerId) {
        let mut servers = self.servers.write();
        if !servers.contains(&server_id) {
            servers.push(server_id);
        }
    }
}

impl Membership for StaticMembership {
    fn current_user_id(&self) -> UserId {
        self.user_id
    }

    fn server_ids(&self) -> Vec<ServerId> {
        self.servers.read().clone()
    }
}
