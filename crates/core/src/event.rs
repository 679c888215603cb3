//! Echtzeit-Events fuer die Verteilung von Gruppen-Schluesseln
//!
//! Die Events laufen ueber den (externen) Echtzeit-Transport. Zustellung ist
//! hoechstens einmal, ohne Reihenfolge-Garantie. Der Tag-Name jedes Events
//! entspricht dem Namen auf dem Draht (`request_server_key`, ...).

use serde::{Deserialize, Serialize};

use crate::types::{ServerId, UserId};

/// Alle Schluessel-Events (ausgehend und eingehend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum KeyEvent {
    // --- ausgehend ---
    /// Broadcast: dieses Geraet braucht den Gruppen-Schluessel des Servers
    #[serde(rename_all = "camelCase")]
    RequestServerKey { server_id: ServerId },

    /// Unicast: eingewickelter Schluessel fuer genau einen Anfragenden
    #[serde(rename_all = "camelCase")]
    ShareServerKey {
        server_id: ServerId,
        /// Empfaenger (der Anfragende)
        user_id: UserId,
        encrypted_key: String,
    },

    // --- eingehend ---
    /// Ein anderes Mitglied hat uns den Schluessel eingewickelt
    #[serde(rename_all = "camelCase")]
    ServerKeyShared {
        server_id: ServerId,
        encrypted_key: String,
        sender_id: UserId,
    },

    /// Ein anderes Mitglied fragt nach dem Schluessel
    #[serde(rename_all = "camelCase")]
    ServerKeyRequested { server_id: ServerId, user_id: UserId },

    /// Neues Mitglied im Server
    #[serde(rename_all = "camelCase")]
    MemberJoined { server_id: ServerId, user_id: UserId },
}

impl KeyEvent {
    /// Server auf den sich das Event bezieht
    pub fn server_id(&self) -> ServerId {
        match self {
            Self::RequestServerKey { server_id }
            | Self::ShareServerKey { server_id, .. }
            | Self::ServerKeyShared { server_id, .. }
            | Self::ServerKeyRequested { server_id, .. }
            | Self::MemberJoined { server_id, .. } => *server_id,
        }
    }

    /// Wire-Name des Events
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestServerKey { .. } => "request_server_key",
            Self::ShareServerKey { .. } => "share_server_key",
            Self::ServerKeyShared { .. } => "server_key_shared",
            Self::ServerKeyRequested { .. } => "server_key_requested",
            Self::MemberJoined { .. } => "member_joined",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn event_namen_auf_dem_draht() {
        let sid = ServerId(Uuid::nil());
        let event = KeyEvent::RequestServerKey { server_id: sid };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "request_server_key");
        assert_eq!(json["data"]["serverId"], Uuid::nil().to_string());
        assert_eq!(event.name(), "request_server_key");
    }

    #[test]
    fn share_event_felder_camel_case() {
        let event = KeyEvent::ShareServerKey {
            server_id: ServerId::new(),
            user_id: UserId::new(),
            encrypted_key: "abc".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "share_server_key");
        assert_eq!(json["data"]["encryptedKey"], "abc");
        assert!(json["data"].get("userId").is_some());
    }

    #[test]
    fn eingehendes_event_parsen() {
        let sid = ServerId::new();
        let uid = UserId::new();
        let raw = format!(
            r#"{{"event":"member_joined","data":{{"serverId":"{}","userId":"{}"}}}}"#,
            sid.inner(),
            uid.inner()
        );
        let event: KeyEvent = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            event,
            KeyEvent::MemberJoined {
                server_id: sid,
                user_id: uid
            }
        );
        assert_eq!(event.server_id(), sid);
    }
}
