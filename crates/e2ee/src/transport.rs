//! Echtzeit-Transport fuer Schluessel-Events
//!
//! Fire-and-forget: `senden` blockiert nie und gibt keine Zustellgarantie.
//! Ein gesendetes Event kann nicht zurueckgenommen werden.

use tokio::sync::mpsc;

use fluester_core::KeyEvent;

use crate::error::{E2eeError, E2eeResult};

/// Standard-Groesse der ausgehenden Queue
pub const SEND_QUEUE_GROESSE: usize = 64;

/// Ausgehende Seite des Echtzeit-Transports
pub trait EventTransport: Send + Sync {
    /// Reiht ein Event zum Versand ein
    fn senden(&self, event: KeyEvent) -> E2eeResult<()>;
}

/// Transport ueber eine begrenzte tokio-mpsc-Queue
///
/// Die Gegenseite (Socket-Task, Test-Relay, ...) liest aus dem Receiver.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<KeyEvent>,
}

impl ChannelTransport {
    /// Erstellt Transport und zugehoerigen Receiver
    pub fn neu(queue_groesse: usize) -> (Self, mpsc::Receiver<KeyEvent>) {
        let (tx, rx) = mpsc::channel(queue_groesse.max(1));
        (Self { tx }, rx)
    }
}

impl EventTransport for ChannelTransport {
    fn senden(&self, event: KeyEvent) -> E2eeResult<()> {
        let name = event.name();
        match self.tx.try_send(event) {
            Ok(()) => {
                tracing::trace!(event = name, "Event eingereiht");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(event = name, "Send-Queue voll – Event verworfen");
                Err(E2eeError::Transport("Send-Queue voll".into()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(event = name, "Send-Queue geschlossen");
                Err(E2eeError::Transport("Transport geschlossen".into()))
            }
        }
    }
}
