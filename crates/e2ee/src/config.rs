//! Client-Konfiguration der Schluesselverwaltung
//!
//! Wird aus einer TOML-Datei geladen. Fehlt die Datei, gelten die
//! Standardwerte (lokales Verzeichnis, Verzeichnisdienst auf localhost).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logging::{log_format_gueltig, log_level_gueltig};
use crate::transport::SEND_QUEUE_GROESSE;

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub identitaet: IdentitaetEinstellungen,
    pub verzeichnisdienst: VerzeichnisEinstellungen,
    pub transport: TransportEinstellungen,
    pub logging: LoggingEinstellungen,
}

/// Wo der Identitaets-Slot liegt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitaetEinstellungen {
    /// Verzeichnis fuer `identity.json`
    pub verzeichnis: String,
}

impl Default for IdentitaetEinstellungen {
    fn default() -> Self {
        Self {
            verzeichnis: ".fluester".into(),
        }
    }
}

/// Verzeichnisdienst (REST)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerzeichnisEinstellungen {
    /// Basis-URL, z.B. `http://localhost:9400/`
    pub url: String,
    /// Bearer-Token der Sitzung
    pub token: Option<String>,
}

impl Default for VerzeichnisEinstellungen {
    fn default() -> Self {
        Self {
            url: "http://localhost:9400/".into(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportEinstellungen {
    /// Groesse der ausgehenden Event-Queue
    pub queue_groesse: usize,
}

impl Default for TransportEinstellungen {
    fn default() -> Self {
        Self {
            queue_groesse: SEND_QUEUE_GROESSE,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl LoggingEinstellungen {
    /// Prueft Level und Format
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.level) {
            anyhow::bail!("ungueltiger Log-Level '{}'", self.level);
        }
        if !log_format_gueltig(&self.format) {
            anyhow::bail!("ungueltiges Log-Format '{}'", self.format);
        }
        Ok(())
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: impl AsRef<Path>) -> anyhow::Result<Self> {
        let pfad = pfad.as_ref();
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt).map_err(|e| {
                    anyhow::anyhow!("Konfigurationsfehler in '{}': {e}", pfad.display())
                })?;
                config.logging.pruefen().map_err(|e| {
                    anyhow::anyhow!("Konfigurationsfehler in '{}': {e}", pfad.display())
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = %pfad.display(),
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{}' nicht lesbar: {e}",
                pfad.display()
            )),
        }
    }
}
