//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `FLUESTER_LOG_LEVEL`: Log-Level oder Filter-Direktive, Standard: info
//! - `FLUESTER_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingEinstellungen;

pub const ENV_LOG_LEVEL: &str = "FLUESTER_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "FLUESTER_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// Ein bereits installierter globaler Subscriber bleibt bestehen
/// (z.B. wenn die einbettende Anwendung eigenes Logging hat).
pub fn logging_initialisieren(einstellungen: &LoggingEinstellungen) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(&einstellungen.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| einstellungen.format.clone());

    let ergebnis = match format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        _ => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    if ergebnis.is_err() {
        tracing::debug!("Logging bereits initialisiert");
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
