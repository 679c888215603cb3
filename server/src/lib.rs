//! fluester-server – Referenz-Verzeichnisdienst fuer Schluessel
//!
//! Speichert oeffentliche Identitaets-Schluessel und eingewickelte
//! Gruppen-Schluessel im Speicher und liefert sie per REST aus. Der Dienst
//! sieht nie Klartext-Schluessel.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use config::ServerConfig;
use state::{uuid_token_validator, AppState, TokenValidatorFn};

/// Haelt Konfiguration und Zustand des Dienstes zusammen
pub struct Server {
    pub config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Erstellt einen Server mit dem Entwicklungs-Token-Validator (Token = Benutzer-UUID)
    pub fn neu(config: ServerConfig) -> Self {
        Self::mit_validator(config, uuid_token_validator())
    }

    pub fn mit_validator(config: ServerConfig, token_validator: TokenValidatorFn) -> Self {
        Self {
            config,
            state: AppState::neu(token_validator),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router inklusive CORS-Konfiguration
    pub fn router(&self) -> axum::Router {
        let cors = if self.config.netzwerk.cors_origins.is_empty() {
            CorsLayer::permissive()
        } else {
            let origins: Vec<HeaderValue> = self
                .config
                .netzwerk
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
                .allow_headers(tower_http::cors::Any)
        };

        routes::router(self.state.clone()).layer(cors)
    }

    /// Bindet die konfigurierte Adresse und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_adresse()).await?;
        self.bedienen(listener).await
    }

    /// Bedient Anfragen auf einem bereits gebundenen Listener bis Ctrl-C
    pub async fn bedienen(self, listener: TcpListener) -> Result<()> {
        tracing::info!(
            name = %self.config.server.name,
            adresse = %listener.local_addr()?,
            "Verzeichnisdienst gestartet"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                }
            })
            .await?;
        Ok(())
    }
}
