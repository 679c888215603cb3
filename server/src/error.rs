//! Fehlertypen des Verzeichnisdienstes

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Authentifizierung fehlgeschlagen: {0}")]
    Authentifizierung(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

impl DirectoryError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Authentifizierung(_) => StatusCode::UNAUTHORIZED,
            Self::UngueltigeEingabe(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        (
            status,
            Json(json!({ "error": { "code": status.as_u16(), "message": self.to_string() } })),
        )
            .into_response()
    }
}
