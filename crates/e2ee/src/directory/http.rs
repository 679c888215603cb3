//! HTTP-Client fuer den Verzeichnisdienst (reqwest)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use url::Url;

use fluester_core::directory::pfade;
use fluester_core::{EncryptedKeyRecord, PublicKeyBody, PublicKeyResponse, ServerId, UserId};

use super::KeyDirectory;
use crate::config::VerzeichnisEinstellungen;
use crate::error::{E2eeError, E2eeResult};

/// REST-Client fuer den Verzeichnisdienst
///
/// Authentifiziert sich per Bearer-Token; der Dienst leitet daraus "me" ab.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    basis: Url,
    client: Client,
}

impl HttpDirectory {
    pub fn neu(basis: &Url, token: Option<&str>) -> E2eeResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let wert = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| E2eeError::Verzeichnis(format!("ungueltiges Token: {e}")))?;
            default_headers.insert(AUTHORIZATION, wert);
        }
        let client = Client::builder().default_headers(default_headers).build()?;

        // Basis muss auf '/' enden, sonst ersetzt `join` das letzte Pfadsegment
        let mut basis = basis.clone();
        if !basis.path().ends_with('/') {
            let pfad = format!("{}/", basis.path());
            basis.set_path(&pfad);
        }

        Ok(Self { basis, client })
    }

    pub fn aus_config(config: &VerzeichnisEinstellungen) -> E2eeResult<Self> {
        let basis = Url::parse(&config.url)
            .map_err(|e| E2eeError::Verzeichnis(format!("ungueltige URL '{}': {e}", config.url)))?;
        Self::neu(&basis, config.token.as_deref())
    }

    fn url(&self, pfad: &str) -> E2eeResult<Url> {
        self.basis
            .join(pfad.trim_start_matches('/'))
            .map_err(|e| E2eeError::Verzeichnis(e.to_string()))
    }

    async fn put_json<T: serde::Serialize + ?Sized>(&self, pfad: &str, body: &T) -> E2eeResult<()> {
        let response = self.client.put(self.url(pfad)?).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(http_fehler(status, response.text().await.unwrap_or_default()))
    }
}

fn http_fehler(status: StatusCode, text: String) -> E2eeError {
    E2eeError::Verzeichnis(format!("HTTP {status}: {text}"))
}

#[async_trait]
impl KeyDirectory for HttpDirectory {
    async fn publish_public_key(&self, public_key: &str) -> E2eeResult<()> {
        let body = PublicKeyBody {
            public_key: public_key.to_string(),
        };
        self.put_json(pfade::EIGENER_PUBLIC_KEY, &body).await
    }

    async fn fetch_public_key(&self, user_id: UserId) -> E2eeResult<Option<String>> {
        let response = self
            .client
            .get(self.url(&pfade::public_key_von(user_id))?)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(response.json::<PublicKeyResponse>().await?.public_key),
            s => Err(http_fehler(s, response.text().await.unwrap_or_default())),
        }
    }

    async fn store_own_server_key(
        &self,
        server_id: ServerId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()> {
        self.put_json(&pfade::server_keys(server_id), record).await
    }

    async fn fetch_own_server_key(
        &self,
        server_id: ServerId,
    ) -> E2eeResult<Option<EncryptedKeyRecord>> {
        let response = self
            .client
            .get(self.url(&pfade::eigener_server_key(server_id))?)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(response.json::<Option<EncryptedKeyRecord>>().await?),
            s => Err(http_fehler(s, response.text().await.unwrap_or_default())),
        }
    }

    async fn store_server_key_for(
        &self,
        server_id: ServerId,
        recipient: UserId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()> {
        self.put_json(&pfade::server_key_fuer(server_id, recipient), record)
            .await
    }
}
