//! Langzeit-Identitaetsschluessel (X25519)
//!
//! Jedes Geraet erzeugt einmalig ein X25519-Schluessel-Paar fuer die
//! Schluesselvereinbarung. Der oeffentliche Schluessel wird im
//! Verzeichnisdienst veroeffentlicht, der private verbleibt lokal.
//!
//! ## Export-Format
//! ```text
//! base64( {"kty":"OKP","crv":"X25519","x":"<base64url(32 Bytes)>"} )
//! ```

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

const JWK_KTY: &str = "OKP";
const JWK_CRV: &str = "X25519";

/// Oeffentlicher X25519-Schluessel eines Benutzers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(X25519PublicKey);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(X25519PublicKey::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

/// Langzeit-Identitaet eines Geraets (X25519)
pub struct IdentityKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl IdentityKeyPair {
    /// Generiert ein neues X25519-Schluessel-Paar
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey(X25519PublicKey::from(&secret));
        Self { secret, public }
    }

    /// Erstellt eine Identity aus einem privaten Schluessel (32 Bytes)
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey(X25519PublicKey::from(&secret));
        Self { secret, public }
    }

    /// Gibt den privaten Schluessel als Bytes zurueck (fuer Persistenz)
    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Transport-sichere Darstellung des eigenen oeffentlichen Schluessels
    pub fn export_public_key(&self) -> String {
        export_public_key(&self.public)
    }

    /// Rohes ECDH-Geheimnis mit einem fremden oeffentlichen Schluessel.
    ///
    /// `ECDH(skA, pkB) == ECDH(skB, pkA)`. Schluessel kleiner Ordnung
    /// (nicht-beitragendes Ergebnis) werden abgelehnt.
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> CryptoResult<SecretBytes> {
        let shared = self.secret.diffie_hellman(&their_public.0);
        if !shared.was_contributory() {
            return Err(CryptoError::SchluesselFormat(
                "Oeffentlicher Schluessel hat kleine Ordnung".to_string(),
            ));
        }
        Ok(SecretBytes::new(shared.as_bytes().to_vec()))
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityKeyPair {{ public_key: {} }}", self.export_public_key())
    }
}

/// JSON-Darstellung eines oeffentlichen Schluessels (JWK-aehnlich)
#[derive(Debug, Serialize, Deserialize)]
struct PublicJwk {
    kty: String,
    crv: String,
    x: String,
}

/// Exportiert einen oeffentlichen Schluessel als `base64(JSON)`
pub fn export_public_key(key: &PublicKey) -> String {
    let jwk = PublicJwk {
        kty: JWK_KTY.to_string(),
        crv: JWK_CRV.to_string(),
        x: URL_SAFE_NO_PAD.encode(key.as_bytes()),
    };
    // Serialisierung eines Structs aus drei Strings kann nicht fehlschlagen
    let json = serde_json::to_vec(&jwk).unwrap_or_default();
    STANDARD.encode(json)
}

/// Importiert einen mit [`export_public_key`] exportierten Schluessel
pub fn import_public_key(encoded: &str) -> CryptoResult<PublicKey> {
    let json = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::SchluesselFormat(format!("kein base64: {e}")))?;
    let jwk: PublicJwk = serde_json::from_slice(&json)
        .map_err(|e| CryptoError::SchluesselFormat(format!("kein Schluessel-JSON: {e}")))?;

    if jwk.kty != JWK_KTY || jwk.crv != JWK_CRV {
        return Err(CryptoError::SchluesselFormat(format!(
            "nicht unterstuetzter Schluesseltyp {}/{}",
            jwk.kty, jwk.crv
        )));
    }

    let raw = URL_SAFE_NO_PAD
        .decode(jwk.x.as_bytes())
        .map_err(|e| CryptoError::SchluesselFormat(format!("Koordinate kein base64url: {e}")))?;
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        CryptoError::SchluesselFormat(format!(
            "Koordinate hat {} statt 32 Bytes",
            raw.len()
        ))
    })?;

    Ok(PublicKey::from_bytes(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
