//! X25519-Schluesselvereinbarung mit HKDF-Ableitung
//!
//! Aus dem ECDH-Geheimnis zweier Identitaeten wird per HKDF-SHA256 ein
//! symmetrischer Schluessel abgeleitet. Salt und Info sind pro Zweck fest,
//! so dass Wrapping-Schluessel und DM-Schluessel derselben zwei Identitaeten
//! nie gleich sind.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::identity::{IdentityKeyPair, PublicKey};
use crate::types::{SymmetricKey, KEY_LEN};

/// Salt fuer Wrapping-Schluessel
pub const WRAP_SALT: &[u8] = b"fluester-key-wrap-salt-v1";
/// Info fuer Wrapping-Schluessel
pub const WRAP_INFO: &[u8] = b"fluester-key-wrap-v1";
/// Info fuer DM-Schluessel (Salt ist die Unterhaltungs-ID)
pub const DM_INFO: &[u8] = b"fluester-dm-key-v1";

/// Leitet einen symmetrischen Schluessel aus ECDH(my_private, their_public) ab
pub fn derive_shared_key(
    my_identity: &IdentityKeyPair,
    their_public: &PublicKey,
    purpose_salt: &[u8],
    purpose_info: &[u8],
) -> CryptoResult<SymmetricKey> {
    let dh_output = my_identity.diffie_hellman(their_public)?;
    let okm = hkdf_derive(dh_output.as_bytes(), purpose_salt, purpose_info, KEY_LEN)?;
    SymmetricKey::from_bytes(&okm)
}

/// HKDF-basierte Key Derivation (allgemein verwendbar)
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
