//! Nachrichten ver- und entschluesseln ueber den KeyManager

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use fluester_core::{DmChannelId, EncryptedKeyRecord, ServerId, UserId};
use fluester_crypto::{
    EncryptedMessage, DECRYPTION_FAILED, EPOCH_AKTUELL, EPOCH_LEGACY, KEY_UNAVAILABLE,
};

use super::netz::Netz;
use crate::directory::{KeyDirectory, MemoryDirectory, MemoryDirectoryBackend};
use crate::error::{E2eeError, E2eeResult};
use crate::identity_store::MemoryIdentityStorage;
use crate::manager::KeyManager;
use crate::membership::StaticMembership;
use crate::transport::ChannelTransport;

/// Zaehlt Abrufe oeffentlicher Schluessel
struct ZaehlendesVerzeichnis {
    inner: MemoryDirectory,
    abrufe: AtomicUsize,
}

#[async_trait]
impl KeyDirectory for ZaehlendesVerzeichnis {
    async fn publish_public_key(&self, public_key: &str) -> E2eeResult<()> {
        self.inner.publish_public_key(public_key).await
    }

    async fn fetch_public_key(&self, user_id: UserId) -> E2eeResult<Option<String>> {
        self.abrufe.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_public_key(user_id).await
    }

    async fn store_own_server_key(
        &self,
        server_id: ServerId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()> {
        self.inner.store_own_server_key(server_id, record).await
    }

    async fn fetch_own_server_key(
        &self,
        server_id: ServerId,
    ) -> E2eeResult<Option<EncryptedKeyRecord>> {
        self.inner.fetch_own_server_key(server_id).await
    }

    async fn store_server_key_for(
        &self,
        server_id: ServerId,
        recipient: UserId,
        record: &EncryptedKeyRecord,
    ) -> E2eeResult<()> {
        self.inner.store_server_key_for(server_id, recipient, record).await
    }
}

/// D haelt den Schluessel, C hat ihn per Anfrage erhalten
async fn server_mit_zwei_mitgliedern() -> (Netz, ServerId, usize, usize) {
    let mut netz = Netz::neu();
    let server = ServerId::new();
    let d = netz.geraet(vec![server]);
    netz.manager(d).create_and_store_server_key(server).await.unwrap();
    netz.manager(d).initialize().await.unwrap();
    let c = netz.geraet(vec![server]);
    netz.manager(c).initialize().await.unwrap();
    netz.zustellen().await;
    (netz, server, d, c)
}

#[tokio::test]
async fn kanal_nachricht_zwischen_mitgliedern() {
    let (netz, server, d, c) = server_mit_zwei_mitgliedern().await;

    let nachricht = netz
        .manager(d)
        .encrypt_server_message(server, "hello world")
        .unwrap();
    assert_eq!(nachricht.epoch, EPOCH_AKTUELL);
    assert!(!nachricht.content.contains("hello"));

    assert_eq!(
        netz.manager(c).decrypt_server_message(server, &nachricht),
        "hello world"
    );
}

#[tokio::test]
async fn kanal_nachricht_ohne_schluessel() {
    let (mut netz, server, d, _c) = server_mit_zwei_mitgliedern().await;
    let nachricht = netz
        .manager(d)
        .encrypt_server_message(server, "geheim")
        .unwrap();

    let fremd = netz.geraet(vec![]);
    assert_eq!(
        netz.manager(fremd).decrypt_server_message(server, &nachricht),
        KEY_UNAVAILABLE
    );
    assert!(matches!(
        netz.manager(fremd).encrypt_server_message(server, "x"),
        Err(E2eeError::KeinGruppenSchluessel(s)) if s == server
    ));
}

#[tokio::test]
async fn manipulierte_kanal_nachricht() {
    let (netz, server, d, c) = server_mit_zwei_mitgliedern().await;
    let nachricht = netz
        .manager(d)
        .encrypt_server_message(server, "geheim")
        .unwrap();

    let mut roh = STANDARD.decode(&nachricht.content).unwrap();
    let letztes = roh.len() - 1;
    roh[letztes] ^= 0x01;
    let manipuliert = EncryptedMessage {
        content: STANDARD.encode(&roh),
        epoch: nachricht.epoch,
    };

    assert_eq!(
        netz.manager(c).decrypt_server_message(server, &manipuliert),
        DECRYPTION_FAILED
    );
}

#[tokio::test]
async fn legacy_nachricht_bleibt_lesbar() {
    let (netz, server, _d, c) = server_mit_zwei_mitgliedern().await;
    let legacy = EncryptedMessage {
        content: STANDARD.encode("plain text"),
        epoch: EPOCH_LEGACY,
    };
    assert_eq!(netz.manager(c).decrypt_server_message(server, &legacy), "plain text");
}

#[tokio::test]
async fn dm_zwischen_zwei_geraeten() {
    let mut netz = Netz::neu();
    let a = netz.geraet(vec![]);
    let b = netz.geraet(vec![]);
    netz.manager(a).initialize().await.unwrap();
    netz.manager(b).initialize().await.unwrap();
    let user_a = netz.geraete[a].user_id;
    let user_b = netz.geraete[b].user_id;
    let kanal = DmChannelId::new();

    let nachricht = netz
        .manager(a)
        .encrypt_dm_message(kanal, user_b, "Hallo Bob")
        .await
        .unwrap();
    let klartext = netz
        .manager(b)
        .decrypt_dm_message(kanal, user_a, &nachricht)
        .await;
    assert_eq!(klartext, "Hallo Bob");

    // Beide Seiten haben denselben Schluessel gecacht
    let key_a = netz.manager(a).dm_keys().cached(kanal).unwrap();
    let key_b = netz.manager(b).dm_keys().cached(kanal).unwrap();
    assert_eq!(key_a.as_bytes(), key_b.as_bytes());
}

#[tokio::test]
async fn dm_an_benutzer_ohne_schluessel() {
    let mut netz = Netz::neu();
    let a = netz.geraet(vec![]);
    netz.manager(a).initialize().await.unwrap();
    let niemand = UserId::new();
    let kanal = DmChannelId::new();

    let result = netz.manager(a).encrypt_dm_message(kanal, niemand, "hallo?").await;
    assert!(matches!(result, Err(E2eeError::SchluesselNichtVerfuegbar(u)) if u == niemand));

    let verschluesselt = EncryptedMessage {
        content: STANDARD.encode([0u8; 40]),
        epoch: EPOCH_AKTUELL,
    };
    assert_eq!(
        netz.manager(a).decrypt_dm_message(kanal, niemand, &verschluesselt).await,
        KEY_UNAVAILABLE
    );

    let legacy = EncryptedMessage {
        content: STANDARD.encode("alt"),
        epoch: EPOCH_LEGACY,
    };
    assert_eq!(
        netz.manager(a).decrypt_dm_message(kanal, niemand, &legacy).await,
        "alt"
    );
}

#[tokio::test]
async fn legacy_dm_ohne_schluessel_abruf() {
    let backend = MemoryDirectoryBackend::neu();
    let user_id = UserId::new();
    let verzeichnis = Arc::new(ZaehlendesVerzeichnis {
        inner: backend.fuer_benutzer(user_id),
        abrufe: AtomicUsize::new(0),
    });
    let (transport, _ausgang) = ChannelTransport::neu(4);
    let manager = KeyManager::neu(
        StaticMembership::neu(user_id, vec![]),
        Arc::new(MemoryIdentityStorage::new()),
        verzeichnis.clone(),
        Arc::new(transport),
    );
    manager.initialize().await.unwrap();

    let legacy = EncryptedMessage {
        content: STANDARD.encode("alt"),
        epoch: EPOCH_LEGACY,
    };
    assert_eq!(
        manager
            .decrypt_dm_message(DmChannelId::new(), UserId::new(), &legacy)
            .await,
        "alt"
    );
    assert_eq!(verzeichnis.abrufe.load(Ordering::SeqCst), 0);
}
