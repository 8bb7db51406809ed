//! Fixtures shared by the cross-crate scenarios.

use chrono::NaiveDate;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use certum_core::{DescriptiveRecord, Identity};
use certum_crypto::KeyPair;
use certum_registry::CredentialRegistry;

/// A temporary directory removed on drop.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("{}-{}", prefix, rand::random::<u64>()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        Self(dir)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

/// Deterministic authority key.
pub fn authority_key() -> KeyPair {
    KeyPair::from_seed(&[0x42; 32])
}

/// Registry owned by [`authority_key`].
pub fn open_registry(dir: &TempDir) -> CredentialRegistry {
    CredentialRegistry::open(dir.path(), authority_key().identity()).expect("open registry")
}

/// Identity with every byte set to `byte`.
pub fn identity(byte: u8) -> Identity {
    Identity::from_bytes([byte; 20])
}

/// A completion certificate for `program`.
pub fn certificate(holder_name: &str, program: &str) -> DescriptiveRecord {
    DescriptiveRecord::completion_certificate(
        holder_name,
        program,
        "A",
        NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date"),
        "Example University",
    )
}

/// Serve `documents` (path → body) plus a 404 for everything else on an
/// ephemeral local port.
pub async fn serve_documents(documents: Vec<(&'static str, String)>) -> SocketAddr {
    let mut app = axum::Router::new();
    for (path, body) in documents {
        app = app.route(path, axum::routing::get(move || async move { body }));
    }
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}
