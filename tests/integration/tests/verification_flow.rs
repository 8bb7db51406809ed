//! Integration test: registry, metadata resolution and verification together.
//!
//! Descriptive records are served over HTTP from a throwaway local server
//! and resolved through the same resolver stack the node builds.

use std::sync::Arc;
use std::time::Duration;

use certum_integration_tests::{
    authority_key, certificate, identity, open_registry, serve_documents, TempDir,
};
use certum_metadata::{ResolutionError, ResolverConfig};
use certum_verifier::{Descriptive, Verifier, VerifierOptions};

fn verifier_for(
    registry: Arc<certum_registry::CredentialRegistry>,
    config: &ResolverConfig,
) -> Verifier {
    Verifier::new(
        registry,
        config.build().expect("resolver stack"),
        VerifierOptions::from(config),
    )
}

#[tokio::test]
async fn test_partial_resolver_failure_keeps_every_entry() {
    let dir = TempDir::new("certum-it-verify");
    let registry = Arc::new(open_registry(&dir));
    let authority = authority_key().identity();
    let holder = identity(0xa1);

    let one = serde_json::to_string(&certificate("Alice", "Cryptography")).unwrap();
    let three = serde_json::to_string(&certificate("Alice", "Compilers")).unwrap();
    let addr = serve_documents(vec![("/1.json", one), ("/3.json", three)]).await;

    for n in 1..=3 {
        registry
            .issue(&authority, &holder, &format!("http://{}/{}.json", addr, n))
            .unwrap();
    }

    let config = ResolverConfig {
        timeout_ms: 2_000,
        ..Default::default()
    };
    let result = verifier_for(registry, &config)
        .verify_holder(&holder)
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(result[0].descriptive.record().unwrap().program, "Cryptography");
    assert!(matches!(
        result[1].descriptive,
        Descriptive::Unavailable(ResolutionError::NotFound(_))
    ));
    assert_eq!(result[2].descriptive.record().unwrap().program, "Compilers");
}

#[tokio::test]
async fn test_revoke_then_verify_reports_revocation_regardless_of_metadata() {
    let dir = TempDir::new("certum-it-verify");
    let registry = Arc::new(open_registry(&dir));
    let authority = authority_key().identity();
    let holder = identity(0xb2);

    let doc = serde_json::to_string(&certificate("Bob", "Databases")).unwrap();
    let addr = serve_documents(vec![("/ok.json", doc)]).await;

    let resolvable = registry
        .issue(&authority, &holder, &format!("http://{}/ok.json", addr))
        .unwrap();
    let unresolvable = registry
        .issue(&authority, &holder, "gopher://nowhere/1.json")
        .unwrap();
    registry.revoke(&authority, resolvable).unwrap();
    registry.revoke(&authority, unresolvable).unwrap();

    let verifier = verifier_for(registry, &ResolverConfig::default());
    let result = verifier.verify_holder(&holder).await.unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|c| c.revoked && c.revoked_at.is_some()));
    assert!(result[0].descriptive.is_available());
    assert!(matches!(
        result[1].descriptive,
        Descriptive::Unavailable(ResolutionError::Unreachable(_))
    ));

    let single = verifier.verify_credential(resolvable).await.unwrap();
    assert!(single.revoked);
    assert_eq!(single.descriptive.record().unwrap().holder_display_name, "Bob");
}

#[tokio::test]
async fn test_file_references_and_cache() {
    let dir = TempDir::new("certum-it-verify");
    let registry = Arc::new(open_registry(&dir));
    let authority = authority_key().identity();
    let holder = identity(0xc3);

    let doc_path = dir.path().join("metadata-1.json");
    std::fs::write(
        &doc_path,
        serde_json::to_vec(&certificate("Carol", "Networks")).unwrap(),
    )
    .unwrap();
    let reference = format!("file://{}", doc_path.display());
    registry.issue(&authority, &holder, &reference).unwrap();

    let config = ResolverConfig {
        allow_file: true,
        cache_ttl_secs: 60,
        ..Default::default()
    };
    let verifier = verifier_for(registry, &config);

    let first = verifier.verify_holder(&holder).await.unwrap();
    assert_eq!(first[0].descriptive.record().unwrap().program, "Networks");

    // A cached resolution survives the document disappearing.
    std::fs::remove_file(&doc_path).unwrap();
    let second = verifier.verify_holder(&holder).await.unwrap();
    assert_eq!(second[0].descriptive, first[0].descriptive);
}

#[tokio::test]
async fn test_cancellation_discards_partial_work() {
    let dir = TempDir::new("certum-it-verify");
    let registry = Arc::new(open_registry(&dir));
    let authority = authority_key().identity();
    let holder = identity(0xd4);

    // A listener that accepts connections but never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    for n in 0..4 {
        registry
            .issue(&authority, &holder, &format!("http://{}/{}.json", addr, n))
            .unwrap();
    }

    let verifier = verifier_for(registry, &ResolverConfig::default());
    let result = verifier
        .verify_holder_until(&holder, tokio::time::sleep(Duration::from_millis(100)))
        .await;
    assert!(matches!(result, Err(certum_verifier::VerifyError::Cancelled)));
}
