use std::time::Duration;

use backend_lib::auth::PasswordHasher;
use backend_lib::error::AppError;

fn hasher() -> PasswordHasher {
    PasswordHasher::new(4, Duration::from_secs(10)).unwrap()
}

#[tokio::test]
async fn test_hash_and_verify() {
    let hasher = hasher();
    let hash = hasher.hash("secret123").await.unwrap();

    assert_ne!(hash, "secret123");
    assert!(hash.starts_with("$scrypt$"));
    assert!(hasher.verify("secret123", &hash).await.unwrap());
    assert!(!hasher.verify("wrongpw", &hash).await.unwrap());
}

#[tokio::test]
async fn test_hashes_are_salted() {
    let hasher = hasher();
    let first = hasher.hash("secret123").await.unwrap();
    let second = hasher.hash("secret123").await.unwrap();

    assert_ne!(first, second);
    assert!(hasher.verify("secret123", &first).await.unwrap());
    assert!(hasher.verify("secret123", &second).await.unwrap());
}

#[tokio::test]
async fn test_hash_from_other_cost_still_verifies() {
    let stored = PasswordHasher::new(5, Duration::from_secs(10))
        .unwrap()
        .hash("secret123")
        .await
        .unwrap();

    // Parameters travel with the hash
    assert!(hasher().verify("secret123", &stored).await.unwrap());
}

#[tokio::test]
async fn test_malformed_hash_is_error_not_match() {
    let result = hasher().verify("secret123", "plaintext-in-the-db").await;
    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn test_empty_and_unicode_passwords() {
    let hasher = hasher();
    let hash = hasher.hash("pässwörd✓").await.unwrap();
    assert!(hasher.verify("pässwörd✓", &hash).await.unwrap());
    assert!(!hasher.verify("", &hash).await.unwrap());
}
