//! The authentication core wired over a real flat-file store.

use std::sync::Arc;
use std::time::Duration;

use backend_lib::auth::{
    AuthResult, AuthService, DefaultAuth, LoginLockout, PasswordHasher, Registration, RejectReason,
    SessionIdentity, SessionManager,
};
use backend_lib::error::AppError;
use backend_lib::scope::ParishScope;
use backend_lib::storage::{FlatFileStorage, Storage};
use parish_common::StudentDetails;
use tempfile::TempDir;

struct Fixture {
    storage: Arc<dyn Storage>,
    auth: Arc<dyn AuthService>,
    _dir: TempDir,
}

fn fixture(lockout: Option<LoginLockout>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let storage: Arc<dyn Storage> = Arc::new(FlatFileStorage::new(dir.path()).unwrap());
    let hasher = PasswordHasher::new(4, Duration::from_secs(10)).unwrap();
    let auth: Arc<dyn AuthService> =
        Arc::new(DefaultAuth::new(storage.clone(), hasher).with_lockout(lockout));
    Fixture {
        storage,
        auth,
        _dir: dir,
    }
}

fn details(name: &str) -> StudentDetails {
    StudentDetails {
        name: name.to_string(),
        surname: "Lopez".to_string(),
        ..StudentDetails::default()
    }
}

#[tokio::test]
async fn test_register_login_and_scoped_listing() {
    let fx = fixture(None);
    let identity = SessionIdentity::new(SessionManager::default(), fx.auth.clone());

    let Registration::Created(alice) = fx.auth.register("alice", "secret123").await.unwrap() else {
        panic!("alice should be created");
    };
    let Registration::Created(carol) = fx.auth.register("carol", "secret456").await.unwrap() else {
        panic!("carol should be created");
    };

    // Good password
    let AuthResult::Accepted(principal) = fx.auth.authenticate("alice", "secret123").await.unwrap() else {
        panic!("alice should be accepted");
    };
    assert_eq!(principal, alice);
    let token = identity.establish(None, &principal).await;
    assert!(identity.is_authenticated(Some(&token)).await.unwrap());

    // Bad password leaves an anonymous session anonymous
    let anon = identity.sessions().push_flash(None, "hello").await;
    assert_eq!(
        fx.auth.authenticate("alice", "wrongpw").await.unwrap(),
        AuthResult::Rejected(RejectReason::BadPassword)
    );
    assert!(!identity.is_authenticated(Some(&anon)).await.unwrap());

    assert_eq!(
        fx.auth.authenticate("bob", "anything").await.unwrap(),
        AuthResult::Rejected(RejectReason::NotFound)
    );

    let alice_scope = ParishScope::for_principal(&alice, fx.storage.clone());
    let carol_scope = ParishScope::for_principal(&carol, fx.storage.clone());
    alice_scope.create(details("Ana")).await.unwrap();
    alice_scope.create(details("Ben")).await.unwrap();
    carol_scope.create(details("Cleo")).await.unwrap();

    let listed = alice_scope.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|s| s.tenant_id == "alice"));
}

#[tokio::test]
async fn test_usernames_are_case_sensitive() {
    let fx = fixture(None);
    fx.auth.register("alice", "secret123").await.unwrap();

    assert_eq!(
        fx.auth.authenticate("Alice", "secret123").await.unwrap(),
        AuthResult::Rejected(RejectReason::NotFound)
    );
    assert!(matches!(
        fx.auth.register("Alice", "secret123").await.unwrap(),
        Registration::Created(_)
    ));
}

#[tokio::test]
async fn test_duplicate_registration_keeps_original_password() {
    let fx = fixture(None);
    fx.auth.register("alice", "secret123").await.unwrap();

    assert_eq!(
        fx.auth.register("alice", "other-password").await.unwrap(),
        Registration::AlreadyExists
    );
    assert!(matches!(
        fx.auth.authenticate("alice", "secret123").await.unwrap(),
        AuthResult::Accepted(_)
    ));
}

#[tokio::test]
async fn test_lockout_blocks_after_repeated_failures() {
    let fx = fixture(Some(LoginLockout::new(2, Duration::from_secs(60))));
    fx.auth.register("alice", "secret123").await.unwrap();

    for _ in 0..2 {
        assert!(matches!(
            fx.auth.authenticate("alice", "wrongpw").await.unwrap(),
            AuthResult::Rejected(RejectReason::BadPassword)
        ));
    }

    // Even the right password is refused while locked
    assert!(matches!(
        fx.auth.authenticate("alice", "secret123").await,
        Err(AppError::AuthRateLimited)
    ));
}

#[tokio::test]
async fn test_restore_forgets_deleted_user() {
    let fx = fixture(None);
    let sessions = SessionManager::default();
    let identity = SessionIdentity::new(sessions, fx.auth.clone());

    let Registration::Created(alice) = fx.auth.register("alice", "secret123").await.unwrap() else {
        panic!("alice should be created");
    };
    let payload = SessionIdentity::serialize(&alice);
    assert_eq!(identity.deserialize(&payload).await.unwrap(), Some(alice));

    let mut ghost = payload.clone();
    ghost.username = "nobody".to_string();
    assert_eq!(identity.deserialize(&ghost).await.unwrap(), None);
}
