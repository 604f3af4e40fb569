use flatfile_auth::{
    auth::{AuthService, CredentialService, TokenService},
    db::{JsonFileStore, UserStore},
    error::{AppError, AuthError},
};
use std::sync::Arc;
use tempfile::TempDir;

fn file_service(dir: &TempDir) -> (AuthService, Arc<JsonFileStore>) {
    let store = Arc::new(JsonFileStore::new(dir.path().join("users.json")));
    let service = AuthService::new(
        store.clone(),
        CredentialService::new(4),
        TokenService::new("test_secret", 7),
    );
    (service, store)
}

#[actix_rt::test]
async fn test_auth_flow() {
    let dir = TempDir::new().unwrap();
    let (auth_service, _) = file_service(&dir);

    auth_service.register("alice", "password123", Some("alice@example.com".into())).await.unwrap();
    let token = auth_service.login("alice", "password123").await.unwrap();

    assert_eq!(auth_service.identify(&token).unwrap(), "alice");
}

#[actix_rt::test]
async fn test_registrations_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let (auth_service, _) = file_service(&dir);
        auth_service.register("alice", "a-pass", None).await.unwrap();
        auth_service.register("bob", "b-pass", None).await.unwrap();
    }

    // a fresh service over the same file sees both users
    let (auth_service, store) = file_service(&dir);
    assert_eq!(store.load().await.len(), 2);
    assert!(auth_service.login("alice", "a-pass").await.is_ok());
    assert!(auth_service.login("bob", "b-pass").await.is_ok());
}

#[actix_rt::test]
async fn test_token_from_other_service_rejected() {
    let dir = TempDir::new().unwrap();
    let (auth_service, _) = file_service(&dir);

    let foreign = TokenService::new("different_secret", 7).issue("alice").unwrap();
    assert_eq!(auth_service.identify(&foreign), Err(AuthError::InvalidToken));
}

#[actix_rt::test]
async fn test_invalid_token() {
    let dir = TempDir::new().unwrap();
    let (auth_service, _) = file_service(&dir);

    match auth_service.identify("invalid_token") {
        Err(AuthError::InvalidToken) => (),
        other => panic!("Expected invalid token error, got {:?}", other),
    }
}

#[actix_rt::test]
async fn test_duplicate_user() {
    let dir = TempDir::new().unwrap();
    let (auth_service, store) = file_service(&dir);

    auth_service.register("alice", "first", None).await.unwrap();
    match auth_service.register("alice", "second", None).await {
        Err(AppError::AuthError(AuthError::UserExists)) => (),
        other => panic!("Expected user exists error, got {:?}", other),
    }

    assert_eq!(store.load().await.len(), 1);
    assert!(auth_service.login("alice", "first").await.is_ok());
}
