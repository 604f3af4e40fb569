use crate::auth::password::CredentialService;
use crate::auth::token::TokenService;
use crate::db::models::User;
use crate::db::store::{InsertOutcome, UserStore};
use crate::error::{AppError, AuthError};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// False when the user was accepted but the store write failed.
    pub persisted: bool,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    credentials: CredentialService,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, credentials: CredentialService, tokens: TokenService) -> Self {
        Self {
            store,
            credentials,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> Result<Registration, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields.into());
        }

        // Checked before hashing so duplicates don't pay for bcrypt
        let users = self.store.load().await;
        if users.contains_key(username) {
            return Err(AuthError::UserExists.into());
        }

        let digest = self.credentials.hash(password).await?;
        let user = User::new(username.to_string(), email, digest);

        match self.store.insert_user(user).await {
            InsertOutcome::Inserted { persisted } => {
                if !persisted {
                    warn!("User {} registered but not persisted", username);
                }
                Ok(Registration { persisted })
            }
            InsertOutcome::AlreadyExists => Err(AuthError::UserExists.into()),
        }
    }

    /// Verify credentials and issue a session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields.into());
        }

        let users = self.store.load().await;
        let user = users.get(username).ok_or(AuthError::InvalidUser)?;

        if !self.credentials.verify(password, &user.password).await? {
            return Err(AuthError::WrongPassword.into());
        }

        info!("Issuing session token for {}", username);
        self.tokens.issue(username)
    }

    /// Resolve the username carried by a session token.
    pub fn identify(&self, token: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NoToken);
        }
        self.tokens.verify(token).map(|claims| claims.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UserMap;
    use crate::db::store::{MemoryStore, MockUserStore};

    fn service_with(store: Arc<dyn UserStore>) -> AuthService {
        AuthService::new(store, CredentialService::new(4), TokenService::new("test_secret", 7))
    }

    #[actix_rt::test]
    async fn test_register_login_identify() {
        let service = service_with(Arc::new(MemoryStore::new()));

        let registration = service.register("bob", "pw123", None).await.unwrap();
        assert!(registration.persisted);

        let token = service.login("bob", "pw123").await.unwrap();
        assert_eq!(service.identify(&token).unwrap(), "bob");
    }

    #[actix_rt::test]
    async fn test_password_is_stored_hashed() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone());

        service.register("bob", "pw123", Some("bob@example.com".into())).await.unwrap();

        let users = store.load().await;
        let bob = &users["bob"];
        assert_ne!(bob.password, "pw123");
        assert!(bob.password.starts_with("$2"));
        assert_eq!(bob.email.as_deref(), Some("bob@example.com"));
    }

    #[actix_rt::test]
    async fn test_missing_fields() {
        let service = service_with(Arc::new(MemoryStore::new()));

        for (username, password) in [("", "pw"), ("bob", ""), ("", "")] {
            let err = service.register(username, password, None).await.unwrap_err();
            assert!(matches!(err, AppError::AuthError(AuthError::MissingFields)));

            let err = service.login(username, password).await.unwrap_err();
            assert!(matches!(err, AppError::AuthError(AuthError::MissingFields)));
        }
    }

    #[actix_rt::test]
    async fn test_login_failures() {
        let service = service_with(Arc::new(MemoryStore::new()));
        service.register("bob", "pw123", None).await.unwrap();

        let err = service.login("nobody", "pw123").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::InvalidUser)));

        let err = service.login("bob", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::WrongPassword)));
    }

    #[actix_rt::test]
    async fn test_existing_user_short_circuits_before_insert() {
        let mut store = MockUserStore::new();
        store.expect_load().returning(|| {
            let mut users = UserMap::new();
            users.insert("bob".to_string(), User::new("bob".into(), None, "h".into()));
            users
        });
        store.expect_insert_user().never();

        let service = service_with(Arc::new(store));
        let err = service.register("bob", "pw123", None).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::UserExists)));
    }

    #[actix_rt::test]
    async fn test_lost_race_reports_user_exists() {
        let mut store = MockUserStore::new();
        store.expect_load().returning(UserMap::new);
        store
            .expect_insert_user()
            .times(1)
            .returning(|_| InsertOutcome::AlreadyExists);

        let service = service_with(Arc::new(store));
        let err = service.register("bob", "pw123", None).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::UserExists)));
    }

    #[actix_rt::test]
    async fn test_unpersisted_registration_is_reported() {
        let mut store = MockUserStore::new();
        store.expect_load().returning(UserMap::new);
        store
            .expect_insert_user()
            .withf(|user| user.username == "bob")
            .returning(|_| InsertOutcome::Inserted { persisted: false });

        let service = service_with(Arc::new(store));
        let registration = service.register("bob", "pw123", None).await.unwrap();
        assert!(!registration.persisted);
    }

    #[test]
    fn test_identify_empty_token() {
        let service = service_with(Arc::new(MemoryStore::new()));
        assert_eq!(service.identify(""), Err(AuthError::NoToken));
        assert_eq!(service.identify("garbage"), Err(AuthError::InvalidToken));
    }
}
