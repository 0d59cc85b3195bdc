use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::user::{Credentials, Identity, SessionToken, User};
use crate::errors::{ApplicationError, DomainError, StoreError};
use crate::store::IdentityStore;

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn IdentityStore>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, credentials: Credentials) -> Result<User, ApplicationError> {
        if credentials.is_blank() {
            return Err(DomainError::InvalidInput(
                "username and password must not be blank".to_string(),
            )
            .into());
        }

        let user = self.store.create_user(&credentials).await.map_err(|error| match error {
            StoreError::Conflict(_) => ApplicationError::Conflict(format!(
                "username `{}` is already taken",
                credentials.username
            )),
            other => other.into(),
        })?;

        info!(
            event_name = "commerce.user.registered",
            user_id = %user.id,
            username = %user.username,
            "user registered"
        );
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApplicationError> {
        Ok(self.store.list_users().await?)
    }

    /// Issues a fresh token; the previous token of the user stops resolving.
    pub async fn login(&self, credentials: Credentials) -> Result<SessionToken, ApplicationError> {
        // Exact comparison of stored credentials; hashing is out of scope for this service.
        let Some(user) = self.store.find_by_credentials(&credentials).await? else {
            warn!(
                event_name = "commerce.user.login_rejected",
                username = %credentials.username,
                "login rejected"
            );
            return Err(ApplicationError::InvalidCredentials);
        };

        let token = SessionToken::generate();
        self.store.assign_token(user.id, &token).await?;

        info!(event_name = "commerce.user.logged_in", user_id = %user.id, "session token issued");
        Ok(token)
    }

    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity, ApplicationError> {
        let token = token.map(str::trim).filter(|token| !token.is_empty());
        let Some(token) = token else {
            return Err(ApplicationError::Unauthenticated);
        };

        self.store.resolve_token(token).await?.ok_or(ApplicationError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::IdentityService;
    use crate::domain::user::{Credentials, Identity, SessionToken, User, UserId};
    use crate::errors::{ApplicationError, DomainError, StoreError};
    use crate::store::IdentityStore;

    #[derive(Default)]
    struct CountingStore {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for CountingStore {
        async fn create_user(&self, _credentials: &Credentials) -> Result<User, StoreError> {
            Err(StoreError::Conflict("duplicate".to_string()))
        }

        async fn list_users(&self) -> Result<Vec<User>, StoreError> {
            Ok(Vec::new())
        }

        async fn find_by_credentials(
            &self,
            _credentials: &Credentials,
        ) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn assign_token(
            &self,
            _user_id: UserId,
            _token: &SessionToken,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn resolve_token(&self, token: &str) -> Result<Option<Identity>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok((token == "known").then(|| Identity {
                user_id: UserId(1),
                username: "alice".to_string(),
            }))
        }
    }

    #[tokio::test]
    async fn blank_tokens_never_reach_the_store() {
        let store = Arc::new(CountingStore::default());
        let service = IdentityService::new(store.clone());

        for token in [None, Some(""), Some("   ")] {
            let error = service.authenticate(token).await.expect_err("blank token");
            assert_eq!(error, ApplicationError::Unauthenticated);
        }
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn token_is_trimmed_before_lookup() {
        let service = IdentityService::new(Arc::new(CountingStore::default()));

        let identity = service.authenticate(Some(" known ")).await.expect("resolves");
        assert_eq!(identity.user_id, UserId(1));

        let error = service.authenticate(Some("stale")).await.expect_err("unknown token");
        assert_eq!(error, ApplicationError::Unauthenticated);
    }

    #[tokio::test]
    async fn register_maps_store_conflict_to_taken_username() {
        let service = IdentityService::new(Arc::new(CountingStore::default()));

        let error = service.register(Credentials::new("alice", "pw")).await.expect_err("taken");
        assert!(matches!(error, ApplicationError::Conflict(ref message) if message.contains("alice")));

        let error = service.register(Credentials::new("", "pw")).await.expect_err("blank");
        assert!(matches!(error, ApplicationError::Domain(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn unknown_credentials_are_rejected() {
        let service = IdentityService::new(Arc::new(CountingStore::default()));

        let error = service.login(Credentials::new("alice", "nope")).await.expect_err("rejected");
        assert_eq!(error, ApplicationError::InvalidCredentials);
    }
}
