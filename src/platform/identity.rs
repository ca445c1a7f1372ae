use std::{error::Error, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use thiserror::Error;

/// Result alias for identity lookups.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Failure talking to the identity provider. An unknown user is not an error.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl IdentityError {
    /// Construct an unavailable error from any provider failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        IdentityError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Translates opaque platform user ids into display names.
pub trait IdentityResolver: Send + Sync {
    /// Resolve `user_id`, yielding `None` when the provider does not know it.
    fn username(&self, user_id: String) -> BoxFuture<'static, IdentityResult<Option<String>>>;
}

/// Fixed directory of user names, seeded from configuration or tests.
#[derive(Clone, Default)]
pub struct DirectoryResolver {
    names: Arc<DashMap<String, String>>,
}

impl DirectoryResolver {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or rename) a user.
    pub fn insert(&self, user_id: impl Into<String>, username: impl Into<String>) {
        self.names.insert(user_id.into(), username.into());
    }
}

impl<K, V> FromIterator<(K, V)> for DirectoryResolver
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let directory = Self::new();
        for (user_id, username) in iter {
            directory.insert(user_id, username);
        }
        directory
    }
}

impl IdentityResolver for DirectoryResolver {
    fn username(&self, user_id: String) -> BoxFuture<'static, IdentityResult<Option<String>>> {
        let names = self.names.clone();
        Box::pin(async move { Ok(names.get(&user_id).map(|name| name.value().clone())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn directory_resolves_known_users_only() {
        let directory = [("t2_u", "birdy")].into_iter().collect::<DirectoryResolver>();

        assert_eq!(
            directory.username("t2_u".into()).await.unwrap().as_deref(),
            Some("birdy")
        );
        assert_eq!(directory.username("t2_x".into()).await.unwrap(), None);
    }
}
