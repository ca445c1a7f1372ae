use super::error::{RedisDaoError, RedisResult};

const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;

/// Runtime configuration describing how to connect to Redis.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_attempts: u32,
}

impl RedisConfig {
    /// Construct a configuration for the given `redis://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
        }
    }

    /// Override how many times the initial connection is attempted.
    pub fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts.max(1);
        self
    }

    /// Build a configuration by reading `REDIS_URL`.
    pub fn from_env() -> RedisResult<Self> {
        let url = std::env::var("REDIS_URL")
            .map_err(|_| RedisDaoError::MissingEnvVar { var: "REDIS_URL" })?;
        Ok(Self::new(url))
    }

    /// Parse the URL into a client handle without connecting.
    pub(super) fn client(&self) -> RedisResult<redis::Client> {
        redis::Client::open(self.url.as_str()).map_err(|source| RedisDaoError::InvalidUrl {
            url: self.url.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_attempts_never_drop_to_zero() {
        let config = RedisConfig::new("redis://localhost:6379").with_connect_attempts(0);
        assert_eq!(config.connect_attempts, 1);
    }

    #[test]
    fn malformed_url_is_rejected() {
        let err = RedisConfig::new("not a url").client().unwrap_err();
        assert!(matches!(err, RedisDaoError::InvalidUrl { .. }));
    }

    #[test]
    fn well_formed_url_parses_without_connecting() {
        assert!(RedisConfig::new("redis://127.0.0.1:6379/0").client().is_ok());
    }
}
