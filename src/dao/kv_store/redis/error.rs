//! Error types shared by the Redis storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`RedisDaoError`] failures.
pub type RedisResult<T> = Result<T, RedisDaoError>;

/// Failures that can occur while interacting with Redis.
#[derive(Debug, Error)]
pub enum RedisDaoError {
    /// Required environment variable is missing.
    #[error("missing Redis environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The connection URL could not be parsed.
    #[error("invalid Redis URL `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: redis::RedisError,
    },
    /// No connection could be established after exhausting the retry budget.
    #[error("failed to connect to Redis after {attempts} attempts")]
    Connect {
        attempts: u32,
        #[source]
        source: redis::RedisError,
    },
    /// A command against a key failed.
    #[error("Redis command {command} failed for `{key}`")]
    Command {
        command: &'static str,
        key: String,
        #[source]
        source: redis::RedisError,
    },
    /// The periodic PING did not succeed.
    #[error("Redis health ping failed")]
    HealthPing {
        #[source]
        source: redis::RedisError,
    },
}
