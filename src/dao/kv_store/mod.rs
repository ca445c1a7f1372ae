pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis;

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::dao::{models::RankedMember, storage::StorageResult};

/// Abstraction over the networked key-value store backing the leaderboard.
///
/// Every call maps to a single server-side command, so each one is atomic on
/// its own; nothing here spans several keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>>;
    fn set(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>>;
    fn h_get(&self, key: String, field: String)
    -> BoxFuture<'static, StorageResult<Option<String>>>;
    fn h_set(&self, key: String, field: String, value: String)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Add `delta` to a hash field (missing fields start at 0) and return the new value.
    fn h_incr_by(
        &self,
        key: String,
        field: String,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<i64>>;
    fn h_get_all(&self, key: String) -> BoxFuture<'static, StorageResult<HashMap<String, String>>>;
    /// Remove the given fields and return how many existed.
    fn h_del(&self, key: String, fields: Vec<String>) -> BoxFuture<'static, StorageResult<u64>>;
    /// Set the score of `member`, replacing any previous score.
    fn z_add(&self, key: String, member: String, score: f64)
    -> BoxFuture<'static, StorageResult<()>>;
    fn z_score(&self, key: String, member: String)
    -> BoxFuture<'static, StorageResult<Option<f64>>>;
    /// Members ranked `start..=stop` by descending score (0-indexed, inclusive).
    fn z_range_rev(
        &self,
        key: String,
        start: usize,
        stop: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<RankedMember>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
