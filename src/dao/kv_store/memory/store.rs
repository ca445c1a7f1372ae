use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    kv_store::KeyValueStore,
    models::RankedMember,
    storage::{StorageError, StorageResult},
};

/// In-process store mirroring the Redis semantics the leaderboard relies on.
///
/// Each key lives behind its own `DashMap` shard lock, so single commands are
/// atomic the same way they are on a Redis server.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    strings: DashMap<String, String>,
    hashes: DashMap<String, HashMap<String, String>>,
    sorted_sets: DashMap<String, HashMap<String, f64>>,
    writes: AtomicU64,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating commands executed so far.
    pub fn writes(&self) -> u64 {
        self.inner.writes.load(AtomicOrdering::Relaxed)
    }

    fn record_write(&self) {
        self.inner.writes.fetch_add(1, AtomicOrdering::Relaxed);
    }
}

/// Redis orders equal scores by member, and reverse ranges flip both.
fn reverse_rank_order(a: &RankedMember, b: &RankedMember) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.member.cmp(&a.member))
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .strings
                .get(&key)
                .map(|value| value.value().clone()))
        })
    }

    fn set(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.strings.insert(key, value);
            store.record_write();
            Ok(())
        })
    }

    fn h_get(
        &self,
        key: String,
        field: String,
    ) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .hashes
                .get(&key)
                .and_then(|hash| hash.get(&field).cloned()))
        })
    }

    fn h_set(
        &self,
        key: String,
        field: String,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.hashes.entry(key).or_default().insert(field, value);
            store.record_write();
            Ok(())
        })
    }

    fn h_incr_by(
        &self,
        key: String,
        field: String,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move {
            let mut hash = store.inner.hashes.entry(key.clone()).or_default();
            let current = match hash.get(&field) {
                Some(raw) => raw
                    .parse::<i64>()
                    .map_err(|_| StorageError::corrupt(format!("{key}/{field}"), raw.clone()))?,
                None => 0,
            };
            let next = current.saturating_add(delta);
            hash.insert(field, next.to_string());
            drop(hash);
            store.record_write();
            Ok(next)
        })
    }

    fn h_get_all(&self, key: String) -> BoxFuture<'static, StorageResult<HashMap<String, String>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .hashes
                .get(&key)
                .map(|hash| hash.value().clone())
                .unwrap_or_default())
        })
    }

    fn h_del(&self, key: String, fields: Vec<String>) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = match store.inner.hashes.get_mut(&key) {
                Some(mut hash) => fields
                    .iter()
                    .filter(|field| hash.remove(field.as_str()).is_some())
                    .count() as u64,
                None => 0,
            };
            // Redis drops a hash once its last field is gone.
            store.inner.hashes.remove_if(&key, |_, hash| hash.is_empty());
            store.record_write();
            Ok(removed)
        })
    }

    fn z_add(
        &self,
        key: String,
        member: String,
        score: f64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .sorted_sets
                .entry(key)
                .or_default()
                .insert(member, score);
            store.record_write();
            Ok(())
        })
    }

    fn z_score(
        &self,
        key: String,
        member: String,
    ) -> BoxFuture<'static, StorageResult<Option<f64>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .sorted_sets
                .get(&key)
                .and_then(|set| set.get(&member).copied()))
        })
    }

    fn z_range_rev(
        &self,
        key: String,
        start: usize,
        stop: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<RankedMember>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(set) = store.inner.sorted_sets.get(&key) else {
                return Ok(Vec::new());
            };
            let mut ranked = set
                .iter()
                .map(|(member, score)| RankedMember::new(member.clone(), *score))
                .collect::<Vec<_>>();
            drop(set);

            if start > stop {
                return Ok(Vec::new());
            }
            ranked.sort_by(reverse_rank_order);
            Ok(ranked
                .into_iter()
                .skip(start)
                .take(stop - start + 1)
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn z_add_overwrites_previous_score() {
        let store = MemoryKvStore::new();
        store.z_add("z".into(), "u".into(), 50.0).await.unwrap();
        store.z_add("z".into(), "u".into(), 30.0).await.unwrap();

        assert_eq!(store.z_score("z".into(), "u".into()).await.unwrap(), Some(30.0));
        assert_eq!(store.z_range_rev("z".into(), 0, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reverse_range_orders_by_score_then_member() {
        let store = MemoryKvStore::new();
        store.z_add("z".into(), "a".into(), 10.0).await.unwrap();
        store.z_add("z".into(), "b".into(), 10.0).await.unwrap();
        store.z_add("z".into(), "c".into(), 99.0).await.unwrap();

        let members = store
            .z_range_rev("z".into(), 0, 9)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.member)
            .collect::<Vec<_>>();
        assert_eq!(members, vec!["c", "b", "a"]);

        let top = store.z_range_rev("z".into(), 0, 0).await.unwrap();
        assert_eq!(top, vec![RankedMember::new("c", 99.0)]);
    }

    #[tokio::test]
    async fn h_incr_by_starts_from_zero_and_rejects_garbage() {
        let store = MemoryKvStore::new();
        assert_eq!(store.h_incr_by("h".into(), "f".into(), 5).await.unwrap(), 5);
        assert_eq!(store.h_incr_by("h".into(), "f".into(), 1).await.unwrap(), 6);

        store
            .h_set("h".into(), "bad".into(), "nope".into())
            .await
            .unwrap();
        let err = store
            .h_incr_by("h".into(), "bad".into(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn h_del_counts_removed_fields() {
        let store = MemoryKvStore::new();
        store.h_set("h".into(), "a".into(), "1".into()).await.unwrap();
        store.h_set("h".into(), "b".into(), "2".into()).await.unwrap();

        let removed = store
            .h_del("h".into(), vec!["a".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.h_get_all("h".into()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reads_do_not_count_as_writes() {
        let store = MemoryKvStore::new();
        store.get("s".into()).await.unwrap();
        store.h_get_all("h".into()).await.unwrap();
        store.z_range_rev("z".into(), 0, 0).await.unwrap();
        assert_eq!(store.writes(), 0);

        store.set("s".into(), "v".into()).await.unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get("s".into()).await.unwrap().as_deref(), Some("v"));
    }
}
