use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use redis::{FromRedisValue, aio::ConnectionManager};
use tokio::{sync::RwLock, time::sleep};
use tracing::warn;

use super::{
    config::RedisConfig,
    error::{RedisDaoError, RedisResult},
};
use crate::dao::{kv_store::KeyValueStore, models::RankedMember, storage::StorageResult};

const BASE_RETRY_DELAY_MS: u64 = 250;

#[derive(Clone)]
pub struct RedisKvStore {
    inner: Arc<RedisInner>,
}

struct RedisInner {
    connection: RwLock<ConnectionManager>,
    config: RedisConfig,
}

impl RedisKvStore {
    /// Connect to Redis, retrying with exponential backoff up to the configured budget.
    pub async fn connect(config: RedisConfig) -> RedisResult<Self> {
        let connection = establish_connection(&config).await?;
        Ok(Self {
            inner: Arc::new(RedisInner {
                connection: RwLock::new(connection),
                config,
            }),
        })
    }

    async fn connection(&self) -> ConnectionManager {
        self.inner.connection.read().await.clone()
    }

    async fn query<T>(&self, command: &'static str, key: &str, cmd: redis::Cmd) -> RedisResult<T>
    where
        T: FromRedisValue,
    {
        let mut connection = self.connection().await;
        cmd.query_async(&mut connection)
            .await
            .map_err(|source| RedisDaoError::Command {
                command,
                key: key.to_owned(),
                source,
            })
    }
}

async fn establish_connection(config: &RedisConfig) -> RedisResult<ConnectionManager> {
    let client = config.client()?;
    let mut attempts = 0;
    let mut delay = Duration::from_millis(BASE_RETRY_DELAY_MS);

    loop {
        attempts += 1;
        match ConnectionManager::new(client.clone()).await {
            Ok(connection) => return Ok(connection),
            Err(source) if attempts >= config.connect_attempts => {
                return Err(RedisDaoError::Connect { attempts, source });
            }
            Err(err) => {
                warn!(error = %err, attempts, "Redis connection attempt failed; retrying");
                sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(5));
            }
        }
    }
}

impl KeyValueStore for RedisKvStore {
    fn get(&self, key: String) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut cmd = redis::cmd("GET");
            cmd.arg(&key);
            Ok(store.query("GET", &key, cmd).await?)
        })
    }

    fn set(&self, key: String, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut cmd = redis::cmd("SET");
            cmd.arg(&key).arg(value);
            Ok(store.query("SET", &key, cmd).await?)
        })
    }

    fn h_get(
        &self,
        key: String,
        field: String,
    ) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut cmd = redis::cmd("HGET");
            cmd.arg(&key).arg(field);
            Ok(store.query("HGET", &key, cmd).await?)
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
            let mut cmd = redis::cmd("HSET");
            cmd.arg(&key).arg(field).arg(value);
            let _: i64 = store.query("HSET", &key, cmd).await?;
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
            let mut cmd = redis::cmd("HINCRBY");
            cmd.arg(&key).arg(field).arg(delta);
            Ok(store.query("HINCRBY", &key, cmd).await?)
        })
    }

    fn h_get_all(&self, key: String) -> BoxFuture<'static, StorageResult<HashMap<String, String>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut cmd = redis::cmd("HGETALL");
            cmd.arg(&key);
            Ok(store.query("HGETALL", &key, cmd).await?)
        })
    }

    fn h_del(&self, key: String, fields: Vec<String>) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            if fields.is_empty() {
                return Ok(0);
            }
            let mut cmd = redis::cmd("HDEL");
            cmd.arg(&key).arg(fields);
            Ok(store.query("HDEL", &key, cmd).await?)
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
            let mut cmd = redis::cmd("ZADD");
            cmd.arg(&key).arg(score).arg(member);
            let _: i64 = store.query("ZADD", &key, cmd).await?;
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
            let mut cmd = redis::cmd("ZSCORE");
            cmd.arg(&key).arg(member);
            Ok(store.query("ZSCORE", &key, cmd).await?)
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
            if start > stop {
                return Ok(Vec::new());
            }
            let mut cmd = redis::cmd("ZREVRANGE");
            cmd.arg(&key).arg(start).arg(stop).arg("WITHSCORES");
            let pairs: Vec<(String, f64)> = store.query("ZREVRANGE", &key, cmd).await?;
            Ok(pairs
                .into_iter()
                .map(|(member, score)| RankedMember::new(member, score))
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut connection = store.connection().await;
            redis::cmd("PING")
                .query_async::<String>(&mut connection)
                .await
                .map_err(|source| RedisDaoError::HealthPing { source })?;
            Ok(())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let connection = establish_connection(&store.inner.config).await?;
            *store.inner.connection.write().await = connection;
            Ok(())
        })
    }
}
