mod sse;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::kv_store::KeyValueStore,
    error::ServiceError,
    platform::{identity::IdentityResolver, notification::NotificationQueue},
    services::{leaderboard_service::LeaderboardService, sse_events},
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the public SSE broadcast channel.
pub const PUBLIC_SSE_CAPACITY: usize = 64;

/// Central application state holding the store handle and platform capabilities.
pub struct AppState {
    store: RwLock<Option<Arc<dyn KeyValueStore>>>,
    identity: Arc<dyn IdentityResolver>,
    notifications: NotificationQueue,
    sse: SseHub,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        identity: Arc<dyn IdentityResolver>,
        notifications: NotificationQueue,
        sse: SseHub,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            identity,
            notifications,
            sse,
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn KeyValueStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn KeyValueStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Leaderboard service bound to the installed store.
    pub async fn leaderboard(&self) -> Result<LeaderboardService, ServiceError> {
        let store = self.store().await.ok_or(ServiceError::Degraded)?;
        Ok(LeaderboardService::new(
            store,
            self.identity.clone(),
            self.notifications.clone(),
            self.config.leaderboard.clone(),
        )
        .with_default_app_settings(self.config.default_app_settings.clone()))
    }

    /// Update and broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });

        if changed {
            sse_events::broadcast_system_status(&self.sse, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::kv_store::memory::MemoryKvStore, platform::identity::DirectoryResolver};

    fn state() -> SharedState {
        let (queue, _rx) = NotificationQueue::channel();
        AppState::new(
            AppConfig::default(),
            Arc::new(DirectoryResolver::new()),
            queue,
            SseHub::new(8),
        )
    }

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = state();
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.leaderboard().await,
            Err(ServiceError::Degraded)
        ));

        state.install_store(Arc::new(MemoryKvStore::new())).await;
        assert!(!state.is_degraded().await);
        assert!(state.leaderboard().await.is_ok());
    }

    #[tokio::test]
    async fn degraded_changes_are_broadcast_once() {
        let state = state();
        let mut events = state.public_sse().subscribe();
        let mut watcher = state.degraded_watcher();

        state.install_store(Arc::new(MemoryKvStore::new())).await;
        state.install_store(Arc::new(MemoryKvStore::new())).await;
        state.clear_store().await;

        let first = events.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some("system_status"));
        assert_eq!(first.data, r#"{"degraded":false}"#);
        let second = events.recv().await.unwrap();
        assert_eq!(second.data, r#"{"degraded":true}"#);
        assert!(events.try_recv().is_err());

        assert!(watcher.has_changed().unwrap());
        assert!(*watcher.borrow_and_update());
    }
}
