//! ReddiBirds Back binary entrypoint wiring REST, SSE, the key-value store and the platform API.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reddibirds_back::{
    config::AppConfig,
    dao::kv_store::memory::MemoryKvStore,
    platform::{
        identity::{DirectoryResolver, IdentityResolver},
        notification::{
            LogDispatcher, NotificationDispatcher, NotificationMode, NotificationQueue,
        },
    },
    routes,
    services::sse_events,
    state::{AppState, PUBLIC_SSE_CAPACITY, SharedState, SseHub},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let (identity, dispatcher, mode) = platform_capabilities(&config);

    let sse = SseHub::new(PUBLIC_SSE_CAPACITY);
    let delivered_hub = sse.clone();
    let (notifications, _worker) = NotificationQueue::spawn(dispatcher, move |notice| {
        sse_events::broadcast_highscore_shared(&delivered_hub, mode, notice);
    });

    let app_state = AppState::new(config, identity, notifications, sse);
    start_storage(app_state.clone()).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the identity resolver and notification dispatcher: the platform API
/// when `PLATFORM_API_URL` is set, the configured user directory otherwise.
/// Also returns the mode notices are actually delivered in.
fn platform_capabilities(
    config: &AppConfig,
) -> (
    Arc<dyn IdentityResolver>,
    Arc<dyn NotificationDispatcher>,
    NotificationMode,
) {
    #[cfg(feature = "platform-http")]
    {
        use reddibirds_back::platform::http::{HttpDispatcher, PlatformClient, PlatformConfig};

        match PlatformConfig::from_env().and_then(PlatformClient::new) {
            Ok(client) => {
                info!(mode = ?config.notification_mode, "using platform API");
                let dispatcher = HttpDispatcher::new(client.clone(), config.notification_mode);
                return (
                    Arc::new(client),
                    Arc::new(dispatcher),
                    config.notification_mode,
                );
            }
            Err(err) => warn!(error = %err, "platform API not configured; using local directory"),
        }
    }

    let directory = config
        .users
        .iter()
        .map(|(id, name)| (id.clone(), name.clone()))
        .collect::<DirectoryResolver>();
    (
        Arc::new(directory),
        Arc::new(LogDispatcher),
        NotificationMode::Log,
    )
}

/// Hand the key-value store to the shared state: Redis under supervision when
/// `REDIS_URL` is set, an in-process store otherwise.
async fn start_storage(state: SharedState) {
    #[cfg(feature = "redis-store")]
    {
        use reddibirds_back::{
            dao::{
                kv_store::{
                    KeyValueStore,
                    redis::{RedisConfig, RedisKvStore},
                },
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        match RedisConfig::from_env() {
            Ok(redis_config) => {
                info!("using Redis store");
                tokio::spawn(storage_supervisor::run(state, move || {
                    let redis_config = redis_config.clone();
                    async move {
                        let store = RedisKvStore::connect(redis_config)
                            .await
                            .map_err(StorageError::from)?;
                        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn KeyValueStore>)
                    }
                }));
                return;
            }
            Err(err) => warn!(error = %err, "Redis not configured; falling back to in-memory store"),
        }
    }

    state.install_store(Arc::new(MemoryKvStore::new())).await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
