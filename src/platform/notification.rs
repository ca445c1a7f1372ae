//! New-highscore side effects, kept off the score write path.
//!
//! The leaderboard only ever calls [`NotificationQueue::enqueue`]. A worker task
//! owns the [`NotificationDispatcher`] and delivers notices one at a time, so a
//! slow or failing platform never delays or fails a score save.

use std::{error::Error, sync::Arc};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{info, warn};
use utoipa::ToSchema;

/// Payload describing a player who just took rank 0 on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HighscoreNotice {
    pub user_name: String,
    pub post_id: String,
    pub score: f64,
}

impl HighscoreNotice {
    /// Text posted under the game post when the comment mode is active.
    pub fn comment_text(&self) -> String {
        format!(
            "WOW! \"{}\" scored a new highscore: {}!",
            self.user_name,
            format_score(self.score)
        )
    }
}

/// Render whole scores without a trailing `.0`.
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < i64::MAX as f64 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}

/// How a new highscore is announced on the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationMode {
    /// Post a comment under the game post.
    #[default]
    Comment,
    /// Schedule a platform job that performs the announcement later.
    Job,
    /// Only record the notice in the logs.
    Log,
}

/// Failure raised while delivering a notice.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The platform answered but refused the notice.
    #[error("notification rejected: {0}")]
    Rejected(String),
    /// The platform could not be reached.
    #[error("notification channel unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl NotificationError {
    /// Construct an unavailable error from any transport failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        NotificationError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Delivers highscore notices to the platform.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notice: HighscoreNotice) -> BoxFuture<'static, Result<(), NotificationError>>;
}

/// Dispatcher that only logs notices.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn dispatch(&self, notice: HighscoreNotice) -> BoxFuture<'static, Result<(), NotificationError>> {
        Box::pin(async move {
            info!(
                user = %notice.user_name,
                post_id = %notice.post_id,
                score = notice.score,
                "{}",
                notice.comment_text()
            );
            Ok(())
        })
    }
}

/// Fire-and-forget handle feeding the notification worker.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: UnboundedSender<HighscoreNotice>,
}

impl NotificationQueue {
    /// Create a queue and hand back the receiving side for a custom consumer.
    pub fn channel() -> (Self, UnboundedReceiver<HighscoreNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Create a queue drained by a worker task delivering through `dispatcher`.
    ///
    /// `on_delivered` runs after every successful delivery.
    pub fn spawn<F>(dispatcher: Arc<dyn NotificationDispatcher>, on_delivered: F) -> (Self, JoinHandle<()>)
    where
        F: Fn(&HighscoreNotice) + Send + 'static,
    {
        let (queue, rx) = Self::channel();
        let worker = tokio::spawn(run_worker(rx, dispatcher, on_delivered));
        (queue, worker)
    }

    /// Queue a notice without waiting for delivery.
    pub fn enqueue(&self, notice: HighscoreNotice) {
        if let Err(err) = self.tx.send(notice) {
            warn!(post_id = %err.0.post_id, "notification worker stopped; dropping highscore notice");
        }
    }
}

/// Deliver queued notices until every queue handle is dropped.
async fn run_worker<F>(
    mut rx: UnboundedReceiver<HighscoreNotice>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    on_delivered: F,
) where
    F: Fn(&HighscoreNotice) + Send + 'static,
{
    while let Some(notice) = rx.recv().await {
        match dispatcher.dispatch(notice.clone()).await {
            Ok(()) => {
                info!(user = %notice.user_name, post_id = %notice.post_id, "highscore notice delivered");
                on_delivered(&notice);
            }
            Err(err) => {
                warn!(error = %err, user = %notice.user_name, post_id = %notice.post_id, "failed to deliver highscore notice");
            }
        }
    }
}
