//! REST client for the hosting platform's user and comment APIs.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dto::format_system_time;

use super::{
    identity::{IdentityError, IdentityResolver, IdentityResult},
    notification::{HighscoreNotice, NotificationDispatcher, NotificationError, NotificationMode},
};

/// Name of the scheduled job created in [`NotificationMode::Job`].
pub const HIGHSCORE_JOB_NAME: &str = "NEW_HIGHSCORE";
/// Upper bound for a whole platform request, connect included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures that can occur while talking to the platform API.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Required environment variable is missing.
    #[error("missing platform environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed.
    #[error("failed to build platform client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send platform request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The platform returned an unexpected status code.
    #[error("unexpected platform response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// The response body could not be decoded.
    #[error("failed to decode platform response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<PlatformError> for IdentityError {
    fn from(err: PlatformError) -> Self {
        IdentityError::unavailable(err.to_string(), err)
    }
}

impl From<PlatformError> for NotificationError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::RequestStatus { path, status } if status.is_client_error() => {
                NotificationError::Rejected(format!("{status} for `{path}`"))
            }
            other => NotificationError::unavailable(other.to_string(), other),
        }
    }
}

/// Runtime configuration describing how to reach the platform API.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl PlatformConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Give up on requests that take longer than `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build a configuration from `PLATFORM_API_URL` and optional `PLATFORM_API_TOKEN`.
    pub fn from_env() -> Result<Self, PlatformError> {
        let base_url = std::env::var("PLATFORM_API_URL").map_err(|_| {
            PlatformError::MissingEnvVar {
                var: "PLATFORM_API_URL",
            }
        })?;
        let config = Self::new(base_url);
        Ok(match std::env::var("PLATFORM_API_TOKEN").ok() {
            Some(token) if !token.is_empty() => config.with_token(token),
            _ => config,
        })
    }
}

/// Shared HTTP handle used by the identity resolver and the dispatcher.
#[derive(Clone)]
pub struct PlatformClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

#[derive(Deserialize)]
struct UserResponse {
    username: String,
}

#[derive(Serialize)]
struct CommentRequest {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobRequest<'a> {
    name: &'static str,
    data: &'a HighscoreNotice,
    run_at: String,
}

impl PlatformClient {
    /// Build a client for the configured platform.
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| PlatformError::ClientBuilder { source })?;
        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            token: config.token.map(Arc::from),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match self.token {
            Some(ref token) => builder.bearer_auth(token.as_ref()),
            None => builder,
        }
    }

    async fn fetch_username(&self, user_id: &str) -> Result<Option<String>, PlatformError> {
        let path = format!("users/{user_id}");
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|source| PlatformError::RequestSend {
                path: path.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<UserResponse>()
                .await
                .map(|user| Some(user.username))
                .map_err(|source| PlatformError::DecodeResponse { path, source }),
            status => Err(PlatformError::RequestStatus { path, status }),
        }
    }

    async fn post_json<T>(&self, path: String, body: &T) -> Result<(), PlatformError>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::POST, &path)
            .json(body)
            .send()
            .await
            .map_err(|source| PlatformError::RequestSend {
                path: path.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PlatformError::RequestStatus {
                path,
                status: response.status(),
            })
        }
    }
}

impl IdentityResolver for PlatformClient {
    fn username(&self, user_id: String) -> BoxFuture<'static, IdentityResult<Option<String>>> {
        let client = self.clone();
        Box::pin(async move { Ok(client.fetch_username(&user_id).await?) })
    }
}

/// Announces new highscores through the platform API.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: PlatformClient,
    mode: NotificationMode,
}

impl HttpDispatcher {
    /// Wrap `client`, announcing notices the way `mode` describes.
    pub fn new(client: PlatformClient, mode: NotificationMode) -> Self {
        Self { client, mode }
    }
}

impl NotificationDispatcher for HttpDispatcher {
    fn dispatch(&self, notice: HighscoreNotice) -> BoxFuture<'static, Result<(), NotificationError>> {
        let dispatcher = self.clone();
        Box::pin(async move {
            match dispatcher.mode {
                NotificationMode::Comment => {
                    let body = CommentRequest {
                        text: notice.comment_text(),
                    };
                    let path = format!("posts/{}/comments", notice.post_id);
                    dispatcher.client.post_json(path, &body).await?;
                }
                NotificationMode::Job => {
                    let body = JobRequest {
                        name: HIGHSCORE_JOB_NAME,
                        data: &notice,
                        run_at: format_system_time(std::time::SystemTime::now()),
                    };
                    dispatcher.client.post_json("jobs".into(), &body).await?;
                }
                NotificationMode::Log => {
                    tracing::info!(post_id = %notice.post_id, "{}", notice.comment_text());
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_rejections() {
        let err: NotificationError = PlatformError::RequestStatus {
            path: "posts/t3/comments".into(),
            status: StatusCode::FORBIDDEN,
        }
        .into();
        assert!(matches!(err, NotificationError::Rejected(_)));

        let err: NotificationError = PlatformError::RequestStatus {
            path: "jobs".into(),
            status: StatusCode::BAD_GATEWAY,
        }
        .into();
        assert!(matches!(err, NotificationError::Unavailable { .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = PlatformClient::new(PlatformConfig::new("https://platform.test/api/")).unwrap();
        assert_eq!(&*client.base_url, "https://platform.test/api");
    }

    #[test]
    fn job_payload_uses_camel_case() {
        let notice = HighscoreNotice {
            user_name: "birdy".into(),
            post_id: "t3_post".into(),
            score: 42.0,
        };
        let body = serde_json::to_value(JobRequest {
            name: HIGHSCORE_JOB_NAME,
            data: &notice,
            run_at: "2026-01-01T00:00:00Z".into(),
        })
        .unwrap();
        assert_eq!(body["name"], "NEW_HIGHSCORE");
        assert_eq!(body["runAt"], "2026-01-01T00:00:00Z");
        assert_eq!(body["data"]["userName"], "birdy");
        assert_eq!(body["data"]["postId"], "t3_post");
    }

    #[tokio::test]
    async fn hung_platform_requests_time_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let client = PlatformClient::new(
            PlatformConfig::new(format!("http://{addr}"))
                .with_request_timeout(Duration::from_millis(100)),
        )
        .unwrap();

        let lookup = tokio::time::timeout(Duration::from_secs(5), client.username("t2_u".into()))
            .await
            .expect("client timeout should fire first");
        assert!(lookup.is_err());

        server.abort();
    }
}
