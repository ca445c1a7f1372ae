/// Who is calling a service operation.
pub mod caller;
/// Route-facing leaderboard, presence and settings operations.
pub mod community_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Scores, rankings and presence over the key-value store.
pub mod leaderboard_service;
pub mod message_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
