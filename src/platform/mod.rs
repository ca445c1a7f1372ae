//! Capabilities provided by the hosting social platform.

#[cfg(feature = "platform-http")]
pub mod http;
pub mod identity;
pub mod notification;
