//! Cloud REST API collaborator
//!
//! - `http` - reqwest client with basic auth and request tagging
//! - `single_flight` - keeps at most one refresh request in flight
//! - `cache` - site/environment/domain cache used for default selection

pub mod cache;
pub mod http;
pub mod single_flight;

pub use cache::SiteEnvironmentCache;
pub use http::HttpCloudApi;
pub use single_flight::SingleFlight;

use crate::logstream::Origin;
use serde::Deserialize;
use std::fmt;
use std::future::Future;

/// Where to stream from and how to authenticate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionDescriptor {
    /// WebSocket URL of the log server
    pub url: String,
    /// Authentication message sent verbatim as the first frame
    #[serde(rename = "msg")]
    pub auth_message: String,
}

/// A failed REST call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    /// HTTP status, `None` when no response was received
    pub status: Option<u16>,
    pub status_text: String,
    pub body: String,
}

impl ApiFailure {
    /// The request never produced a response
    pub fn network(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            status_text: reason.into(),
            body: String::new(),
        }
    }

    /// Client-side rejections (4xx) are blamed on what we sent
    pub fn origin(&self) -> Origin {
        match self.status {
            Some(400..=499) => Origin::Sent,
            _ => Origin::Received,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} {}", status, self.status_text)?,
            None => write!(f, "{}", self.status_text)?,
        }
        if !self.body.is_empty() {
            write!(f, ": {}", self.body)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiFailure {}

/// REST operations the session and the site picker need
pub trait CloudApi: Send + Sync + 'static {
    /// `GET sites/{site}/envs/{env}/logstream.json`
    fn connection_descriptor(
        &self,
        site: &str,
        env: &str,
    ) -> impl Future<Output = Result<ConnectionDescriptor, ApiFailure>> + Send;

    /// `GET sites.json`
    fn list_sites(&self) -> impl Future<Output = Result<Vec<String>, ApiFailure>> + Send;

    /// `GET sites/{site}/envs.json`
    fn list_environments(
        &self,
        site: &str,
    ) -> impl Future<Output = Result<Vec<String>, ApiFailure>> + Send;

    /// `GET sites/{site}/envs/{env}/domains.json`
    fn list_domains(
        &self,
        site: &str,
        env: &str,
    ) -> impl Future<Output = Result<Vec<String>, ApiFailure>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logstream::DebugQualifier;

    #[test]
    fn test_descriptor_from_json() {
        let descriptor: ConnectionDescriptor = serde_json::from_str(
            r#"{"url":"wss://logstream.example.test/ah_websocket/logstream/v1","msg":"{\"cmd\":\"stream-environment\"}"}"#,
        )
        .unwrap();
        assert!(descriptor.url.starts_with("wss://"));
        assert_eq!(descriptor.auth_message, r#"{"cmd":"stream-environment"}"#);
    }

    #[test]
    fn test_failure_origin() {
        let forbidden = ApiFailure {
            status: Some(403),
            status_text: "Forbidden".into(),
            body: String::new(),
        };
        assert_eq!(forbidden.origin(), Origin::Sent);

        let outage = ApiFailure {
            status: Some(502),
            status_text: "Bad Gateway".into(),
            body: String::new(),
        };
        assert_eq!(outage.origin(), Origin::Received);
        assert_ne!(outage.origin(), Origin::Debug(DebugQualifier::Received));

        assert_eq!(ApiFailure::network("timeout").origin(), Origin::Received);
    }

    #[test]
    fn test_failure_display() {
        let failure = ApiFailure {
            status: Some(404),
            status_text: "Not Found".into(),
            body: r#"{"message":"no such site"}"#.into(),
        };
        assert_eq!(
            failure.to_string(),
            r#"404 Not Found: {"message":"no such site"}"#
        );
        assert_eq!(ApiFailure::network("connection refused").to_string(), "connection refused");
    }
}
