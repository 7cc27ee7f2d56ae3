//! reqwest-backed Cloud API client
//!
//! Every resource is fetched as `GET {base_url}/{path}.json` with basic auth.
//! While "only mine" tracking is active each request carries an
//! `X-Request-ID` header so its log lines can be recognised later.

use super::{ApiFailure, CloudApi, ConnectionDescriptor};
use crate::config::ApiConfig;
use crate::constants::{API_SUCCESS_STATUSES, REQUEST_ID_HEADER};
use crate::error::{Result, StreamError};
use crate::logstream::RequestTagging;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

pub struct HttpCloudApi {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    tagging: RequestTagging,
}

impl HttpCloudApi {
    pub fn new(config: &ApiConfig, tagging: RequestTagging) -> Result<Self> {
        if !config.has_credentials() {
            return Err(StreamError::MissingCredentials);
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("logstream/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StreamError::HttpClient { source: e })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            tagging,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ApiFailure> {
        let mut request = self
            .client
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.password));
        if let Some(id) = self.tagging.next_request_id() {
            request = request.header(REQUEST_ID_HEADER, id);
        }

        let response = request.send().await.map_err(|e| {
            let err = StreamError::HttpRequest {
                path: path.to_string(),
                source: e,
            };
            debug!("{}", err);
            ApiFailure::network(err.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("GET {} -> {}", path, status);

        if !API_SUCCESS_STATUSES.contains(&status.as_u16()) {
            return Err(ApiFailure {
                status: Some(status.as_u16()),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiFailure {
            status: Some(status.as_u16()),
            status_text: format!("Malformed response: {}", e),
            body,
        })
    }
}

impl CloudApi for HttpCloudApi {
    async fn connection_descriptor(
        &self,
        site: &str,
        env: &str,
    ) -> std::result::Result<ConnectionDescriptor, ApiFailure> {
        self.get_json(&format!("sites/{}/envs/{}/logstream", site, env))
            .await
    }

    async fn list_sites(&self) -> std::result::Result<Vec<String>, ApiFailure> {
        self.get_json("sites").await
    }

    async fn list_environments(&self, site: &str) -> std::result::Result<Vec<String>, ApiFailure> {
        let envs: Vec<Named> = self.get_json(&format!("sites/{}/envs", site)).await?;
        Ok(envs.into_iter().map(|e| e.name).collect())
    }

    async fn list_domains(
        &self,
        site: &str,
        env: &str,
    ) -> std::result::Result<Vec<String>, ApiFailure> {
        let domains: Vec<Named> = self
            .get_json(&format!("sites/{}/envs/{}/domains", site, env))
            .await?;
        Ok(domains.into_iter().map(|d| d.name).collect())
    }
}
