//! HTTP [`Caller`] implementation against the Vertex AI Feature Store
//! `ReadFeatureValues` / `StreamingReadFeatureValues` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use fsloadgen_request::{EntityRef, Request};
use serde::Serialize;

use crate::caller::{ApiVersion, Caller};
use crate::error::{Error, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an [`HttpCaller`].
#[derive(Debug, Clone)]
pub struct HttpCallerConfig {
    /// GCP project ID the feature store lives in.
    pub project_id: String,
    /// GCP region the feature store lives in, e.g. `us-central1`.
    pub location: String,
    /// Which API version to address.
    pub api_version: ApiVersion,
    /// Overrides the default `{location}-aiplatform.googleapis.com` host.
    /// Primarily used to point at a local test double.
    pub endpoint_override: Option<String>,
    /// Per-call HTTP client timeout.
    pub timeout: Duration,
}

impl HttpCallerConfig {
    /// Builds a config with the default timeout and no endpoint override.
    #[must_use]
    pub fn new(project_id: impl Into<String>, location: impl Into<String>, api_version: ApiVersion) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            api_version,
            endpoint_override: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    fn endpoint(&self) -> String {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| format!("{}-aiplatform.googleapis.com:443", self.location))
    }
}

/// Issues requests over HTTPS against the Vertex AI Feature Store API.
pub struct HttpCaller {
    http: reqwest::Client,
    config: HttpCallerConfig,
}

impl HttpCaller {
    /// Builds a new caller from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the underlying HTTP client could not be
    /// constructed.
    pub fn new(config: HttpCallerConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn resource_prefix(&self, featurestore_id: &str, entity_type: &str) -> String {
        format!(
            "https://{}/{}/projects/{}/locations/{}/featurestores/{featurestore_id}/entityTypes/{entity_type}",
            self.config.endpoint(),
            self.config.api_version.path_segment(),
            self.config.project_id,
            self.config.location,
        )
    }
}

#[derive(Serialize)]
struct IdMatcher<'a> {
    ids: &'a [String],
}

#[derive(Serialize)]
struct FeatureSelector<'a> {
    id_matcher: IdMatcher<'a>,
}

#[derive(Serialize)]
struct ReadFeatureValuesBody<'a> {
    entity_id: &'a str,
    feature_selector: FeatureSelector<'a>,
}

#[derive(Serialize)]
struct StreamingReadFeatureValuesBody<'a> {
    entity_ids: &'a [String],
    feature_selector: FeatureSelector<'a>,
}

#[async_trait]
impl Caller for HttpCaller {
    async fn issue(&self, request: &Request) -> Result<()> {
        let prefix = self.resource_prefix(&request.featurestore_id, &request.entity_type);
        let selector = FeatureSelector {
            id_matcher: IdMatcher {
                ids: &request.feature_ids,
            },
        };

        let response = match &request.entity_ref {
            EntityRef::Single(entity_id) => {
                let url = format!("{prefix}:readFeatureValues");
                let body = ReadFeatureValuesBody {
                    entity_id,
                    feature_selector: selector,
                };
                self.http.post(url).json(&body).send().await?
            }
            EntityRef::Streaming(entity_ids) => {
                let url = format!("{prefix}:streamingReadFeatureValues");
                let body = StreamingReadFeatureValuesBody {
                    entity_ids,
                    feature_selector: selector,
                };
                self.http.post(url).json(&body).send().await?
            }
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::ServiceError {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_prefix_uses_default_endpoint() {
        let config = HttpCallerConfig::new("proj", "us-central1", ApiVersion::V1);
        let caller = HttpCaller::new(config).unwrap();
        let prefix = caller.resource_prefix("fs1", "users");
        assert_eq!(
            prefix,
            "https://us-central1-aiplatform.googleapis.com:443/v1/projects/proj/locations/us-central1/featurestores/fs1/entityTypes/users"
        );
    }

    #[test]
    fn resource_prefix_honors_endpoint_override() {
        let mut config = HttpCallerConfig::new("proj", "us-central1", ApiVersion::V1Beta1);
        config.endpoint_override = Some("localhost:8080".to_string());
        let caller = HttpCaller::new(config).unwrap();
        let prefix = caller.resource_prefix("fs1", "users");
        assert!(prefix.starts_with("https://localhost:8080/v1beta1/"));
    }
}
