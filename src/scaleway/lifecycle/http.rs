//! Authenticated JSON requests against Scaleway endpoints the SDK lacks.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::super::{ScalewayBackend, ScalewayBackendError};

/// Status and body of a completed request.
pub(in crate::scaleway) struct RawResponse {
    pub(in crate::scaleway) status: StatusCode,
    pub(in crate::scaleway) body: Vec<u8>,
}

impl RawResponse {
    pub(in crate::scaleway) fn parse<T: DeserializeOwned>(&self) -> Result<T, ScalewayBackendError> {
        serde_json::from_slice(&self.body).map_err(|err| ScalewayBackendError::Provider {
            message: err.to_string(),
        })
    }

    pub(in crate::scaleway) fn message(&self) -> String {
        let body = String::from_utf8_lossy(&self.body);
        if body.trim().is_empty() {
            return self.status.to_string();
        }
        body.into_owned()
    }

    pub(in crate::scaleway) fn api_error(&self) -> Option<scaleway_rs::ScalewayApiError> {
        serde_json::from_slice(&self.body).ok()
    }
}

fn provider_error(err: &reqwest::Error) -> ScalewayBackendError {
    ScalewayBackendError::Provider {
        message: err.to_string(),
    }
}

impl ScalewayBackend {
    pub(in crate::scaleway) async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<RawResponse, ScalewayBackendError> {
        let mut request = super::HTTP_CLIENT
            .request(method, url)
            .header("X-Auth-Token", &self.config.secret_key);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|err| provider_error(&err))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| provider_error(&err))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }

    pub(in crate::scaleway) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ScalewayBackendError> {
        let response = self.send::<()>(Method::GET, url, query, None).await?;
        if !response.status.is_success() {
            return Err(ScalewayBackendError::Provider {
                message: response.message(),
            });
        }
        response.parse()
    }
}
