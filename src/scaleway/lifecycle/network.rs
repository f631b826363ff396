//! Private network creation and deletion through the VPC API.
//!
//! VPC subnets are CIDR blocks. A declared range is converted to the subnet
//! containing its first address; the last address is not enforced by the
//! provider.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::NetworkRequest;
use crate::plan::CreatedNetwork;
use crate::scaleway::tags;

use super::super::{ScalewayBackend, ScalewayBackendError};

#[derive(Serialize)]
struct CreatePrivateNetworkRequest {
    name: String,
    project_id: String,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subnets: Vec<String>,
}

#[derive(Deserialize)]
struct PrivateNetworkResponse {
    id: String,
    name: String,
}

impl ScalewayBackend {
    fn subnets_for(request: &NetworkRequest) -> Result<Vec<String>, ScalewayBackendError> {
        let Some(range) = request.ip_range.as_ref() else {
            return Ok(Vec::new());
        };
        let subnet = range
            .subnet()
            .ok_or_else(|| ScalewayBackendError::InvalidRange {
                network: request.name.clone(),
                netmask: range.netmask.clone(),
                start_ip: range.start_ip.clone(),
            })?;
        Ok(vec![subnet.to_string()])
    }

    pub(in crate::scaleway) async fn create_private_network(
        &self,
        request: &NetworkRequest,
    ) -> Result<CreatedNetwork, ScalewayBackendError> {
        let url = format!(
            "{}/regions/{}/private-networks",
            super::SCALEWAY_VPC_API_BASE,
            self.region()
        );
        let payload = CreatePrivateNetworkRequest {
            name: request.name.clone(),
            project_id: self.config.default_project_id.clone(),
            tags: tags::encode(&request.labels),
            subnets: Self::subnets_for(request)?,
        };

        let response = self.send(Method::POST, &url, &[], Some(&payload)).await?;
        if !response.status.is_success() {
            return Err(ScalewayBackendError::NetworkCreateFailed {
                name: request.name.clone(),
                region: self.region().to_owned(),
                message: response.message(),
            });
        }

        let created: PrivateNetworkResponse = response.parse()?;
        debug!(name = %created.name, id = %created.id, "private network created");
        Ok(CreatedNetwork {
            canonical_name: created.name,
            id: created.id,
        })
    }

    pub(in crate::scaleway) async fn delete_private_network(
        &self,
        id: &str,
    ) -> Result<(), ScalewayBackendError> {
        let url = format!(
            "{}/regions/{}/private-networks/{id}",
            super::SCALEWAY_VPC_API_BASE,
            self.region()
        );
        let response = self.send::<()>(Method::DELETE, &url, &[], None).await?;
        if response.status.is_success() || response.status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(ScalewayBackendError::Provider {
            message: response.message(),
        })
    }
}
