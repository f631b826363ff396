//! Paginated listings of servers and private networks.
//!
//! Only resources carrying the marker tag are reported; anything else in the
//! project belongs to someone else.

use serde::Deserialize;

use crate::backend::ResourceSummary;
use crate::scaleway::tags;

use super::super::{ScalewayBackend, ScalewayBackendError};

const PAGE_SIZE: usize = 100;

#[derive(Deserialize)]
struct PublicIp {
    address: String,
}

#[derive(Deserialize)]
struct TaggedResource {
    id: String,
    name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    public_ip: Option<PublicIp>,
    #[serde(default)]
    public_ips: Vec<PublicIp>,
}

impl From<TaggedResource> for ResourceSummary {
    fn from(value: TaggedResource) -> Self {
        let public_ip = value
            .public_ips
            .into_iter()
            .next()
            .or(value.public_ip)
            .map(|ip| ip.address);
        Self {
            labels: tags::decode(&value.tags),
            id: value.id,
            name: value.name,
            public_ip,
        }
    }
}

fn managed(resources: Vec<TaggedResource>) -> impl Iterator<Item = ResourceSummary> {
    resources
        .into_iter()
        .filter(|resource| tags::is_managed(&resource.tags))
        .map(ResourceSummary::from)
}

#[derive(Deserialize)]
struct ServerPage {
    #[serde(default)]
    servers: Vec<TaggedResource>,
}

#[derive(Deserialize)]
struct PrivateNetworkPage {
    #[serde(default)]
    private_networks: Vec<TaggedResource>,
}

impl ScalewayBackend {
    pub(in crate::scaleway) async fn list_servers(
        &self,
    ) -> Result<Vec<ResourceSummary>, ScalewayBackendError> {
        let url = format!(
            "{}/zones/{}/servers",
            super::SCALEWAY_INSTANCE_API_BASE,
            self.zone()
        );
        let mut summaries = Vec::new();
        for page in 1.. {
            let query = [
                ("project", self.config.default_project_id.clone()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: ServerPage = self.get_json(&url, &query).await?;
            let count = batch.servers.len();
            summaries.extend(managed(batch.servers));
            if count < PAGE_SIZE {
                break;
            }
        }
        Ok(summaries)
    }

    pub(in crate::scaleway) async fn list_private_networks(
        &self,
    ) -> Result<Vec<ResourceSummary>, ScalewayBackendError> {
        let url = format!(
            "{}/regions/{}/private-networks",
            super::SCALEWAY_VPC_API_BASE,
            self.region()
        );
        let mut summaries = Vec::new();
        for page in 1.. {
            let query = [
                ("project_id", self.config.default_project_id.clone()),
                ("page_size", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: PrivateNetworkPage = self.get_json(&url, &query).await?;
            let count = batch.private_networks.len();
            summaries.extend(managed(batch.private_networks));
            if count < PAGE_SIZE {
                break;
            }
        }
        Ok(summaries)
    }
}
