//! Private NIC attachment with IPAM-reserved static addresses.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::backend::NicHandle;
use crate::plan::Attachment;

use super::super::{ScalewayBackend, ScalewayBackendError};

#[derive(Serialize)]
struct IpSource<'a> {
    private_network_id: &'a str,
}

#[derive(Serialize)]
struct BookIpRequest<'a> {
    project_id: &'a str,
    source: IpSource<'a>,
    address: &'a str,
}

#[derive(Deserialize)]
struct BookedIp {
    id: String,
}

#[derive(Serialize)]
struct CreatePrivateNicRequest<'a> {
    private_network_id: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ipam_ip_ids: Vec<String>,
}

#[derive(Deserialize)]
struct PrivateNic {
    id: String,
}

#[derive(Deserialize)]
struct CreatePrivateNicResponse {
    private_nic: PrivateNic,
}

impl ScalewayBackend {
    fn attach_failed(attachment: &Attachment, message: String) -> ScalewayBackendError {
        ScalewayBackendError::AttachFailed {
            network_id: attachment.network_id.clone(),
            instance_id: attachment.instance_id.clone(),
            message,
        }
    }

    async fn book_address(&self, attachment: &Attachment) -> Result<String, ScalewayBackendError> {
        let url = format!(
            "{}/regions/{}/ips",
            super::SCALEWAY_IPAM_API_BASE,
            self.region()
        );
        let payload = BookIpRequest {
            project_id: &self.config.default_project_id,
            source: IpSource {
                private_network_id: &attachment.network_id,
            },
            address: attachment.ip.trim(),
        };
        let response = self.send(Method::POST, &url, &[], Some(&payload)).await?;
        if !response.status.is_success() {
            return Err(Self::attach_failed(attachment, response.message()));
        }
        let booked: BookedIp = response.parse()?;
        Ok(booked.id)
    }

    pub(in crate::scaleway) async fn attach_private_nic(
        &self,
        attachment: &Attachment,
    ) -> Result<NicHandle, ScalewayBackendError> {
        let ipam_ip_ids = if attachment.ip.trim().is_empty() {
            Vec::new()
        } else {
            vec![self.book_address(attachment).await?]
        };

        let url = format!(
            "{}/zones/{}/servers/{}/private_nics",
            super::SCALEWAY_INSTANCE_API_BASE,
            self.zone(),
            attachment.instance_id
        );
        let payload = CreatePrivateNicRequest {
            private_network_id: &attachment.network_id,
            ipam_ip_ids,
        };
        let response = self.send(Method::POST, &url, &[], Some(&payload)).await?;
        if !response.status.is_success() {
            return Err(Self::attach_failed(attachment, response.message()));
        }
        let created: CreatePrivateNicResponse = response.parse()?;
        Ok(NicHandle {
            id: created.private_nic.id,
        })
    }
}
