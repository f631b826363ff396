//! Lookup and teardown wait helpers for the Scaleway backend.

use std::time::Instant;

use tokio::time::sleep;

use crate::scaleway::types::InstanceId;

use super::super::{ScalewayBackend, ScalewayBackendError};
use super::InstanceSnapshot;

impl ScalewayBackend {
    pub(in crate::scaleway) async fn fetch_instance(
        &self,
        id: &InstanceId,
    ) -> Result<Option<InstanceSnapshot>, ScalewayBackendError> {
        let mut servers = self
            .api
            .list_instances(self.zone())
            .servers(id.as_str())
            .per_page(1)
            .run_async()
            .await?;

        Ok(servers.pop().map(InstanceSnapshot::from_server))
    }

    pub(in crate::scaleway) async fn wait_until_gone(
        &self,
        id: &InstanceId,
    ) -> Result<(), ScalewayBackendError> {
        let deadline = Instant::now() + self.wait_timeout;
        while Instant::now() <= deadline {
            if self.fetch_instance(id).await?.is_none() {
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }

        Err(ScalewayBackendError::ResidualResource {
            instance_id: id.as_str().to_owned(),
        })
    }
}
