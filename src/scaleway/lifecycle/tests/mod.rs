//! Unit tests for Scaleway lifecycle helpers.

use std::collections::HashMap;
use std::time::Duration;

use scaleway_rs::{ScalewayApi, ScalewayImage};

use super::InstanceSnapshot;
use super::image::ImageQuery;
use crate::ScalewayConfig;
use crate::scaleway::ScalewayBackend;
use crate::scaleway::types::{Action, InstanceId, InstanceState};

fn snapshot(
    id: impl Into<InstanceId>,
    state: impl Into<InstanceState>,
    allowed: impl IntoIterator<Item = impl Into<Action>>,
) -> InstanceSnapshot {
    InstanceSnapshot {
        id: id.into(),
        state: state.into(),
        allowed_actions: allowed.into_iter().map(Into::into).collect(),
    }
}

#[derive(Copy, Clone)]
struct ImageSpec {
    id: &'static str,
    arch: &'static str,
    state: &'static str,
    creation_date: &'static str,
}

fn image(spec: ImageSpec) -> ScalewayImage {
    ScalewayImage {
        id: spec.id.to_owned(),
        name: String::new(),
        arch: spec.arch.to_owned(),
        creation_date: spec.creation_date.to_owned(),
        modification_date: String::new(),
        from_server: None,
        organization: String::new(),
        public: true,
        state: spec.state.to_owned(),
        project: String::new(),
        tags: vec![],
        zone: String::new(),
        root_volume: scaleway_rs::ScalewayImageRootVolume {
            id: String::new(),
            name: String::new(),
            size: 0,
            volume_type: String::new(),
        },
        default_bootscript: None,
        extra_volumes: scaleway_rs::ScalewayImageExtraVolumes {
            volumes: HashMap::new(),
        },
    }
}

fn dummy_config() -> ScalewayConfig {
    ScalewayConfig {
        access_key: None,
        secret_key: String::from("dummy"),
        default_organization_id: None,
        default_project_id: String::from("proj"),
        default_zone: String::from("fr-par-1"),
        default_architecture: String::from("x86_64"),
    }
}

fn base_query() -> ImageQuery {
    ImageQuery {
        label: "debian_12".to_owned(),
        architecture: "x86_64".to_owned(),
        zone: "fr-par-1".to_owned(),
        project_id: "proj".to_owned(),
        organisation_id: None,
    }
}

fn backend_fixture() -> ScalewayBackend {
    ScalewayBackend {
        api: ScalewayApi::new("dummy"),
        config: dummy_config(),
        poll_interval: Duration::from_millis(1),
        wait_timeout: Duration::from_millis(5),
    }
}

#[test]
fn backend_exposes_zone_and_region() {
    let backend = backend_fixture();
    assert_eq!(backend.zone(), "fr-par-1");
    assert_eq!(backend.region(), "fr-par");
}
