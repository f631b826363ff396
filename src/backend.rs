//! Backend abstraction for provisioning per-user instances and networks.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::network::IpRange;
use crate::plan::{Attachment, CreatedInstance, CreatedNetwork};
use crate::size::Size;

/// Label naming the context (for example a course) a resource belongs to.
pub const LABEL_CONTEXT: &str = "context";
/// Label naming the group a resource was provisioned for.
pub const LABEL_GROUP: &str = "group";
/// Label naming the user owning a resource.
pub const LABEL_OWNER: &str = "owner";
/// Label protecting a resource from group teardown.
pub const LABEL_PERMANENT: &str = "permanent";

/// Ownership labels attached to every provisioned resource.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OwnerLabels {
    /// Context label; omitted when empty.
    pub context: String,
    /// Group label; omitted when empty.
    pub group: String,
    /// Owner label; omitted when empty.
    pub owner: String,
    /// Adds `permanent=true` when set.
    pub permanent: bool,
}

impl OwnerLabels {
    /// Returns the non-empty labels as key/value pairs.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        for (key, value) in [
            (LABEL_CONTEXT, self.context.trim()),
            (LABEL_GROUP, self.group.trim()),
            (LABEL_OWNER, self.owner.trim()),
        ] {
            if !value.is_empty() {
                labels.insert(key.to_owned(), value.to_owned());
            }
        }
        if self.permanent {
            labels.insert(LABEL_PERMANENT.to_owned(), String::from("true"));
        }
        labels
    }
}

/// Parameters required to create a new instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceRequest {
    /// Canonical instance name.
    pub name: String,
    /// Image label resolved by the backend to a provider image.
    pub image_label: String,
    /// Requested size.
    pub size: Size,
    /// Ownership labels.
    pub labels: OwnerLabels,
    /// Powers the instance on after creation when set.
    pub autostart: bool,
}

impl InstanceRequest {
    /// Starts a builder for an [`InstanceRequest`].
    #[must_use]
    pub fn builder() -> InstanceRequestBuilder {
        InstanceRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] when `name` or `image_label` is
    /// empty.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.name.is_empty() {
            return Err(BackendError::Validation("name".to_owned()));
        }
        if self.image_label.is_empty() {
            return Err(BackendError::Validation("image_label".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`InstanceRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceRequestBuilder {
    name: String,
    image_label: String,
    size: Size,
    labels: OwnerLabels,
    autostart: bool,
}

impl Default for InstanceRequestBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            image_label: String::new(),
            size: Size::Micro,
            labels: OwnerLabels::default(),
            autostart: false,
        }
    }
}

impl InstanceRequestBuilder {
    /// Creates an empty builder; name and image must be set before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the canonical instance name.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = value.into();
        self
    }

    /// Sets the image label.
    #[must_use]
    pub fn image_label(mut self, value: impl Into<String>) -> Self {
        self.image_label = value.into();
        self
    }

    /// Sets the size.
    #[must_use]
    pub const fn size(mut self, value: Size) -> Self {
        self.size = value;
        self
    }

    /// Sets the ownership labels.
    #[must_use]
    pub fn labels(mut self, value: OwnerLabels) -> Self {
        self.labels = value;
        self
    }

    /// Requests power-on after creation.
    #[must_use]
    pub const fn autostart(mut self, value: bool) -> Self {
        self.autostart = value;
        self
    }

    /// Builds and validates the [`InstanceRequest`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] when any required field is empty.
    pub fn build(self) -> Result<InstanceRequest, BackendError> {
        let request = InstanceRequest {
            name: self.name.trim().to_owned(),
            image_label: self.image_label.trim().to_owned(),
            size: self.size,
            labels: self.labels,
            autostart: self.autostart,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Parameters required to create a private network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkRequest {
    /// Canonical network name.
    pub name: String,
    /// Managed address range; `None` keeps the provider default.
    pub ip_range: Option<IpRange>,
    /// Ownership labels.
    pub labels: OwnerLabels,
}

impl NetworkRequest {
    /// Creates a network request, trimming the name.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] when the name is empty.
    pub fn new(
        name: impl Into<String>,
        ip_range: Option<IpRange>,
        labels: OwnerLabels,
    ) -> Result<Self, BackendError> {
        let trimmed = name.into().trim().to_owned();
        if trimmed.is_empty() {
            return Err(BackendError::Validation("name".to_owned()));
        }
        Ok(Self {
            name: trimmed,
            ip_range,
            labels,
        })
    }
}

/// Handle returned after attaching an instance to a network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NicHandle {
    /// Provider identifier of the network interface.
    pub id: String,
}

/// An existing provider resource as reported by a listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceSummary {
    /// Provider identifier.
    pub id: String,
    /// Resource name.
    pub name: String,
    /// Labels decoded from the provider's metadata.
    pub labels: BTreeMap<String, String>,
    /// Public address, for instances that have one.
    pub public_ip: Option<String>,
}

impl ResourceSummary {
    /// Returns the value of `key`, if present.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Returns `true` when the resource carries `group=<group>`.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.label(LABEL_GROUP) == Some(group)
    }

    /// Returns `true` when the resource is protected from teardown.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.label(LABEL_PERMANENT) == Some("true")
    }

    /// Converts the summary into a created-instance reference.
    #[must_use]
    pub fn as_instance(&self) -> CreatedInstance {
        CreatedInstance {
            canonical_name: self.name.clone(),
            id: self.id.clone(),
        }
    }

    /// Converts the summary into a created-network reference.
    #[must_use]
    pub fn as_network(&self) -> CreatedNetwork {
        CreatedNetwork {
            canonical_name: self.name.clone(),
            id: self.id.clone(),
        }
    }
}

/// Power transitions supported for instances.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerAction {
    /// Boot a stopped instance.
    Start,
    /// Shut a running instance down.
    Stop,
}

/// Errors raised by backends.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum BackendError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Interface implemented by cloud backends.
pub trait ProvisioningBackend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the subset of `labels` that resolve to an available image.
    fn find_images<'a>(
        &'a self,
        labels: &'a [String],
    ) -> BackendFuture<'a, BTreeSet<String>, Self::Error>;

    /// Creates an instance and returns its provider identifier.
    fn create_instance<'a>(
        &'a self,
        request: &'a InstanceRequest,
    ) -> BackendFuture<'a, CreatedInstance, Self::Error>;

    /// Creates a private network and returns its provider identifier.
    fn create_network<'a>(
        &'a self,
        request: &'a NetworkRequest,
    ) -> BackendFuture<'a, CreatedNetwork, Self::Error>;

    /// Attaches an instance to a network with a static address.
    fn attach_network<'a>(
        &'a self,
        attachment: &'a Attachment,
    ) -> BackendFuture<'a, NicHandle, Self::Error>;

    /// Lists the instances this tool provisioned.
    fn list_instances(&self) -> BackendFuture<'_, Vec<ResourceSummary>, Self::Error>;

    /// Lists the private networks this tool provisioned.
    fn list_networks(&self) -> BackendFuture<'_, Vec<ResourceSummary>, Self::Error>;

    /// Starts or stops an instance.
    fn power<'a>(&'a self, id: &'a str, action: PowerAction) -> BackendFuture<'a, (), Self::Error>;

    /// Deletes an instance and waits until it is gone.
    fn destroy_instance<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error>;

    /// Deletes a private network.
    fn destroy_network<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_labels_skip_empty_values() {
        let labels = OwnerLabels {
            context: String::from("course"),
            group: String::new(),
            owner: String::from("alice"),
            permanent: false,
        };

        let map = labels.to_map();

        assert_eq!(map.get(LABEL_CONTEXT).map(String::as_str), Some("course"));
        assert_eq!(map.get(LABEL_OWNER).map(String::as_str), Some("alice"));
        assert!(!map.contains_key(LABEL_GROUP));
        assert!(!map.contains_key(LABEL_PERMANENT));
    }

    #[test]
    fn permanent_flag_becomes_label() {
        let labels = OwnerLabels {
            permanent: true,
            ..OwnerLabels::default()
        };
        assert_eq!(
            labels.to_map().get(LABEL_PERMANENT).map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn builder_trims_and_validates() {
        let request = InstanceRequest::builder()
            .name("  db-alice ")
            .image_label(" debian ")
            .size(Size::Small)
            .build()
            .expect("valid request");
        assert_eq!(request.name, "db-alice");
        assert_eq!(request.image_label, "debian");

        let err = InstanceRequest::builder()
            .name("db-alice")
            .build()
            .expect_err("image required");
        assert_eq!(err, BackendError::Validation(String::from("image_label")));
    }

    #[test]
    fn network_request_rejects_blank_names() {
        let err = NetworkRequest::new("  ", None, OwnerLabels::default())
            .expect_err("blank name should fail");
        assert_eq!(err, BackendError::Validation(String::from("name")));
    }

    #[test]
    fn summary_reports_group_and_permanence() {
        let summary = ResourceSummary {
            id: String::from("srv-1"),
            name: String::from("db-alice"),
            labels: BTreeMap::from([
                (String::from(LABEL_GROUP), String::from("g1")),
                (String::from(LABEL_PERMANENT), String::from("true")),
            ]),
            public_ip: None,
        };

        assert!(summary.in_group("g1"));
        assert!(!summary.in_group("g2"));
        assert!(summary.is_permanent());
        assert_eq!(summary.as_instance().canonical_name, "db-alice");
    }
}
