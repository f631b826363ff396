//! Image resolution helpers for the Scaleway backend.

use std::collections::BTreeSet;
use std::future::Future;

use scaleway_rs::{ScalewayImage, ScalewayListInstanceImagesBuilder};
use tracing::debug;

use super::super::{ScalewayBackend, ScalewayBackendError};

/// Parameters of an image lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(in crate::scaleway) struct ImageQuery {
    pub(in crate::scaleway) label: String,
    pub(in crate::scaleway) architecture: String,
    pub(in crate::scaleway) zone: String,
    pub(in crate::scaleway) project_id: String,
    pub(in crate::scaleway) organisation_id: Option<String>,
}

impl ScalewayBackend {
    fn image_query(&self, label: &str) -> ImageQuery {
        ImageQuery {
            label: label.trim().to_owned(),
            architecture: self.config.default_architecture.clone(),
            zone: self.zone().to_owned(),
            project_id: self.config.default_project_id.clone(),
            organisation_id: self.config.default_organization_id.clone(),
        }
    }

    /// Returns the labels among `labels` that resolve to an available image.
    pub(in crate::scaleway) async fn available_images(
        &self,
        labels: &[String],
    ) -> Result<BTreeSet<String>, ScalewayBackendError> {
        let distinct: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
        let mut found = BTreeSet::new();
        for label in distinct {
            match self.resolve_image_id(label).await {
                Ok(_) => {
                    found.insert(label.to_owned());
                }
                Err(ScalewayBackendError::ImageNotFound { .. }) => {
                    debug!(label, "image not available");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(found)
    }

    #[expect(
        clippy::excessive_nesting,
        reason = "organisation scoping requires nested builder updates before execution"
    )]
    pub(in crate::scaleway) async fn resolve_image_id(
        &self,
        label: &str,
    ) -> Result<String, ScalewayBackendError> {
        let query = self.image_query(label);
        let query_ref = &query;
        self.resolve_image_id_with(
            query_ref,
            || async move {
                if query_ref.project_id.is_empty() {
                    Ok(Vec::new())
                } else {
                    let mut scoped =
                        ScalewayListInstanceImagesBuilder::new(self.api.clone(), &query_ref.zone)
                            .public(true)
                            .project(&query_ref.project_id)
                            .name(&query_ref.label)
                            .arch(&query_ref.architecture);
                    if let Some(org) = &query_ref.organisation_id {
                        scoped = scoped.organization(org);
                    }
                    scoped.run_async().await.map_err(ScalewayBackendError::from)
                }
            },
            || async move {
                ScalewayListInstanceImagesBuilder::new(self.api.clone(), &query_ref.zone)
                    .public(true)
                    .name(&query_ref.label)
                    .arch(&query_ref.architecture)
                    .run_async()
                    .await
                    .map_err(ScalewayBackendError::from)
            },
        )
        .await
    }

    pub(in crate::scaleway) async fn resolve_image_id_with<FutA, FutB, FetchA, FetchB>(
        &self,
        query: &ImageQuery,
        project_fetch: FetchA,
        public_fetch: FetchB,
    ) -> Result<String, ScalewayBackendError>
    where
        FetchA: FnOnce() -> FutA,
        FetchB: FnOnce() -> FutB,
        FutA: Future<Output = Result<Vec<ScalewayImage>, ScalewayBackendError>>,
        FutB: Future<Output = Result<Vec<ScalewayImage>, ScalewayBackendError>>,
    {
        let project_images = project_fetch().await?;

        let public_images = if project_images.is_empty() {
            public_fetch().await?
        } else {
            Vec::new()
        };

        Self::select_image_from_sources(project_images, public_images, query)
    }

    pub(in crate::scaleway) fn select_image_id(
        mut candidates: Vec<ScalewayImage>,
        query: &ImageQuery,
    ) -> Result<String, ScalewayBackendError> {
        if candidates.is_empty() {
            return Err(ScalewayBackendError::ImageNotFound {
                label: query.label.clone(),
                arch: query.architecture.clone(),
                zone: query.zone.clone(),
            });
        }
        candidates.sort_by(|lhs, rhs| rhs.creation_date.cmp(&lhs.creation_date));
        Ok(candidates.remove(0).id)
    }

    pub(in crate::scaleway) fn select_image_from_sources(
        project_images: Vec<ScalewayImage>,
        public_images: Vec<ScalewayImage>,
        query: &ImageQuery,
    ) -> Result<String, ScalewayBackendError> {
        let primary = if project_images.is_empty() {
            public_images
        } else {
            project_images
        };

        let candidates = Self::filter_images(primary, query);

        Self::select_image_id(candidates, query)
    }

    pub(in crate::scaleway) fn filter_images(
        images: Vec<ScalewayImage>,
        query: &ImageQuery,
    ) -> Vec<ScalewayImage> {
        images
            .into_iter()
            .filter(|image| image.arch == query.architecture)
            .filter(|image| image.state == "available")
            .collect()
    }
}
