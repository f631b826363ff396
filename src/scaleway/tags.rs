//! Encoding of ownership labels as Scaleway tags.
//!
//! Scaleway resources carry flat string tags. Labels are stored as
//! `key=value` tags next to a marker tag identifying resources provisioned by
//! this tool.

use std::collections::BTreeMap;

use crate::backend::OwnerLabels;

/// Marker tag applied to every provisioned resource.
pub(crate) const MARKER_TAG: &str = "achim";

pub(crate) fn encode(labels: &OwnerLabels) -> Vec<String> {
    let mut tags = vec![MARKER_TAG.to_owned()];
    tags.extend(
        labels
            .to_map()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}")),
    );
    tags
}

/// Returns `true` when `tags` include the marker tag.
pub(crate) fn is_managed(tags: &[String]) -> bool {
    tags.iter().any(|tag| tag == MARKER_TAG)
}

pub(crate) fn decode(tags: &[String]) -> BTreeMap<String, String> {
    tags.iter()
        .filter_map(|tag| tag.split_once('='))
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}
