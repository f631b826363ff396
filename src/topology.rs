//! Expansion of instance templates into per-user instances.

use serde::Serialize;

use crate::naming::qualify;
use crate::owner::OwnerMap;
use crate::scenario::{InstanceTemplate, User};

/// An instance template instantiated for one user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResolvedInstance {
    /// Name of the template this instance came from.
    pub template_name: String,
    /// Unique provider-facing name, `qualify(template_name, owner)`.
    pub canonical_name: String,
    /// Image label carried over from the template.
    pub image: String,
    /// Size label carried over from the template.
    pub size: String,
    /// Owning user's raw name.
    pub owner: String,
}

impl ResolvedInstance {
    fn new(template: &InstanceTemplate, user: &User) -> Self {
        Self {
            template_name: template.name.clone(),
            canonical_name: qualify(&template.name, &user.name),
            image: template.image.clone(),
            size: template.size.clone(),
            owner: user.name.clone(),
        }
    }
}

/// Instantiates every template once per user.
///
/// Partitions follow user order and each partition lists templates in
/// declaration order. Templates are assumed to be validated already.
#[must_use]
pub fn resolve_instances(templates: &[InstanceTemplate], users: &[User]) -> OwnerMap<ResolvedInstance> {
    let mut resolved = OwnerMap::new();
    for user in users {
        let instances = templates
            .iter()
            .map(|template| ResolvedInstance::new(template, user))
            .collect();
        resolved.push(user.name.clone(), instances);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::collections::BTreeSet;

    fn template(name: &str) -> InstanceTemplate {
        InstanceTemplate {
            name: name.to_owned(),
            image: String::from("debian"),
            size: String::from("micro"),
        }
    }

    #[fixture]
    fn users() -> Vec<User> {
        vec![User::new("alice"), User::new("bob"), User::new("john.doe")]
    }

    #[rstest]
    fn produces_cross_product_with_unique_names(users: Vec<User>) {
        let templates = [template("db"), template("web"), template("cache_1")];

        let resolved = resolve_instances(&templates, &users);

        assert_eq!(resolved.len(), templates.len() * users.len());
        let names: BTreeSet<_> = resolved
            .values()
            .map(|instance| instance.canonical_name.as_str())
            .collect();
        assert_eq!(names.len(), resolved.len());
    }

    #[rstest]
    fn partitions_by_owner_in_declared_order(users: Vec<User>) {
        let templates = [template("db"), template("web")];

        let resolved = resolve_instances(&templates, &users);

        let owners: Vec<_> = resolved
            .partitions()
            .map(|partition| partition.owner.as_str())
            .collect();
        assert_eq!(owners, ["alice", "bob", "john.doe"]);
        let john: Vec<_> = resolved
            .get("john.doe")
            .unwrap_or_default()
            .iter()
            .map(|instance| instance.canonical_name.as_str())
            .collect();
        assert_eq!(john, ["db-john-doe", "web-john-doe"]);
    }

    #[rstest]
    fn carries_template_fields_forward(users: Vec<User>) {
        let resolved = resolve_instances(&[template("db")], &users);

        for instance in resolved.values() {
            assert_eq!(instance.template_name, "db");
            assert_eq!(instance.image, "debian");
            assert_eq!(instance.size, "micro");
        }
    }

    #[test]
    fn empty_templates_yield_empty_partitions() {
        let resolved = resolve_instances(&[], &[User::new("alice")]);
        assert!(resolved.is_empty());
        assert_eq!(resolved.get("alice"), Some([].as_slice()));
    }
}
