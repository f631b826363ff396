//! Per-owner partitions of resolved resources.

use serde::Serialize;

/// Resolved values grouped by owner, in user declaration order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OwnerMap<T> {
    partitions: Vec<Partition<T>>,
}

/// One owner's share of an [`OwnerMap`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Partition<T> {
    /// Owner name as declared in the group file.
    pub owner: String,
    /// Values in template declaration order.
    pub items: Vec<T>,
}

impl<T> Default for OwnerMap<T> {
    fn default() -> Self {
        Self {
            partitions: Vec::new(),
        }
    }
}

impl<T> OwnerMap<T> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a partition for `owner`.
    ///
    /// Owners are not deduplicated; a repeated owner gets a second partition
    /// and [`OwnerMap::get`] returns the first.
    pub fn push(&mut self, owner: impl Into<String>, items: Vec<T>) {
        self.partitions.push(Partition {
            owner: owner.into(),
            items,
        });
    }

    /// Returns the values belonging to `owner`.
    #[must_use]
    pub fn get(&self, owner: &str) -> Option<&[T]> {
        self.partitions
            .iter()
            .find(|partition| partition.owner == owner)
            .map(|partition| partition.items.as_slice())
    }

    /// Iterates partitions in owner order.
    pub fn partitions(&self) -> impl Iterator<Item = &Partition<T>> {
        self.partitions.iter()
    }

    /// Iterates every value across all owners.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.partitions
            .iter()
            .flat_map(|partition| partition.items.iter())
    }

    /// Returns the number of values across all owners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions
            .iter()
            .map(|partition| partition.items.len())
            .sum()
    }

    /// Returns `true` when no owner holds any value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
