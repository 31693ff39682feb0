// Registry of language versions already registered in one build invocation
use crate::identifier::LanguageVersion;
use std::collections::BTreeSet;

/// Append-only set of registered versions.
///
/// Insertion is idempotent and commutative; the set is owned by a single
/// [`MultiReleaseConfig`](super::MultiReleaseConfig) and never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRegistry {
    versions: BTreeSet<LanguageVersion>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the version was not registered before
    pub fn register(&mut self, version: LanguageVersion) -> bool {
        self.versions.insert(version)
    }

    pub fn contains(&self, version: LanguageVersion) -> bool {
        self.versions.contains(&version)
    }

    /// Registered versions in ascending order
    pub fn versions(&self) -> impl Iterator<Item = LanguageVersion> + '_ {
        self.versions.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: i64) -> LanguageVersion {
        LanguageVersion::new(n).unwrap()
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = VersionRegistry::new();
        assert!(registry.register(v(11)));
        assert!(!registry.register(v(11)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_is_commutative() {
        let mut forward = VersionRegistry::new();
        for n in [11, 17, 11] {
            forward.register(v(n));
        }
        let mut backward = VersionRegistry::new();
        for n in [17, 11] {
            backward.register(v(n));
        }
        assert_eq!(forward, backward);
        assert_eq!(forward.versions().map(LanguageVersion::get).collect::<Vec<_>>(), vec![11, 17]);
    }
}
