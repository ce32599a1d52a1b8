//! Entity trait: identity + version stamp for optimistic concurrency.

use serde::{Deserialize, Serialize};

/// Optimistic-concurrency version stamp.
///
/// A freshly persisted record is at version 1; every accepted update moves it
/// forward by exactly one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const INITIAL: Version = Version(1);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A persisted record with a stable identity and a version stamp.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Short lowercase name used in errors and logs (e.g. `"product"`).
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    fn version(&self) -> Version;

    /// Overwrite the version stamp. Only repositories should call this.
    fn set_version(&mut self, version: Version);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn initial_version_is_one() {
        assert_eq!(Version::INITIAL.get(), 1);
        assert_eq!(Version::INITIAL.next(), Version::from(2));
    }

    proptest! {
        #[test]
        fn next_is_strictly_increasing_by_one(v in 0u64..u64::MAX) {
            let version = Version::from(v);
            prop_assert_eq!(version.next().get(), v + 1);
            prop_assert!(version.next() > version);
        }
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&Version::from(7)).unwrap();
        assert_eq!(json, "7");
    }
}
