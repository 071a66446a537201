//! Process-wide generated identity.
//!
//! Identity is generated exactly once, during [`crate::service::Service`]
//! construction, and owned by the service instance. Nothing here is global
//! state; anything needing identity receives the instance by reference.

use uuid::Uuid;

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brisk", "calm", "clever", "crisp", "eager", "fleet", "gentle", "keen",
    "lucid", "mellow", "nimble", "quiet", "rapid", "sly", "steady", "stern", "swift", "vivid",
];

const NOUNS: &[&str] = &[
    "anvil", "beacon", "comet", "dynamo", "ember", "falcon", "garnet", "harbor", "iris", "jetty",
    "kestrel", "lantern", "meadow", "otter", "pylon", "quarry", "raven", "spruce", "tundra",
    "willow",
];

/// Identity of one running service process.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    /// Human-readable instance name, e.g. `brisk-falcon`.
    pub instance_name: String,
    /// Unique instance identifier.
    pub instance_id: Uuid,
    /// File name of the running binary.
    pub executable: String,
    /// Version string reported by the health endpoint.
    pub version: String,
}

impl ServiceIdentity {
    /// Generates a fresh identity.
    ///
    /// The version defaults to the chassis crate version; embedding
    /// services override it with [`ServiceIdentity::with_version`].
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        let instance_name = format!(
            "{}-{}",
            ADJECTIVES[rng.random_range(0..ADJECTIVES.len())],
            NOUNS[rng.random_range(0..NOUNS.len())]
        );

        Self {
            instance_name,
            instance_id: Uuid::new_v4(),
            executable: executable_name(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Replaces the reported version string.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// File name of the running binary, falling back to the crate name when the
/// executable path cannot be resolved.
fn executable_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Host name of the machine, as reported by the environment.
#[must_use]
pub fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_ids() {
        let a = ServiceIdentity::generate();
        let b = ServiceIdentity::generate();
        assert_ne!(a.instance_id, b.instance_id);
    }

    #[test]
    fn instance_name_is_adjective_noun() {
        let identity = ServiceIdentity::generate();
        let (adjective, noun) = identity.instance_name.split_once('-').unwrap();
        assert!(ADJECTIVES.contains(&adjective));
        assert!(NOUNS.contains(&noun));
    }

    #[test]
    fn executable_and_version_are_populated() {
        let identity = ServiceIdentity::generate();
        assert!(!identity.executable.is_empty());
        assert!(!identity.version.is_empty());
    }

    #[test]
    fn with_version_overrides_the_default() {
        let identity = ServiceIdentity::generate().with_version("2.4.0");
        assert_eq!(identity.version, "2.4.0");
    }
}
