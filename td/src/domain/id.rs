//! Task ID generation
//!
//! IDs are the first 8 hex characters of a random (v4) UUID, e.g. `3f9a61c2`.
//! They carry no ordering information, so a client cannot guess its
//! neighbour's ID from its own.

/// Length of a generated task ID in hex characters
pub const TASK_ID_LEN: usize = 8;

/// Generate a fresh random task ID
///
/// Uniqueness within a registry is enforced by the registry, which retries on
/// the (rare) collision.
pub fn generate_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    uuid.simple().to_string()[..TASK_ID_LEN].to_string()
}

/// Task ID wrapper for type-safe ID handling
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new random task ID
    pub fn generate() -> Self {
        Self(generate_id())
    }

    /// Get the full ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}
