//! Validated identifier newtypes shared across the workspace.

use serde::{Deserialize, Serialize};

/// Validated agent identity.
///
/// `AgentId` is a newtype wrapper around `String` that enforces the naming
/// rules every identity in the registry must satisfy: non-empty after
/// trimming, at most 64 characters, and limited to alphanumerics plus
/// `_`, `-`, and `.`. Identities are compared byte-for-byte and are unique
/// for the lifetime of a registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

/// Errors that can occur when creating an [`AgentId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAgentId {
    /// Identifier is empty or contains only whitespace.
    #[error("agent id cannot be empty")]
    Empty,
    /// Identifier exceeds the maximum allowed length.
    #[error("agent id too long: {0} characters (max {max})", max = AgentId::MAX_LENGTH)]
    TooLong(usize),
    /// Identifier contains characters outside the allowed set.
    #[error("agent id contains invalid characters: '{0}'")]
    InvalidChars(String),
}

impl AgentId {
    /// Maximum allowed length for agent identifiers.
    pub const MAX_LENGTH: usize = 64;

    /// Create a new validated agent id.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ensemble_core::AgentId;
    ///
    /// let id = AgentId::new("frontend").unwrap();
    /// assert_eq!(id.as_str(), "frontend");
    /// assert!(AgentId::new("").is_err());
    /// ```
    pub fn new(id: &str) -> Result<Self, InvalidAgentId> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(InvalidAgentId::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(InvalidAgentId::TooLong(trimmed.len()));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(InvalidAgentId::InvalidChars(trimmed.to_string()));
        }
        Ok(AgentId(trimmed.to_string()))
    }

    /// Get the agent id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for AgentId {
    type Error = InvalidAgentId;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        AgentId::new(id)
    }
}

impl TryFrom<String> for AgentId {
    type Error = InvalidAgentId;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        AgentId::new(&id)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

/// A capability tag an agent declares to advertise what kinds of prompts it
/// can serve.
///
/// Capabilities are plain case-preserving strings compared for exact
/// equality; matching semantics (superset lookup) live in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability(String);

impl Capability {
    pub fn new(tag: impl Into<String>) -> Self {
        Capability(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Capability {
    fn from(tag: &str) -> Self {
        Capability(tag.to_string())
    }
}

impl From<String> for Capability {
    fn from(tag: String) -> Self {
        Capability(tag)
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
