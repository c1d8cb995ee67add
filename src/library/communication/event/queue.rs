use std::time::Duration;

/// Describes a stream of entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDescriptor {
    key: String,
}

impl QueueDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Value which may be used by store implementations to identify a stream
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Retrieves the key (ref [`key()`](QueueDescriptor::key) method) with an extension added
    pub fn key_with_extension(&self, extension: &str) -> String {
        format!("{}.{}", self.key, extension)
    }

    /// Derives a sibling stream by appending an extension to the key
    pub fn with_extension(&self, extension: &str) -> Self {
        Self::new(self.key_with_extension(extension))
    }
}

/// Location within the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueLocation {
    /// Start of the stream (not necessarily the first entry as a stream may be trimmed)
    Head,
    /// End of the stream (exclusive of the last entry)
    Tail,
}

/// Parameters of a blocking claim for new entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOptions {
    /// Maximum number of entries delivered by one claim
    pub batch_size: usize,
    /// Maximum duration the claim blocks on an idle stream before returning an empty batch
    pub block: Duration,
}

impl Default for ClaimOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            block: Duration::from_millis(15000),
        }
    }
}
