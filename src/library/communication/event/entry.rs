use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Field-name to field-value mapping carried by a [`StreamEntry`]
pub type EntryFields = BTreeMap<String, String>;

/// Errors that may occur while parsing an [`EntryId`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryIdParseError {
    /// Identifier did not contain the `-` separator
    #[error("entry id is missing the sequence separator: {0}")]
    MissingSeparator(String),
    /// One of the two halves was not a number
    #[error("entry id contains a non-numeric component: {0}")]
    InvalidComponent(String),
}

/// Store-assigned, monotonic identifier of an entry within a stream
///
/// Identifiers consist of a millisecond timestamp and a sequence number, formatted as
/// `<millis>-<sequence>`. They are totally ordered within a stream, first by timestamp
/// and then by sequence number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EntryId {
    millis: u64,
    sequence: u64,
}

impl EntryId {
    /// Creates a new instance from raw parts
    pub fn new(millis: u64, sequence: u64) -> Self {
        Self { millis, sequence }
    }

    /// Millisecond timestamp component
    pub fn millis(&self) -> u64 {
        self.millis
    }

    /// Sequence component
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Ord for EntryId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.millis
            .cmp(&other.millis)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for EntryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.sequence)
    }
}

impl FromStr for EntryId {
    type Err = EntryIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (millis, sequence) = s
            .split_once('-')
            .ok_or_else(|| EntryIdParseError::MissingSeparator(s.to_owned()))?;

        let parse = |component: &str| {
            component
                .parse::<u64>()
                .map_err(|_| EntryIdParseError::InvalidComponent(s.to_owned()))
        };

        Ok(Self::new(parse(millis)?, parse(sequence)?))
    }
}

/// Immutable record appended to a stream by a producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    id: EntryId,
    fields: EntryFields,
}

impl StreamEntry {
    /// Creates a new instance from raw parts
    pub fn new(id: EntryId, fields: EntryFields) -> Self {
        Self { id, fields }
    }

    /// Identifier assigned by the store
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// All fields of the entry
    pub fn fields(&self) -> &EntryFields {
        &self.fields
    }

    /// Value of a single field, if present
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
