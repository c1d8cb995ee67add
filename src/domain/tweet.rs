use crate::library::communication::event::EntryFields;
use serde::Deserialize;

/// Single document of the tweet firehose
///
/// Anything that does not look like a tweet (deletions, limit notices, ...) is kept as
/// [`StreamMessage::Other`] and ignored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StreamMessage {
    /// Regular tweet
    Tweet(Tweet),
    /// Any other message type
    Other(serde::de::IgnoredAny),
}

/// Tweet as delivered by the streaming API
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    /// Unique identifier
    pub id: u64,
    /// Author
    pub user: User,
    /// Content
    pub text: String,
    /// Entities referenced in the text
    #[serde(default)]
    pub entities: Option<Entities>,
    /// Detected language code
    #[serde(default)]
    pub lang: String,
    /// Whether the tweet links to potentially sensitive content
    #[serde(default)]
    pub possibly_sensitive: bool,
}

/// Author of a tweet
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Handle without the leading `@`
    pub screen_name: String,
    /// Free-form, user provided location
    #[serde(default)]
    pub location: Option<String>,
}

/// Entities referenced in a tweet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    /// Hashtags in order of appearance
    #[serde(default)]
    pub hashtags: Vec<Hashtag>,
}

/// Hashtag referenced in a tweet
#[derive(Debug, Clone, Deserialize)]
pub struct Hashtag {
    /// Text without the leading `#`
    pub text: String,
}

/// Language of tweets that are indexed
pub const INDEXED_LANGUAGE: &str = "en";

impl Tweet {
    /// Whether the tweet should be published to the stream
    pub fn qualifies(&self) -> bool {
        self.lang == INDEXED_LANGUAGE && !self.possibly_sensitive
    }

    /// Hashtags joined by `,` which matches the separator of tag fields in the index
    pub fn hashtags(&self) -> String {
        self.entities
            .iter()
            .flat_map(|entities| entities.hashtags.iter())
            .map(|hashtag| hashtag.text.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Flattens the tweet into stream entry fields
    pub fn to_fields(&self) -> EntryFields {
        let mut fields = EntryFields::new();

        fields.insert("id".into(), self.id.to_string());
        fields.insert("user".into(), self.user.screen_name.clone());
        fields.insert("text".into(), self.text.clone());
        fields.insert(
            "location".into(),
            self.user.location.clone().unwrap_or_default(),
        );
        fields.insert("hashtags".into(), self.hashtags());

        fields
    }
}
