use crate::library::communication::event::{IndexDefinition, IndexField};

/// Default prefix of the keys under which tweets are materialized
pub const TWEET_KEY_PREFIX: &str = "tweet:";

/// Default name of the full-text index covering materialized tweets
pub const TWEET_INDEX_NAME: &str = "tweets-index";

/// Full-text index over all hashes below the given prefix
///
/// Covers the free-form fields as full-text and hashtags as a tag field so they can be
/// queried by exact match, e.g. `@hashtags:{rust}`.
pub fn tweet_index(name: &str, prefix: &str) -> IndexDefinition {
    IndexDefinition {
        name: name.to_owned(),
        prefix: prefix.to_owned(),
        fields: vec![
            IndexField::text("id"),
            IndexField::text("user"),
            IndexField::text("text"),
            IndexField::text("location"),
            IndexField::tag("hashtags"),
        ],
    }
}
