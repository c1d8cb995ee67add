//! Domain specific structures
//!
//! Tweets enter the system through the [publisher](crate::module::publisher) which flattens them
//! into stream entries. Consumers materialize those entries into hashes below
//! [`TWEET_KEY_PREFIX`] which are covered by the [`tweet_index`] full-text index.

mod index;
mod tweet;

pub use index::*;
pub use tweet::*;
