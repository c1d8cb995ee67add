//! Trait implementations using [`redis`](::redis)
//!
//! Streams are backed by [Redis Streams](https://redis.io/topics/streams-intro) and records are
//! stored as hashes, optionally indexed by [RediSearch](https://oss.redis.com/redisearch/).

const STREAM_ID_NEW: &str = "*";
const STREAM_ID_HEAD: &str = "0";
const STREAM_ID_TAIL: &str = "$";
const STREAM_ID_ADDITIONS: &str = ">";
const BUSY_GROUP_CODE: &str = "BUSYGROUP";

mod sink;
mod store;

pub use sink::*;
pub use store::*;

use crate::library::communication::event::{EntryFields, EntryId, StoreError, StreamEntry};
use redis::streams::{StreamId, StreamReadReply};
use redis::Value;
use tracing::{error, warn};

fn parse_entry_id(raw: &str) -> Result<EntryId, StoreError> {
    raw.parse::<EntryId>()
        .map_err(|e| StoreError::MalformedReply(e.to_string()))
}

/// Decodes a scalar field value, replacing invalid UTF-8 sequences
fn field_value(value: &Value) -> Option<String> {
    match value {
        Value::Data(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Status(status) => Some(status.to_owned()),
        Value::Int(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Converts a single entry, dropping fields which do not hold a scalar value
fn convert_stream_id(raw: &StreamId) -> Result<StreamEntry, StoreError> {
    let id = parse_entry_id(&raw.id)?;

    let fields = raw
        .map
        .iter()
        .filter_map(|(field, value)| match field_value(value) {
            Some(value) => Some((field.to_owned(), value)),
            None => {
                warn!(entry_id = %id, field = %field, "Dropping non-scalar entry field");
                None
            }
        })
        .collect::<EntryFields>();

    Ok(StreamEntry::new(id, fields))
}

/// Converts every decodable entry, a malformed entry never fails the remainder of the batch
fn convert_stream_ids<'a>(raw: impl IntoIterator<Item = &'a StreamId>) -> Vec<StreamEntry> {
    raw.into_iter()
        .filter_map(|raw| match convert_stream_id(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!(entry_id = %raw.id, error = %e, "Skipping undecodable entry");
                None
            }
        })
        .collect()
}

fn convert_read_reply(reply: &StreamReadReply, key: &str) -> Vec<StreamEntry> {
    convert_stream_ids(
        reply
            .keys
            .iter()
            .filter(|stream| stream.key == key)
            .flat_map(|stream| stream.ids.iter()),
    )
}

#[cfg(test)]
mod does {
    use super::*;
    use redis::streams::StreamKey;
    use std::collections::HashMap;

    fn raw_entry(id: &str, fields: &[(&str, Value)]) -> StreamId {
        StreamId {
            id: id.to_owned(),
            map: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn convert_stream_entries() {
        let raw = raw_entry(
            "1526919030474-0",
            &[
                ("id", Value::Data(b"42".to_vec())),
                ("user", Value::Data(b"a".to_vec())),
            ],
        );

        let entry = convert_stream_id(&raw).unwrap();

        assert_eq!(entry.id(), EntryId::new(1526919030474, 0));
        assert_eq!(entry.field("id"), Some("42"));
        assert_eq!(entry.field("user"), Some("a"));
        assert_eq!(entry.fields().len(), 2);
    }

    #[test]
    fn reject_malformed_ids() {
        let raw = raw_entry("not-an-id", &[]);

        assert!(matches!(
            convert_stream_id(&raw),
            Err(StoreError::MalformedReply(_))
        ));
    }

    #[test]
    fn drop_non_scalar_values() {
        let raw = raw_entry(
            "1-0",
            &[
                ("id", Value::Data(b"1".to_vec())),
                ("nested", Value::Bulk(vec![])),
            ],
        );

        let entry = convert_stream_id(&raw).unwrap();

        assert_eq!(entry.field("id"), Some("1"));
        assert_eq!(entry.field("nested"), None);
    }

    #[test]
    fn decode_invalid_utf8_without_failing_the_batch() {
        let reply = StreamReadReply {
            keys: vec![StreamKey {
                key: "tweets".into(),
                ids: vec![
                    raw_entry("1-0", &[("id", Value::Data(b"1".to_vec()))]),
                    raw_entry(
                        "2-0",
                        &[
                            ("id", Value::Data(b"2".to_vec())),
                            ("text", Value::Data(vec![0xff])),
                        ],
                    ),
                    raw_entry("3-0", &[("id", Value::Data(b"3".to_vec()))]),
                ],
            }],
        };

        let entries = convert_read_reply(&reply, "tweets");

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].field("id"), Some("2"));
        assert_eq!(entries[1].field("text"), Some("\u{FFFD}"));
        assert_eq!(entries[2].field("id"), Some("3"));
    }

    #[test]
    fn skip_entries_with_malformed_ids() {
        let raw = vec![
            raw_entry("1-0", &[("id", Value::Data(b"1".to_vec()))]),
            raw_entry("garbage", &[("id", Value::Data(b"2".to_vec()))]),
            raw_entry("3-0", &[("id", Value::Data(b"3".to_vec()))]),
        ];

        let ids: Vec<EntryId> = convert_stream_ids(raw.iter())
            .iter()
            .map(StreamEntry::id)
            .collect();

        assert_eq!(ids, vec![EntryId::new(1, 0), EntryId::new(3, 0)]);
    }

    #[test]
    fn ignore_entries_of_other_streams() {
        let reply = StreamReadReply {
            keys: vec![StreamKey {
                key: "other".into(),
                ids: vec![raw_entry("1-0", &[])],
            }],
        };

        assert!(convert_read_reply(&reply, "tweets").is_empty());
    }
}
