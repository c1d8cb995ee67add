//! Structures to consume streams of entries reliably
//!
//! Entries are stored in an append-only, log-like data structure (an [`EntryStore`]). Instead of
//! simply reading from it, services join a [`ConsumerGroup`](ConsumerGroupDescriptor) and claim
//! entries which have never been delivered to any other member of the group. Each new entry is
//! thus handed to exactly one consumer, effectively implementing load balancing and simple,
//! dynamic scalability.
//!
//! All claimed entries have to be acknowledged once processing concludes. Until then they remain
//! in the group's pending entries list. When a [`Consumer`](ConsumerIdentifier) crashes or fails
//! to process an entry, the [`Reclaimer`] may later transfer it to another consumer and process it
//! again. This yields at-least-once semantics: no entry is silently dropped but some may be
//! processed more than once, so writes into the [`MaterializationSink`] have to be idempotent.

mod admission;
mod consumer;
mod consumer_group;
mod entry;
mod processor;
mod queue;
mod reclaim;
mod sink;
mod store;

pub use admission::*;
pub use consumer::*;
pub use consumer_group::*;
pub use entry::*;
pub use processor::*;
pub use queue::*;
pub use reclaim::*;
pub use sink::*;
pub use store::*;
