//! Structures to reliably consume an append-only log through consumer groups
//!
//! Producers append entries to a stream. Consumers register with a group, claim entries nobody
//! else in the group has seen yet, and acknowledge them once their side effects are durable.
//! Anything claimed but never acknowledged remains in the group's pending entries list where it
//! can later be recovered by another consumer. The result is at-least-once delivery: entries may
//! be processed more than once but are never silently dropped.
//!
//! The protocol itself lives in [`event`] and is expressed against storage traits. The
//! [`implementation`] module provides the Redis Streams backend.

mod error;

pub mod event;
pub mod implementation;

pub use error::ErrorChain;
