//! Independent and project agnostic libraries
//!
//! Nothing in here knows about tweets. The stream consumption protocol is expressed against
//! the [`EntryStore`](communication::event::EntryStore) and
//! [`MaterializationSink`](communication::event::MaterializationSink) traits while everything
//! domain specific lives in the [`domain`](super::domain) module.

pub mod communication;
pub mod helpers;

/// Generic error type
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result with no value and a [`BoxedError`]
pub type EmptyResult = Result<(), BoxedError>;
