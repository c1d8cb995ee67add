//! This library crate contains everything needed to index a stream of tweets with at-least-once guarantees.
//!
//! Submodules have been introduced to split responsibilities. Each module has a specific focus
//! and they together form a chain of dependencies from the low-level [`library`], over the tweet [`domain`]
//! specific logic, through the executable [`harness`], up to the high-level [`modules`](module).

#![deny(missing_docs)]

pub mod domain;
pub mod harness;
pub mod library;
pub mod module;
