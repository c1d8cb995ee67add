//! Runtime harness to execute modules with a managed lifecycle

mod heart;
mod module;
mod redis;

pub use self::redis::*;
pub use heart::*;
pub use module::*;
