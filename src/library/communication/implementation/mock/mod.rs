mod sink;
mod store;

pub use sink::*;
pub use store::*;
