#![forbid(unsafe_code)]

pub mod model;
pub mod scope;
pub mod time;

pub use scope::{ResolvedScope, Scope};
pub use time::Clock;
