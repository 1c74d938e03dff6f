//! Shared types for toolhub.

mod document;
mod interaction;
mod tool;

pub use document::*;
pub use interaction::*;
pub use tool::*;
