//! Interaction logging, analytics, tools, prompts and resources for toolhub.

mod dates;
mod error;
mod interactions;
pub mod prompts;
pub mod resources;
mod serialize;
pub mod store;
pub mod tools;

pub use dates::{DateBound, parse_date_bound};
pub use error::{StoreError, ToolError};
pub use interactions::InteractionLog;
pub use prompts::PromptRegistry;
pub use serialize::{serialize_document, serialize_value};
pub use store::{Collection, DocumentClient, DocumentCollection};
pub use tools::ToolRegistry;

/// Result type for store and interaction operations.
pub type Result<T> = std::result::Result<T, StoreError>;
