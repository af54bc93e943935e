//! # onboardctx core
//!
//! Domain types, traits, and error definitions shared by every onboardctx
//! crate. Stores, the context service and the adapters all depend inward
//! on this crate.
//!
//! Every data source is a `DocumentStore`; every externally callable
//! operation is a `Tool`. Implementations live in their own crates so they
//! can be swapped via configuration and stubbed in tests.

pub mod context;
pub mod document;
pub mod error;
pub mod store;
pub mod token;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use context::Context;
pub use document::{Document, DocumentSet};
pub use error::{ContextError, Result, StoreError, ToolError};
pub use store::{DocumentStore, StaticStore};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
