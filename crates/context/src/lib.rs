//! # onboardctx context
//!
//! Turns a repository name and a token budget into a `Context`: the
//! service validates and loads, the assembler packs documents into the
//! budget.

pub mod assembler;
pub mod service;

pub use assembler::{DEFAULT_DELIMITER, TokenBudgetAssembler};
pub use service::{ContextService, normalize_repo_name};
