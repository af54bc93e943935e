//! The assembled, token-budgeted context returned to callers.

use serde::{Deserialize, Serialize};

/// Output of one `get_context` request. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Included document bodies (whole or truncated) in priority order.
    pub text: String,

    /// Tokens actually included. Never exceeds `token_budget`.
    pub total_tokens: usize,

    /// True when any document was cut or omitted to meet the budget.
    pub truncated: bool,

    /// Ids of the documents included, fully or partially, in order.
    pub included_ids: Vec<String>,

    /// Ids of the documents left out entirely.
    #[serde(default)]
    pub omitted_ids: Vec<String>,

    /// The budget this context was assembled for.
    pub token_budget: usize,
}

impl Context {
    /// An empty context for the given budget.
    pub fn empty(token_budget: usize, truncated: bool) -> Self {
        Self {
            token_budget,
            truncated,
            ..Self::default()
        }
    }

    /// Budget utilization percentage (0.0–100.0).
    pub fn utilization_pct(&self) -> f32 {
        if self.token_budget == 0 {
            return 0.0;
        }
        (self.total_tokens as f32 / self.token_budget as f32) * 100.0
    }
}
