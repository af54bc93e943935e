//! Token-budget assembly: fit a document set into a single context string.
//!
//! Documents are taken greedily in priority order. A document that fits is
//! included whole; the first one that does not fit is cut at a word
//! boundary to fill the remaining budget; everything after it is omitted.
//!
//! # Determinism
//!
//! Assembly is a pure function of the document set, the budget and the
//! delimiter. Equal priorities keep their order in the set.

use onboardctx_core::context::Context;
use onboardctx_core::document::DocumentSet;
use onboardctx_core::token;
use tracing::debug;

/// Default separator between included document bodies.
pub const DEFAULT_DELIMITER: &str = "\n\n";

/// The context assembler. Stateless; create one and reuse it.
#[derive(Debug, Clone)]
pub struct TokenBudgetAssembler {
    delimiter: String,
}

impl Default for TokenBudgetAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl TokenBudgetAssembler {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Assemble the highest-priority content of `set` within `token_budget`.
    ///
    /// # Algorithm
    ///
    /// 1. Walk documents by ascending priority with `remaining = token_budget`
    /// 2. Whole document fits → include it, `remaining -= estimated_tokens`
    /// 3. Otherwise, while budget remains → include the first `remaining`
    ///    words of its body and stop spending
    /// 4. Anything left is omitted; cutting or omitting sets `truncated`
    pub fn assemble(&self, set: &DocumentSet, token_budget: usize) -> Context {
        if set.is_empty() {
            return Context::empty(token_budget, false);
        }
        if token_budget == 0 {
            let mut context = Context::empty(0, true);
            context.omitted_ids = set.by_priority().iter().map(|d| d.id.clone()).collect();
            debug!(repo = %set.repo_name(), omitted = context.omitted_ids.len(), "Zero budget");
            return context;
        }

        let mut remaining = token_budget;
        let mut total_tokens = 0;
        let mut sections: Vec<&str> = Vec::new();
        let mut included_ids = Vec::new();
        let mut omitted_ids = Vec::new();
        let mut truncated = false;

        for doc in set.by_priority() {
            if doc.estimated_tokens <= remaining {
                sections.push(&doc.body);
                included_ids.push(doc.id.clone());
                remaining -= doc.estimated_tokens;
                total_tokens += doc.estimated_tokens;
                continue;
            }

            truncated = true;
            if remaining == 0 {
                omitted_ids.push(doc.id.clone());
                continue;
            }

            let (prefix, taken) = token::truncate_to_tokens(&doc.body, remaining);
            if taken == 0 {
                omitted_ids.push(doc.id.clone());
                continue;
            }
            sections.push(prefix);
            included_ids.push(doc.id.clone());
            total_tokens += taken;
            remaining = 0;
        }

        debug!(
            repo = %set.repo_name(),
            budget = token_budget,
            total_tokens,
            included = included_ids.len(),
            omitted = omitted_ids.len(),
            truncated,
            "Context assembled"
        );

        Context {
            text: sections.join(&self.delimiter),
            total_tokens,
            truncated,
            included_ids,
            omitted_ids,
            token_budget,
        }
    }
}
