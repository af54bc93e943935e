//! The onboarding context tools.
//!
//! Two tools share one implementation and differ only in whether
//! code-reference documents are admitted:
//! `get_onboarding_context_with_code` and `get_onboarding_context_without_code`.

use async_trait::async_trait;
use onboardctx_context::ContextService;
use onboardctx_core::error::{ContextError, ToolError};
use onboardctx_core::tool::{Tool, ToolRegistry, ToolResult};
use serde_json::{Value, json};

pub const WITH_CODE: &str = "get_onboarding_context_with_code";
pub const WITHOUT_CODE: &str = "get_onboarding_context_without_code";

pub struct OnboardingContextTool {
    service: ContextService,
    include_code: bool,
    default_budget: i64,
}

impl OnboardingContextTool {
    pub fn new(service: ContextService, include_code: bool, default_budget: i64) -> Self {
        Self {
            service,
            include_code,
            default_budget,
        }
    }

    fn parse_arguments(&self, arguments: &Value) -> Result<(String, i64), ContextError> {
        let repo_name = arguments
            .get("repo_name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ContextError::InvalidArgument("'repo_name' must be a string".into())
            })?;

        let token_budget = match arguments.get("token_budget") {
            None | Some(Value::Null) => self.default_budget,
            Some(value) => value.as_i64().ok_or_else(|| {
                ContextError::InvalidArgument(format!(
                    "'token_budget' must be an integer, got {value}"
                ))
            })?,
        };

        Ok((repo_name.to_string(), token_budget))
    }
}

/// The structured payload of a failed call.
pub fn error_payload(err: &ContextError) -> Value {
    json!({
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
        }
    })
}

#[async_trait]
impl Tool for OnboardingContextTool {
    fn name(&self) -> &str {
        if self.include_code { WITH_CODE } else { WITHOUT_CODE }
    }

    fn description(&self) -> &str {
        if self.include_code {
            "Get the architecture onboarding context of a repository, including \
             code reference sections, trimmed to a token budget."
        } else {
            "Get the architecture onboarding context of a repository as prose \
             only (no code references), trimmed to a token budget."
        }
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": {
                    "type": "string",
                    "description": "Name of the repository whose onboarding documents to load"
                },
                "token_budget": {
                    "type": "integer",
                    "minimum": 0,
                    "description": format!(
                        "Maximum number of tokens to return (default {})",
                        self.default_budget
                    )
                }
            },
            "required": ["repo_name"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let outcome = match self.parse_arguments(&arguments) {
            Ok((repo_name, budget)) => {
                self.service
                    .get_context(&repo_name, budget, self.include_code)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(context) => {
                let data = serde_json::to_value(&context).map_err(|e| {
                    ToolError::ExecutionFailed {
                        tool_name: self.name().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(ToolResult::ok(context.text, Some(data)))
            }
            Err(e) => Ok(ToolResult::failed(e.to_string(), Some(error_payload(&e)))),
        }
    }
}

/// Both context tools, registered against one service.
pub fn registry(service: ContextService, default_budget: i64) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(OnboardingContextTool::new(
        service.clone(),
        true,
        default_budget,
    )));
    registry.register(Box::new(OnboardingContextTool::new(
        service,
        false,
        default_budget,
    )));
    registry
}
