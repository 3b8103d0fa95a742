//! Tool domain traits
//!
//! Pure argument validation against a descriptor's schema. Dispatch itself
//! lives behind the application layer's `ToolSession` port.

use super::entities::{ToolCallRequest, ToolDescriptor};

/// Validator for tool call arguments
///
/// Checks a request against the descriptor discovered from the tool server
/// without any I/O, so obviously broken calls never reach the wire.
pub trait ArgumentValidator {
    /// Validate a request against its descriptor
    fn validate(&self, request: &ToolCallRequest, descriptor: &ToolDescriptor)
    -> Result<(), String>;
}

/// Default implementation of ArgumentValidator
///
/// Only enforces what the schema states explicitly: `required` entries must
/// be present, and unknown arguments are rejected when
/// `additionalProperties` is `false`. Type checking is left to the server.
#[derive(Debug, Clone, Default)]
pub struct DefaultArgumentValidator;

impl ArgumentValidator for DefaultArgumentValidator {
    fn validate(
        &self,
        request: &ToolCallRequest,
        descriptor: &ToolDescriptor,
    ) -> Result<(), String> {
        for param in descriptor.required_parameters() {
            if !request.arguments.contains_key(param) {
                return Err(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param, descriptor.name
                ));
            }
        }

        if descriptor.rejects_unknown_parameters() {
            let declared = descriptor.declared_parameters();
            for arg_name in request.arguments.keys() {
                if !declared.contains(&arg_name.as_str()) {
                    return Err(format!(
                        "Unknown parameter '{}' for tool '{}'",
                        arg_name, descriptor.name
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_tool(strict: bool) -> ToolDescriptor {
        ToolDescriptor::new("search", "Search").with_schema(serde_json::json!({
            "type": "object",
            "properties": {"q": {"type": "string"}},
            "required": ["q"],
            "additionalProperties": !strict
        }))
    }

    #[test]
    fn test_validator_missing_required() {
        let validator = DefaultArgumentValidator;
        let result = validator.validate(&ToolCallRequest::new("search"), &search_tool(false));
        assert!(result.unwrap_err().contains("Missing required parameter 'q'"));
    }

    #[test]
    fn test_validator_unknown_param_when_strict() {
        let validator = DefaultArgumentValidator;
        let request = ToolCallRequest::new("search")
            .with_arg("q", "x")
            .with_arg("page", 2);

        assert!(validator.validate(&request, &search_tool(false)).is_ok());
        let err = validator.validate(&request, &search_tool(true)).unwrap_err();
        assert!(err.contains("Unknown parameter 'page'"));
    }

    #[test]
    fn test_validator_valid_call() {
        let validator = DefaultArgumentValidator;
        let request = ToolCallRequest::new("search").with_arg("q", "x");
        assert!(validator.validate(&request, &search_tool(true)).is_ok());
    }
}
