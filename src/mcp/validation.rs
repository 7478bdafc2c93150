use crate::error::AppError;

use super::types::McpDefinition;

/// Shape checks that do not need the pool: non-empty name and command, non-empty env keys
pub fn validate_definition(def: &McpDefinition) -> Result<(), AppError> {
    if def.name.trim().is_empty() {
        return Err(AppError::validation("MCP definition name must not be empty"));
    }
    if def.name.trim() != def.name {
        return Err(AppError::validation(format!(
            "MCP definition name '{}' has surrounding whitespace",
            def.name
        )));
    }
    if def.command.trim().is_empty() {
        return Err(AppError::validation(format!(
            "MCP definition '{}' is missing a command",
            def.name
        )));
    }
    if let Some(env) = &def.env {
        if env.keys().any(|k| k.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "MCP definition '{}' has an empty env key",
                def.name
            )));
        }
    }
    Ok(())
}

/// Reject a set name that is blank after trimming
pub fn validate_set_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("MCP set name must not be empty"));
    }
    Ok(())
}
