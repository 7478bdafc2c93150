use indexmap::IndexMap;

use crate::database::now_millis;
use crate::error::AppError;
use crate::mcp::{
    validate_definition, validate_set_name, McpDefinition, McpDefinitionPatch, McpSet,
    McpSetItem, McpSetPatch,
};
use crate::store::AppState;

/// Definition pool and set management
pub struct McpService;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl McpService {
    pub fn list_definitions(state: &AppState) -> Result<IndexMap<String, McpDefinition>, AppError> {
        state.db.get_all_mcp_definitions()
    }

    pub fn get_definition(state: &AppState, id: &str) -> Result<McpDefinition, AppError> {
        state
            .db
            .get_mcp_definition(id)?
            .ok_or_else(|| AppError::not_found(format!("MCP definition '{id}'")))
    }

    /// Store a new definition under a fresh id; any id on the input is ignored
    pub fn create_definition(
        state: &AppState,
        def: McpDefinition,
    ) -> Result<McpDefinition, AppError> {
        let mut def = def;
        def.id = new_id();
        def.name = def.name.trim().to_string();
        def.description = non_blank(def.description);
        def.cwd = non_blank(def.cwd);
        validate_definition(&def)?;
        Self::ensure_unique_name(state, &def)?;

        state.db.save_mcp_definition(&def)?;
        log::info!("Created MCP definition '{}' ({})", def.name, def.id);
        Ok(def)
    }

    pub fn update_definition(
        state: &AppState,
        id: &str,
        patch: McpDefinitionPatch,
    ) -> Result<McpDefinition, AppError> {
        let mut def = Self::get_definition(state, id)?;

        if let Some(name) = patch.name {
            def.name = name.trim().to_string();
        }
        if let Some(command) = patch.command {
            def.command = command;
        }
        if let Some(args) = patch.args {
            def.args = args;
        }
        if let Some(env) = patch.env {
            def.env = if env.is_empty() { None } else { Some(env) };
        }
        if let Some(description) = patch.description {
            def.description = non_blank(Some(description));
        }
        if let Some(cwd) = patch.cwd {
            def.cwd = non_blank(Some(cwd));
        }

        validate_definition(&def)?;
        Self::ensure_unique_name(state, &def)?;
        state.db.save_mcp_definition(&def)?;
        Ok(def)
    }

    /// Remove a definition and every set item pointing at it
    pub fn delete_definition(state: &AppState, id: &str) -> Result<(), AppError> {
        let pruned = state.db.delete_mcp_definition(id)?;
        log::info!("Deleted MCP definition {id}, pruned {pruned} set item(s)");
        Ok(())
    }

    fn ensure_unique_name(state: &AppState, def: &McpDefinition) -> Result<(), AppError> {
        if let Some(existing) = state.db.find_mcp_definition_by_name(&def.name)? {
            if existing.id != def.id {
                return Err(AppError::validation(format!(
                    "MCP definition named '{}' already exists",
                    def.name
                )));
            }
        }
        Ok(())
    }

    pub fn list_sets(state: &AppState, include_archived: bool) -> Result<Vec<McpSet>, AppError> {
        state.db.get_all_mcp_sets(include_archived)
    }

    pub fn get_set(state: &AppState, id: &str) -> Result<McpSet, AppError> {
        state
            .db
            .get_mcp_set(id)?
            .ok_or_else(|| AppError::not_found(format!("MCP set '{id}'")))
    }

    pub fn get_active_set(state: &AppState) -> Result<Option<McpSet>, AppError> {
        match state.db.get_active_mcp_set_id()? {
            Some(id) => state.db.get_mcp_set(&id),
            None => Ok(None),
        }
    }

    /// Create a set; the first set ever created becomes the active one
    pub fn create_set(
        state: &AppState,
        name: &str,
        items: Vec<McpSetItem>,
        description: Option<String>,
    ) -> Result<McpSet, AppError> {
        validate_set_name(name)?;
        let now = now_millis();
        let set = McpSet {
            id: new_id(),
            name: name.trim().to_string(),
            description: non_blank(description),
            items,
            is_active: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        let stored = state.db.insert_mcp_set(&set)?;
        if stored.is_active {
            log::info!("MCP set '{}' is the first set and was activated", stored.name);
        }
        Ok(stored)
    }

    pub fn update_set(state: &AppState, id: &str, patch: McpSetPatch) -> Result<McpSet, AppError> {
        let mut set = Self::get_set(state, id)?;

        if let Some(name) = patch.name {
            validate_set_name(&name)?;
            set.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            set.description = non_blank(Some(description));
        }
        if let Some(items) = patch.items {
            set.items = items;
        }
        if let Some(archived) = patch.is_archived {
            set.is_archived = archived;
        }

        state.db.update_mcp_set(&set)
    }

    /// Refused with `Conflict` while the set is active
    pub fn delete_set(state: &AppState, id: &str) -> Result<(), AppError> {
        state.db.delete_mcp_set(id)?;
        log::info!("Deleted MCP set {id}");
        Ok(())
    }

    pub fn set_active(state: &AppState, id: &str) -> Result<(), AppError> {
        state.db.set_active_mcp_set(id)?;
        log::info!("Activated MCP set {id}");
        Ok(())
    }
}
