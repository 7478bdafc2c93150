// ============================================================================
// MCP Module - server definitions, sets and on-disk config formats
// ============================================================================

mod format;
mod toml_convert;
mod types;
mod validation;

pub use format::{ConfigDocument, SyncFormat};
pub use types::{McpDefinition, McpDefinitionPatch, McpSet, McpSetItem, McpSetPatch};
pub use validation::{validate_definition, validate_set_name};
