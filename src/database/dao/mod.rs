mod mcp;
mod mcp_set;
mod rule;
mod settings;
mod sync_config;
mod sync_history;
mod sync_state;

pub use mcp_set::ACTIVE_MCP_SET_KEY;
