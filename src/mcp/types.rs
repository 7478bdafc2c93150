use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Reusable MCP server definition owned by the pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McpDefinition {
    pub id: String,
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl McpDefinition {
    /// Entry written under the container key of a target config.
    ///
    /// `env` and `cwd` are only emitted when they carry a value so that
    /// minimal definitions produce minimal entries.
    pub fn to_server_spec(&self) -> Value {
        let mut spec = Map::new();
        spec.insert("command".into(), json!(self.command));
        spec.insert("args".into(), json!(self.args));
        if let Some(env) = self.env.as_ref().filter(|env| !env.is_empty()) {
            spec.insert("env".into(), json!(env));
        }
        if let Some(cwd) = self.cwd.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            spec.insert("cwd".into(), json!(cwd));
        }
        Value::Object(spec)
    }
}

/// Fields accepted by `McpService::update_definition`; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpDefinitionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub env: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Weak reference from a set to a pool definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McpSetItem {
    pub server_id: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub order_index: i64,
}

impl McpSetItem {
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            disabled: false,
            order_index: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McpSet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<McpSetItem>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpSetPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Replaces the item list wholesale
    #[serde(default)]
    pub items: Option<Vec<McpSetItem>>,
    #[serde(default)]
    pub is_archived: Option<bool>,
}
