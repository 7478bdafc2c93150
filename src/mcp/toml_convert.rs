use serde_json::{Map, Value};
use toml_edit::{Array, InlineTable, Item, Table, TableLike};

use crate::error::AppError;

/// Generic JSON value to TOML value converter
///
/// - String / Number / Boolean map to their TOML scalars
/// - Arrays convert element-wise (null elements are dropped)
/// - Objects become inline tables at any depth
/// - null has no TOML representation and returns None
pub fn json_value_to_toml_value(value: &Value, field_name: &str) -> Option<toml_edit::Value> {
    match value {
        Value::String(s) => Some(s.as_str().into()),

        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.into())
            } else if let Some(f) = n.as_f64() {
                Some(f.into())
            } else {
                log::warn!("Skipping field '{field_name}': unconvertible number {n}");
                None
            }
        }

        Value::Bool(b) => Some((*b).into()),

        Value::Array(arr) => {
            let mut toml_arr = Array::default();
            for item in arr {
                if let Some(v) = json_value_to_toml_value(item, field_name) {
                    toml_arr.push(v);
                }
            }
            Some(toml_edit::Value::Array(toml_arr))
        }

        Value::Object(obj) => {
            let mut inline_table = InlineTable::new();
            for (k, v) in obj {
                if let Some(tv) = json_value_to_toml_value(v, k) {
                    inline_table.insert(k, tv);
                }
            }
            Some(toml_edit::Value::InlineTable(inline_table))
        }

        Value::Null => {
            log::debug!("Skipping field '{field_name}': TOML has no null");
            None
        }
    }
}

/// Convert one JSON server entry to a standard TOML table.
///
/// Top-level object fields (`env`, `headers`, ...) are emitted as sub-tables
/// (`[mcp_servers.<name>.env]`), everything nested deeper as inline values.
pub fn json_server_to_toml_table(spec: &Value) -> Result<Table, AppError> {
    let obj = spec
        .as_object()
        .ok_or_else(|| AppError::validation("MCP server entry must be an object"))?;

    let mut t = Table::new();
    for (key, value) in obj {
        match value {
            Value::Object(fields) => {
                let mut sub = Table::new();
                for (k, v) in fields {
                    if let Some(tv) = json_value_to_toml_value(v, k) {
                        sub.insert(k, Item::Value(tv));
                    }
                }
                t.insert(key, Item::Table(sub));
            }
            other => {
                if let Some(tv) = json_value_to_toml_value(other, key) {
                    t.insert(key, Item::Value(tv));
                }
            }
        }
    }

    Ok(t)
}

/// TOML item to JSON. Standard tables and inline tables convert identically,
/// so `env = { K = "v" }` and `[x.env]` read back as the same object.
pub fn toml_item_to_json(item: &Item) -> Option<Value> {
    match item {
        Item::None => None,
        Item::Value(v) => toml_value_to_json(v),
        Item::Table(t) => Some(table_like_to_json(t)),
        Item::ArrayOfTables(arr) => Some(Value::Array(
            arr.iter().map(|t| table_like_to_json(t)).collect(),
        )),
    }
}

pub fn toml_value_to_json(value: &toml_edit::Value) -> Option<Value> {
    use toml_edit::Value as T;

    match value {
        T::String(s) => Some(Value::String(s.value().clone())),
        T::Integer(i) => Some(Value::from(*i.value())),
        T::Float(f) => serde_json::Number::from_f64(*f.value()).map(Value::Number),
        T::Boolean(b) => Some(Value::Bool(*b.value())),
        T::Datetime(d) => Some(Value::String(d.value().to_string())),
        T::Array(arr) => Some(Value::Array(
            arr.iter().filter_map(toml_value_to_json).collect(),
        )),
        T::InlineTable(t) => Some(table_like_to_json(t)),
    }
}

pub fn table_like_to_json(table: &dyn TableLike) -> Value {
    let mut map = Map::new();
    for (k, item) in table.iter() {
        if let Some(v) = toml_item_to_json(item) {
            map.insert(k.to_string(), v);
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toml_edit::DocumentMut;

    fn entry(doc: &DocumentMut, name: &str) -> Value {
        toml_item_to_json(&doc["mcp_servers"][name]).expect("entry converts")
    }

    #[test]
    fn env_reads_the_same_from_inline_and_sub_table() {
        let inline: DocumentMut = r#"
[mcp_servers.a]
command = "node"
env = { TOKEN = "x", MODE = "dev" }
"#
        .parse()
        .expect("parse inline");
        let sub: DocumentMut = r#"
[mcp_servers.a]
command = "node"

[mcp_servers.a.env]
TOKEN = "x"
MODE = "dev"
"#
        .parse()
        .expect("parse sub-table");

        assert_eq!(entry(&inline, "a"), entry(&sub, "a"));
        assert_eq!(entry(&sub, "a")["env"], json!({"TOKEN": "x", "MODE": "dev"}));
    }

    #[test]
    fn server_table_round_trips_through_json() {
        let spec = json!({
            "command": "npx",
            "args": ["-y", "@mcp/fs"],
            "env": {"ROOT": "/tmp"},
            "startup_timeout_sec": 30,
            "trust": true,
            "tools": {"allow": ["read"], "limits": {"max": 2}}
        });

        let table = json_server_to_toml_table(&spec).expect("convert");
        let mut doc = DocumentMut::new();
        doc["mcp_servers"] = Item::Table(Table::new());
        doc["mcp_servers"]["fs"] = Item::Table(table);

        let reparsed: DocumentMut = doc.to_string().parse().expect("reparse");
        assert_eq!(entry(&reparsed, "fs"), spec);
        assert!(doc.to_string().contains("[mcp_servers.fs.env]"));
    }

    #[test]
    fn null_fields_are_dropped() {
        let table = json_server_to_toml_table(&json!({"command": "x", "cwd": null}))
            .expect("convert");
        assert!(table.get("cwd").is_none());
        assert!(table.get("command").is_some());
    }

    #[test]
    fn non_object_entry_is_rejected() {
        let err = json_server_to_toml_table(&json!("nope")).expect_err("must fail");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
