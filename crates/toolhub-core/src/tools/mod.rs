//! Tool registry and dispatch.
//!
//! Tools are plain functions over a JSON argument object. Each module exposes
//! `tools()` (its definitions) and `dispatch()` (its calls); the registry
//! stitches them together.

mod arithmetic;
mod interactions;
mod text;
mod units;

pub use arithmetic::add;
pub use interactions::new_interaction_from_args;
pub use text::{TextStats, text_stats};
pub use units::{Conversion, UnitCategory, UnsupportedConversion, convert_units};

use crate::ToolError;
use crate::interactions::InteractionLog;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use toolhub_types::ToolDef;
use tracing::debug;

/// Result type for tool calls.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Registry of the callable tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
    log: Arc<InteractionLog>,
}

impl ToolRegistry {
    /// Register every tool; the interaction tools write to and read from `log`.
    pub fn new(log: Arc<InteractionLog>) -> Self {
        let mut tools = Vec::new();
        tools.extend(arithmetic::tools());
        tools.extend(units::tools());
        tools.extend(text::tools());
        tools.extend(interactions::tools());
        Self { tools, log }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Dispatch a tool call to the module that owns it.
    pub fn dispatch(&self, name: &str, args: Map<String, JsonValue>) -> ToolResult<JsonValue> {
        debug!(target: "toolhub::tools", "Dispatching tool {}", name);
        match name {
            arithmetic::ADD => arithmetic::dispatch(name, args),
            units::CONVERT_UNITS => units::dispatch(name, args),
            text::TEXT_STATS => text::dispatch(name, args),
            interactions::LOG_INTERACTION
            | interactions::GET_AGENT_LOGS
            | interactions::GET_AGENT_STATISTICS => interactions::dispatch(&self.log, name, args),
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

/// JSON Schema for tool input parameters.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        let required: Vec<&str> = vec![$($req_name),*];

        #[allow(unused_mut)]
        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), $crate::schema!(@type $req_type));)*
        $(props.insert($opt_name.to_string(), $crate::schema!(@type $opt_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only required properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? }
    }) => {{
        $crate::schema!(object { required: { $($req_name : $req_type),* }, optional: {} })
    }};

    // Object with only optional properties
    (object {
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        $crate::schema!(object { required: {}, optional: { $($opt_name : $opt_type),* } })
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type number) => { serde_json::json!({"type": "number"}) };
    (@type integer) => { serde_json::json!({"type": "integer"}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
    (@type object) => { serde_json::json!({"type": "object"}) };
    (@type any) => { serde_json::json!({}) };
}

/// Required string argument.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> ToolResult<String> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(ToolError::MissingArg(name.to_string())),
        Some(v) => v
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| invalid(name, "expected a string")),
    }
}

/// Optional string argument; explicit nulls count as absent.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> ToolResult<Option<String>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(_) => get_string_arg(args, name).map(Some),
    }
}

/// Required integer argument.
pub fn get_i64_arg(args: &Map<String, JsonValue>, name: &str) -> ToolResult<i64> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(ToolError::MissingArg(name.to_string())),
        Some(v) => v.as_i64().ok_or_else(|| invalid(name, "expected an integer")),
    }
}

/// Required numeric argument.
pub fn get_f64_arg(args: &Map<String, JsonValue>, name: &str) -> ToolResult<f64> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(ToolError::MissingArg(name.to_string())),
        Some(v) => v.as_f64().ok_or_else(|| invalid(name, "expected a number")),
    }
}

pub fn get_optional_f64(args: &Map<String, JsonValue>, name: &str) -> ToolResult<Option<f64>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(_) => get_f64_arg(args, name).map(Some),
    }
}

pub fn get_optional_u64(args: &Map<String, JsonValue>, name: &str) -> ToolResult<Option<u64>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid(name, "expected a non-negative integer")),
    }
}

/// Optional JSON object argument.
pub fn get_optional_object(
    args: &Map<String, JsonValue>,
    name: &str,
) -> ToolResult<Option<Map<String, JsonValue>>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(invalid(name, "expected an object")),
    }
}

fn invalid(name: &str, reason: &str) -> ToolError {
    ToolError::InvalidArg {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
