//! Arithmetic tools.
//!
//! Tools: add

use super::{ToolResult, get_i64_arg};
use crate::ToolError;
use crate::schema;
use serde_json::{Map, Value as JsonValue};
use toolhub_types::ToolDef;

pub(super) const ADD: &str = "add";

pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        ADD,
        "Add two integers and return their sum.",
        schema!(object {
            required: { "a": integer, "b": integer }
        }),
    )]
}

pub fn dispatch(name: &str, args: Map<String, JsonValue>) -> ToolResult<JsonValue> {
    match name {
        ADD => {
            let a = get_i64_arg(&args, "a")?;
            let b = get_i64_arg(&args, "b")?;
            Ok(JsonValue::from(add(a, b)?))
        }
        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}

/// Sum of two integers; overflow is an error rather than a wrap.
pub fn add(a: i64, b: i64) -> ToolResult<i64> {
    a.checked_add(b)
        .ok_or_else(|| ToolError::Failed(format!("{a} + {b} overflows a 64-bit integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add() {
        assert_eq!(add(2, 3).unwrap(), 5);
        assert_eq!(add(-7, 4).unwrap(), -3);
        assert!(matches!(add(i64::MAX, 1), Err(ToolError::Failed(_))));
    }

    #[test]
    fn test_dispatch_reads_integer_args() {
        let args = json!({"a": 40, "b": 2}).as_object().cloned().unwrap();
        assert_eq!(dispatch(ADD, args).unwrap(), json!(42));

        let args = json!({"a": 1.5, "b": 2}).as_object().cloned().unwrap();
        assert!(matches!(dispatch(ADD, args), Err(ToolError::InvalidArg { .. })));
    }
}
