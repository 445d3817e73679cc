//! UIA command serialization.
//!
//! A [`Command`] is a UIA function name plus positional arguments. It is sent
//! to the on-device engine as a single JavaScript-like invocation string:
//!
//! ```text
//! uia.<name>(<arg1>, <arg2>, ...)
//! ```
//!
//! Each argument is encoded by [`serialize_argument`]:
//!
//! | Value | Encoded |
//! |-------|---------|
//! | string | `'text'` (quotes and newlines escaped) |
//! | `true` / `false` | `'true'` / `'false'` |
//! | `null` | `'nil'` |
//! | array | `'[1 2 3]'` (EDN vector) |
//! | object | `'{:a "b"}'` (EDN map) |
//! | number | `1`, `2.5` (bare EDN) |
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use uiaroute_core::command::serialize_command;
//!
//! let cmd = serialize_command("tapOffset", &[json!(1), json!(2), json!(3)]);
//! assert_eq!(cmd, "uia.tapOffset(1, 2, 3)");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::edn::to_edn;
use crate::text::{escape_single_quotes, escape_uia_string};

/// Namespace object the UIA engine exposes its functions on.
pub const UIA_NAMESPACE: &str = "uia";

/// A named UIA invocation with positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// The UIA function name (e.g. `tapOffset`).
    pub name: String,
    /// Positional arguments, encoded in order.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Command {
    /// Creates a command from a name and its arguments.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Renders this command as a `uia.<name>(...)` invocation string.
    pub fn serialize(&self) -> String {
        serialize_command(&self.name, &self.args)
    }
}

/// Encodes a single argument in the backend's quoted-literal form.
pub fn serialize_argument(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", escape_uia_string(s)),
        Value::Bool(b) => format!("'{}'", b),
        Value::Null => "'nil'".to_string(),
        Value::Array(_) | Value::Object(_) => {
            format!("'{}'", escape_single_quotes(&to_edn(value)))
        }
        Value::Number(_) => to_edn(value),
    }
}

/// Encodes every argument, preserving order.
pub fn serialize_arguments(args: &[Value]) -> Vec<String> {
    args.iter().map(serialize_argument).collect()
}

/// Builds the `uia.<name>(<args>)` invocation string.
///
/// `name` is written verbatim; callers pass a valid UIA function name.
pub fn serialize_command(name: &str, args: &[Value]) -> String {
    format!(
        "{}.{}({})",
        UIA_NAMESPACE,
        name,
        serialize_arguments(args).join(", ")
    )
}

/// Builds the JSON body posted on the `uia` route for a serialized command.
pub fn make_uia_parameters(serialized: &str) -> Value {
    json!({ "command": serialized })
}
