use super::RemoteError;
use serde_json::{json, Number, Value};
use std::str::FromStr;

/// Typed input passed to a remote workflow execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionParameter {
    pub name: String,
    pub type_name: String,
    pub value: Value,
}

impl ExecutionParameter {
    /// Parse `name[:type]=value`; the type defaults to `string`.
    pub fn parse(spec: &str) -> Result<Self, RemoteError> {
        let fail = |reason: &str| RemoteError::Parameter {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };
        let (key, raw) = spec.split_once('=').ok_or_else(|| fail("expected name=value"))?;
        let (name, type_name) = match key.split_once(':') {
            Some((name, type_name)) => (name.trim(), type_name.trim()),
            None => (key.trim(), "string"),
        };
        if name.is_empty() {
            return Err(fail("parameter name is empty"));
        }

        let value = match type_name {
            "string" | "SecureString" => Value::String(raw.to_string()),
            "number" => {
                let parsed = f64::from_str(raw.trim()).map_err(|_| fail("value is not a number"))?;
                Number::from_f64(parsed)
                    .map(Value::Number)
                    .ok_or_else(|| fail("value is not a finite number"))?
            }
            "boolean" => Value::Bool(
                bool::from_str(raw.trim()).map_err(|_| fail("value must be true or false"))?,
            ),
            _ => return Err(fail("supported types are string, number, boolean, SecureString")),
        };

        Ok(Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            value,
        })
    }

    /// JSON shape expected by the executions endpoint.
    pub fn to_payload(&self) -> Value {
        let mut typed = serde_json::Map::new();
        typed.insert(self.type_name.clone(), json!({ "value": self.value }));
        json!({
            "name": self.name,
            "type": self.type_name,
            "scope": "local",
            "value": Value::Object(typed),
        })
    }
}
