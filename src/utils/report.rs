//! Machine-readable summaries of parsed values.

use serde::Serialize;

use crate::core::engine::{to_json, Value};

/// What `dynval inspect` prints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValueReport {
    pub type_name: String,
    pub kind: String,
    pub notation: String,
    /// Element or entry count for containers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
    /// Variables of an expression, with their bound values if any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableRecord>,
    pub json: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableRecord {
    pub name: String,
    pub value: Option<String>,
}

impl ValueReport {
    pub fn new(value: &Value) -> Self {
        let len = match value {
            Value::List(list) => Some(list.len()),
            Value::Set(set) => Some(set.len()),
            Value::Dict(dict) => Some(dict.len()),
            _ => None,
        };
        let variables = match value {
            Value::Expression(expr) => {
                let vars = expr.variables();
                vars.names()
                    .map(|name| VariableRecord {
                        name: name.to_string(),
                        value: vars.get(name).map(Value::to_notation),
                    })
                    .collect()
            }
            _ => Vec::new(),
        };
        Self {
            type_name: value.type_name().to_string(),
            kind: value.val_type().name().to_string(),
            notation: value.to_notation(),
            len,
            variables,
            json: to_json(value),
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_for_container() {
        let report = ValueReport::new(&parse("{ClassName: Point, x: 1, y: 2}").unwrap());
        assert_eq!(report.type_name, "Point");
        assert_eq!(report.kind, "Dictionary");
        assert_eq!(report.len, Some(2));
        assert!(report.variables.is_empty());

        let json: serde_json::Value = serde_json::from_str(&report.to_json_string()).unwrap();
        assert_eq!(json["type-name"], "Point");
        assert!(json.get("variables").is_none());
    }

    #[test]
    fn test_report_lists_expression_variables() {
        let report = ValueReport::new(&parse("price * qty").unwrap());
        assert_eq!(report.kind, "Expression");
        let names: Vec<&str> = report.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["price", "qty"]);
        assert!(report.variables.iter().all(|v| v.value.is_none()));
    }
}
