//! JSON interchange.
//!
//! Values map onto JSON with the same marker keys the notation uses: a set
//! becomes `{"__set__": [...]}` and a custom type name travels as a
//! `ClassName` entry. Decoding runs the parser's marker post-pass, so both
//! directions agree on what a marker means.

use serde_json::{Map, Number as JsonNumber, Value as JsonValue};

use super::parse::apply_markers;
use super::value::{
    Dictionary, EvalError, EvalResult, List, Number, Value, CLASS_NAME_KEY, LIST_MARKER,
    SET_MARKER,
};

/// Parse JSON text into a value.
pub fn parse_json(input: &str) -> EvalResult<Value> {
    let json: JsonValue = serde_json::from_str(input)
        .map_err(|e| EvalError::parse(format!("JSON parse error: {}", e)))?;
    Ok(from_json(json))
}

/// Convert decoded JSON into a value, resolving marker keys.
pub fn from_json(json: JsonValue) -> Value {
    apply_markers(json_to_value(json))
}

fn json_to_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => {
            let number = match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Number::Int64(i),
                (None, Some(f)) => Number::Float64(f),
                (None, None) => return Value::Str(n.to_string()),
            };
            Value::Number(number.shrink_to_smallest())
        }
        JsonValue::String(s) => Value::Str(s),
        JsonValue::Array(items) => {
            Value::List(List::from_items(items.into_iter().map(json_to_value).collect()))
        }
        JsonValue::Object(obj) => Value::Dict(Dictionary::from_entries(
            obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect(),
        )),
    }
}

/// Encode a value as JSON.
///
/// Symbols, operators, brackets and expressions become their text.
/// Non-finite floats have no JSON form and become `null`.
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::List(list) => {
            let items = array(list.iter());
            match list.class_name() {
                Some(name) => marked(name, LIST_MARKER, items),
                None => items,
            }
        }
        Value::Set(set) => {
            let items = array(set.items.iter());
            let mut obj = Map::new();
            if let Some(name) = set.class_name() {
                obj.insert(CLASS_NAME_KEY.to_string(), JsonValue::String(name.to_string()));
            }
            obj.insert(SET_MARKER.to_string(), items);
            JsonValue::Object(obj)
        }
        Value::Dict(dict) => {
            let mut obj = Map::new();
            if let Some(name) = dict.class_name() {
                obj.insert(CLASS_NAME_KEY.to_string(), JsonValue::String(name.to_string()));
            }
            for (key, item) in dict.iter() {
                obj.insert(key.clone(), to_json(item));
            }
            JsonValue::Object(obj)
        }
        Value::Symbol(_) | Value::Operator(_) | Value::Bracket(_) | Value::Expression(_) => {
            JsonValue::String(value.to_notation())
        }
    }
}

/// Serialize a value as JSON text.
pub fn to_json_string(value: &Value, pretty: bool) -> EvalResult<String> {
    let json = to_json(value);
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    text.map_err(|e| EvalError::parse(format!("JSON serialization error: {}", e)))
}

fn number_to_json(n: Number) -> JsonValue {
    if n.is_integral() {
        return n
            .as_i64()
            .map(|i| JsonValue::Number(i.into()))
            .unwrap_or(JsonValue::Null);
    }
    JsonNumber::from_f64(n.as_f64())
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn array<'a>(items: impl Iterator<Item = &'a Value>) -> JsonValue {
    JsonValue::Array(items.map(to_json).collect())
}

fn marked(class_name: &str, marker: &str, items: JsonValue) -> JsonValue {
    let mut obj = Map::new();
    obj.insert(
        CLASS_NAME_KEY.to_string(),
        JsonValue::String(class_name.to_string()),
    );
    obj.insert(marker.to_string(), items);
    JsonValue::Object(obj)
}

impl Value {
    /// Shorthand for [`to_json`].
    pub fn to_json(&self) -> JsonValue {
        to_json(self)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        from_json(json)
    }
}
