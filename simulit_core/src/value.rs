//! Dynamically typed leaf values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of types a leaf may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Text,
}

impl ValueType {
    /// Short tag handed to presentation layers.
    pub fn tag(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
        }
    }

    /// Parses user input (CLI, text fields) as a value of this type.
    pub fn parse(&self, input: &str) -> Option<Value> {
        let trimmed = input.trim();
        match self {
            ValueType::Int => trimmed.parse::<i64>().ok().map(Value::Int),
            ValueType::Float => trimmed.parse::<f64>().ok().map(Value::Float),
            ValueType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueType::Text => Some(Value::Text(input.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single leaf value.
///
/// Replaces type-erased storage: reads and writes go through explicit
/// matching, so a relocated container can never leave a dangling view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Returns the dynamic type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::Text(_) => ValueType::Text,
        }
    }

    /// Converts this value to `target`, if the conversion is lossless.
    ///
    /// The only cross-type conversion is integer to float.
    pub fn coerce(self, target: ValueType) -> Option<Value> {
        match (self, target) {
            (Value::Int(v), ValueType::Float) => Some(Value::Float(v as f64)),
            (value, target) if value.value_type() == target => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Rust types that can back a leaf.
///
/// Implemented for `i64`, `f64`, `bool` and `String`; this is what lets a
/// declaration stay strongly typed while storage stays a [`Value`].
pub trait VariableType: Sized + Clone + Send + Sync + 'static {
    /// Declared type tag.
    const TYPE: ValueType;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

impl VariableType for i64 {
    const TYPE: ValueType = ValueType::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl VariableType for f64 {
    const TYPE: ValueType = ValueType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl VariableType for bool {
    const TYPE: ValueType = ValueType::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl VariableType for String {
    const TYPE: ValueType = ValueType::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_int_to_float() {
        assert_eq!(Value::Int(3).coerce(ValueType::Float), Some(Value::Float(3.0)));
        assert_eq!(Value::Float(3.5).coerce(ValueType::Int), None);
        assert_eq!(Value::Bool(true).coerce(ValueType::Text), None);
        assert_eq!(Value::Bool(true).coerce(ValueType::Bool), Some(Value::Bool(true)));
    }

    #[test]
    fn test_parse_by_type() {
        assert_eq!(ValueType::Int.parse(" 42 "), Some(Value::Int(42)));
        assert_eq!(ValueType::Int.parse("4.2"), None);
        assert_eq!(ValueType::Float.parse("0.5"), Some(Value::Float(0.5)));
        assert_eq!(ValueType::Bool.parse("on"), Some(Value::Bool(true)));
        assert_eq!(ValueType::Bool.parse("maybe"), None);
        assert_eq!(ValueType::Text.parse("07:58"), Some(Value::Text("07:58".into())));
    }

    #[test]
    fn test_typed_extraction() {
        assert_eq!(i64::from_value(&Value::Int(7)), Some(7));
        assert_eq!(f64::from_value(&Value::Int(7)), Some(7.0));
        assert_eq!(bool::from_value(&Value::Int(1)), None);
        assert_eq!(String::from_value(&Value::from("x")), Some("x".to_string()));
    }

    #[test]
    fn test_untagged_json() {
        let json = serde_json::to_string(&vec![Value::Int(1), Value::Bool(false)]).unwrap();
        assert_eq!(json, "[1,false]");
    }
}
