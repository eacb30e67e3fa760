//! Attribute values attached to variables and collections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar attribute value.
///
/// Serialized untagged, so a stored header reads as plain JSON
/// (`{"units": "m", "scale": 2.5}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Ordered attribute mapping.
pub type Attrs = BTreeMap<String, AttrValue>;

/// Extra named arguments forwarded to a transformation.
pub type Kwargs = BTreeMap<String, AttrValue>;

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            // Keep a decimal point so 1.0 and 1 render differently.
            AttrValue::Float(v) => write!(f, "{:?}", v),
            AttrValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Renders a mapping as `{key: value, ...}` in key order.
pub(crate) fn fmt_mapping<V: fmt::Display>(map: &BTreeMap<String, V>) -> String {
    let entries: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    format!("{{{}}}", entries.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json() {
        let mut attrs = Attrs::new();
        attrs.insert("units".into(), "m".into());
        attrs.insert("count".into(), 3i64.into());
        attrs.insert("scale".into(), 2.0f64.into());
        attrs.insert("valid".into(), true.into());

        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(
            json,
            r#"{"count":3,"scale":2.0,"units":"m","valid":true}"#
        );

        let back: Attrs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }

    #[test]
    fn test_display_distinguishes_types() {
        assert_eq!(AttrValue::Int(1).to_string(), "1");
        assert_eq!(AttrValue::Float(1.0).to_string(), "1.0");
        assert_eq!(AttrValue::Text("1".into()).to_string(), "\"1\"");
    }

    #[test]
    fn test_fmt_mapping() {
        let mut attrs = Attrs::new();
        attrs.insert("b".into(), 2i64.into());
        attrs.insert("a".into(), "x".into());
        assert_eq!(fmt_mapping(&attrs), "{a: \"x\", b: 2}");
        assert_eq!(fmt_mapping(&Attrs::new()), "{}");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(AttrValue::Int(4).as_f64(), Some(4.0));
        assert_eq!(AttrValue::from("x").as_str(), Some("x"));
        assert_eq!(AttrValue::Bool(true).as_i64(), None);
    }
}
