//! Turns raw call parameters into display-safe values

use crate::param::{ParamObject, RawParam};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Default bound on collection nesting
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A sanitized parameter
///
/// `original` is true when `value` is exactly what was passed to the backend,
/// which means the call can be replayed from it. Queries, objects and
/// resources are replaced by a description and are never original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedValue {
    pub value: Value,
    pub original: bool,
}

impl SanitizedValue {
    pub fn original(value: Value) -> Self {
        Self {
            value,
            original: true,
        }
    }

    pub fn replaced(value: Value) -> Self {
        Self {
            value,
            original: false,
        }
    }
}

/// Recursive parameter sanitizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    max_depth: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Sanitizer {
    /// Create a sanitizer that truncates collections nested deeper than `max_depth`
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Sanitize one parameter
    pub fn sanitize(&self, param: &RawParam) -> SanitizedValue {
        self.sanitize_at(param, 0)
    }

    /// Sanitize a parameter list, keeping its order
    pub fn sanitize_all(&self, params: &[RawParam]) -> Vec<SanitizedValue> {
        params.iter().map(|p| self.sanitize(p)).collect()
    }

    fn sanitize_at(&self, param: &RawParam, depth: usize) -> SanitizedValue {
        match param {
            RawParam::Object(object) => Self::sanitize_object(object.as_ref()),
            RawParam::List(items) => {
                if depth >= self.max_depth {
                    return self.truncated();
                }
                let mut original = true;
                let values = items
                    .iter()
                    .map(|item| {
                        let sanitized = self.sanitize_at(item, depth + 1);
                        original &= sanitized.original;
                        sanitized.value
                    })
                    .collect();
                SanitizedValue {
                    value: Value::Array(values),
                    original,
                }
            }
            RawParam::Map(entries) => {
                if depth >= self.max_depth {
                    return self.truncated();
                }
                let mut original = true;
                let mut map = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    let sanitized = self.sanitize_at(item, depth + 1);
                    original &= sanitized.original;
                    map.insert(key.clone(), sanitized.value);
                }
                SanitizedValue {
                    value: Value::Object(map),
                    original,
                }
            }
            RawParam::Resource(handle) => {
                SanitizedValue::replaced(Value::String(format!("Resource({})", handle.kind())))
            }
            RawParam::Null => SanitizedValue::original(Value::Null),
            RawParam::Bool(b) => SanitizedValue::original(Value::Bool(*b)),
            RawParam::Int(i) => SanitizedValue::original(Value::from(*i)),
            // NaN and infinities have no JSON form
            RawParam::Float(f) => SanitizedValue::original(
                Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            ),
            RawParam::String(s) => SanitizedValue::original(Value::String(s.clone())),
        }
    }

    fn sanitize_object(object: &dyn ParamObject) -> SanitizedValue {
        match object.as_query() {
            Some(query) => {
                let mut descriptor = Map::new();
                descriptor.insert(
                    "querystring".to_string(),
                    Value::String(query.statement().to_string()),
                );
                descriptor.insert(
                    "language".to_string(),
                    Value::String(query.language().to_string()),
                );
                if let Some(window) = query.window() {
                    descriptor.insert("limit".to_string(), window.limit.into());
                    descriptor.insert("offset".to_string(), window.offset.into());
                }
                SanitizedValue::replaced(Value::Object(descriptor))
            }
            None => SanitizedValue::replaced(Value::String(format!(
                "Object({})",
                object.type_name()
            ))),
        }
    }

    fn truncated(&self) -> SanitizedValue {
        SanitizedValue::replaced(Value::String(format!(
            "Array(max depth {} exceeded)",
            self.max_depth
        )))
    }
}

/// Sanitize with the default depth bound
pub fn sanitize(param: &RawParam) -> SanitizedValue {
    Sanitizer::default().sanitize(param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{NamedObject, SqlQuery};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_scalars_are_original() {
        for (raw, expected) in [
            (RawParam::Null, json!(null)),
            (RawParam::Bool(false), json!(false)),
            (RawParam::Int(-7), json!(-7)),
            (RawParam::Float(1.25), json!(1.25)),
            (RawParam::from("/cms/content"), json!("/cms/content")),
        ] {
            assert_eq!(sanitize(&raw), SanitizedValue::original(expected));
        }
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        let sanitized = sanitize(&RawParam::Float(f64::NAN));
        assert_eq!(sanitized, SanitizedValue::original(Value::Null));
    }

    #[test]
    fn test_plain_query_descriptor() {
        let sanitized = sanitize(&SqlQuery::new("SELECT *", "JCR-SQL2").into());
        assert_eq!(
            sanitized,
            SanitizedValue::replaced(json!({
                "querystring": "SELECT *",
                "language": "JCR-SQL2"
            }))
        );
    }

    #[test]
    fn test_paged_query_descriptor() {
        let query = SqlQuery::jcr_sql2("SELECT *").with_limit(10).with_offset(5);
        let sanitized = sanitize(&query.into());
        assert_eq!(
            sanitized,
            SanitizedValue::replaced(json!({
                "querystring": "SELECT *",
                "language": "JCR-SQL2",
                "limit": 10,
                "offset": 5
            }))
        );
    }

    #[test]
    fn test_pageable_query_without_window_values() {
        let sanitized = sanitize(&SqlQuery::jcr_sql2("SELECT *").pageable().into());
        assert_eq!(sanitized.value["limit"], Value::Null);
        assert_eq!(sanitized.value["offset"], Value::Null);
        assert!(!sanitized.original);
    }

    #[test]
    fn test_object_and_resource_placeholders() {
        let node = RawParam::object(NamedObject("Jackalope\\Node".to_string()));
        assert_eq!(
            sanitize(&node),
            SanitizedValue::replaced(json!("Object(Jackalope\\Node)"))
        );

        assert_eq!(
            sanitize(&RawParam::resource("stream")),
            SanitizedValue::replaced(json!("Resource(stream)"))
        );
    }

    #[test]
    fn test_collection_original_flag() {
        let clean = RawParam::from(vec![RawParam::Int(1), RawParam::from("a")]);
        assert!(sanitize(&clean).original);

        let empty = RawParam::List(vec![]);
        assert_eq!(sanitize(&empty), SanitizedValue::original(json!([])));

        let tainted = RawParam::map([
            ("path", RawParam::from("/cms")),
            ("stream", RawParam::resource("stream")),
        ]);
        let sanitized = sanitize(&tainted);
        assert!(!sanitized.original);
        assert_eq!(
            sanitized.value,
            json!({"path": "/cms", "stream": "Resource(stream)"})
        );
    }

    #[test]
    fn test_map_keeps_key_order() {
        let raw = RawParam::map([("z", 1), ("a", 2), ("m", 3)]);
        let sanitized = sanitize(&raw);
        let keys: Vec<&String> = sanitized.value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_nested_taint_propagates() {
        let raw = RawParam::from(vec![RawParam::from(vec![RawParam::from(vec![
            RawParam::from(SqlQuery::jcr_sql2("SELECT *")),
        ])])]);
        let sanitized = sanitize(&raw);
        assert!(!sanitized.original);
        assert_eq!(sanitized.value[0][0][0]["language"], json!("JCR-SQL2"));
    }

    #[test]
    fn test_depth_limit_truncates() {
        let mut raw = RawParam::Int(1);
        for _ in 0..5 {
            raw = RawParam::List(vec![raw]);
        }

        let shallow = Sanitizer::new(2).sanitize(&raw);
        assert!(!shallow.original);
        assert_eq!(shallow.value, json!([["Array(max depth 2 exceeded)"]]));

        let deep = Sanitizer::new(5).sanitize(&raw);
        assert!(deep.original);
        assert_eq!(deep.value, json!([[[[[1]]]]]));
    }

    #[test]
    fn test_input_is_untouched() {
        let raw = RawParam::map([("limit", 3)]);
        let _ = sanitize(&raw);
        match raw {
            RawParam::Map(entries) => assert!(matches!(entries[0].1, RawParam::Int(3))),
            _ => unreachable!(),
        }
    }
}
