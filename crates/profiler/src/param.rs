//! Raw call parameters as handed over by backend loggers
//!
//! A logger records whatever the backend was called with. Most parameters are
//! plain scalars or arrays, but some are live objects (queries, nodes,
//! sessions) or resource handles (binary streams). [`RawParam`] models that
//! closed set of shapes; objects are probed for capabilities through
//! [`ParamObject`] rather than by concrete type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A raw parameter of a backend call
#[derive(Debug, Clone)]
pub enum RawParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered collection
    List(Vec<RawParam>),
    /// Keyed collection, insertion order preserved
    Map(Vec<(String, RawParam)>),
    /// Opaque object, possibly exposing the query capability
    Object(Arc<dyn ParamObject>),
    /// Unmanaged handle such as an open stream
    Resource(ResourceHandle),
}

impl RawParam {
    /// Wrap any object implementing [`ParamObject`]
    pub fn object<O: ParamObject + 'static>(object: O) -> Self {
        RawParam::Object(Arc::new(object))
    }

    /// Shorthand for a resource handle of the given kind
    pub fn resource(kind: impl Into<String>) -> Self {
        RawParam::Resource(ResourceHandle::new(kind))
    }

    /// Build a keyed collection from `(key, value)` pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<RawParam>,
        I: IntoIterator<Item = (K, V)>,
    {
        RawParam::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<bool> for RawParam {
    fn from(v: bool) -> Self {
        RawParam::Bool(v)
    }
}

impl From<i64> for RawParam {
    fn from(v: i64) -> Self {
        RawParam::Int(v)
    }
}

impl From<i32> for RawParam {
    fn from(v: i32) -> Self {
        RawParam::Int(v as i64)
    }
}

impl From<f64> for RawParam {
    fn from(v: f64) -> Self {
        RawParam::Float(v)
    }
}

impl From<&str> for RawParam {
    fn from(v: &str) -> Self {
        RawParam::String(v.to_string())
    }
}

impl From<String> for RawParam {
    fn from(v: String) -> Self {
        RawParam::String(v)
    }
}

impl<T: Into<RawParam>> From<Option<T>> for RawParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawParam::Null)
    }
}

impl<T: Into<RawParam>> From<Vec<T>> for RawParam {
    fn from(v: Vec<T>) -> Self {
        RawParam::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for RawParam {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => RawParam::Null,
            Value::Bool(b) => RawParam::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawParam::Int(i),
                // u64 above i64::MAX and real numbers both land here
                None => RawParam::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => RawParam::String(s),
            Value::Array(items) => RawParam::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => RawParam::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// An opaque object passed to the backend
///
/// Implementors only have to name their type. Objects that represent a query
/// additionally return themselves from [`ParamObject::as_query`].
pub trait ParamObject: fmt::Debug + Send + Sync {
    /// Runtime type name shown in place of the object
    fn type_name(&self) -> &str;

    /// Query capability probe
    fn as_query(&self) -> Option<&dyn QueryLike> {
        None
    }
}

/// Limit and offset of a paged query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryWindow {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }
}

/// The query capability: statement text and language, optionally a window
pub trait QueryLike {
    fn statement(&self) -> &str;

    fn language(&self) -> &str;

    /// Limit/offset for the richer query variant; `None` for plain queries
    fn window(&self) -> Option<QueryWindow> {
        None
    }
}

/// Query language identifiers understood by content repositories
pub mod language {
    pub const JCR_SQL2: &str = "JCR-SQL2";
}

/// A query statement as passed to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlQuery {
    statement: String,
    language: String,
    /// Only set for queries that support paging
    window: Option<QueryWindow>,
}

impl SqlQuery {
    /// A plain query without paging support
    pub fn new(statement: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            language: language.into(),
            window: None,
        }
    }

    /// Shorthand for a JCR-SQL2 query
    pub fn jcr_sql2(statement: impl Into<String>) -> Self {
        Self::new(statement, language::JCR_SQL2)
    }

    /// Make this a pageable query with the given limit
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.window.get_or_insert_with(QueryWindow::default).limit = Some(limit);
        self
    }

    /// Make this a pageable query with the given offset
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.window.get_or_insert_with(QueryWindow::default).offset = Some(offset);
        self
    }

    /// Make this a pageable query with no limit or offset set yet
    pub fn pageable(mut self) -> Self {
        self.window.get_or_insert_with(QueryWindow::default);
        self
    }
}

impl QueryLike for SqlQuery {
    fn statement(&self) -> &str {
        &self.statement
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn window(&self) -> Option<QueryWindow> {
        self.window
    }
}

impl ParamObject for SqlQuery {
    fn type_name(&self) -> &str {
        if self.window.is_some() {
            "PageableQuery"
        } else {
            "Query"
        }
    }

    fn as_query(&self) -> Option<&dyn QueryLike> {
        Some(self)
    }
}

impl From<SqlQuery> for RawParam {
    fn from(query: SqlQuery) -> Self {
        RawParam::object(query)
    }
}

/// An unmanaged handle, identified only by its kind (e.g., "stream")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    kind: String,
}

impl ResourceHandle {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// Stand-in for an object the profiler only knows by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedObject(pub String);

impl ParamObject for NamedObject {
    fn type_name(&self) -> &str {
        &self.0
    }
}
