//! Recorded backend calls, raw and sanitized

use crate::param::RawParam;
use crate::sanitize::{SanitizedValue, Sanitizer};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A backend call as recorded by a logger
#[derive(Debug, Clone)]
pub struct CallEntry {
    /// When the call completed
    pub timestamp: DateTime<Utc>,
    /// The backend method that was invoked
    pub method: String,
    /// Parameters as passed to the backend
    pub params: Vec<RawParam>,
    /// Environment of the call (e.g., workspace name)
    pub env: Map<String, Value>,
    /// Duration in milliseconds
    pub execution_ms: f64,
}

impl CallEntry {
    /// Create a new call entry
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            method: method.into(),
            params: Vec::new(),
            env: Map::new(),
            execution_ms: 0.0,
        }
    }

    /// Set the call parameters
    pub fn with_params<I, P>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<RawParam>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Add one environment value
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the execution time
    pub fn took(mut self, execution_ms: f64) -> Self {
        self.execution_ms = execution_ms;
        self
    }

    /// Sanitize into a record fit for display
    pub fn sanitize(&self, sanitizer: &Sanitizer) -> CallRecord {
        CallRecord {
            timestamp: self.timestamp,
            method: self.method.clone(),
            params: sanitizer.sanitize_all(&self.params),
            env: self.env.clone(),
            execution_ms: self.execution_ms,
        }
    }
}

/// A sanitized call, as stored in a snapshot
#[derive(Getters, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    timestamp: DateTime<Utc>,
    method: String,
    params: Vec<SanitizedValue>,
    env: Map<String, Value>,
    execution_ms: f64,
}

impl CallRecord {
    /// True when every parameter was kept verbatim
    pub fn is_replayable(&self) -> bool {
        self.params.iter().all(|p| p.original)
    }
}
