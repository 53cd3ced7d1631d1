//! Per-request data collector for the profiler toolbar
//!
//! The collector owns a set of named call loggers and a handle to the manager
//! registry. At the end of a request [`DataCollector::collect`] freezes what
//! the loggers recorded into a [`Snapshot`]; [`DataCollector::reset`] clears
//! everything for the next request.

use crate::debug::{CallLogger, CallRecord};
use crate::registry::ManagerRegistry;
use crate::sanitize::Sanitizer;
use phpcr_types::{ClassName, ConnectionName, ManagerName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifier the collector is registered under in the profiler
pub const COLLECTOR_NAME: &str = "phpcr";

/// Everything collected for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub connections: Vec<ConnectionName>,
    pub managers: Vec<ManagerName>,
    /// Sanitized calls per logger name
    pub calls: BTreeMap<String, Vec<CallRecord>>,
    /// Loaded document classes per manager name
    pub documents: BTreeMap<String, Vec<ClassName>>,
}

impl Snapshot {
    /// Total number of calls over all connections
    pub fn call_count(&self) -> usize {
        self.calls.values().map(Vec::len).sum()
    }

    /// Summed execution time of all calls in milliseconds
    pub fn total_time_ms(&self) -> f64 {
        self.calls
            .values()
            .flatten()
            .map(|call| *call.execution_ms())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
            && self.managers.is_empty()
            && self.calls.is_empty()
            && self.documents.is_empty()
    }

    /// Calls at or above `threshold_ms`, slowest first
    ///
    /// Each call is paired with the name of the logger it came from.
    pub fn slow_calls(&self, threshold_ms: f64, limit: Option<usize>) -> Vec<(&str, &CallRecord)> {
        let mut slow: Vec<(&str, &CallRecord)> = self
            .calls
            .iter()
            .flat_map(|(name, calls)| calls.iter().map(move |call| (name.as_str(), call)))
            .filter(|(_, call)| *call.execution_ms() >= threshold_ms)
            .collect();

        slow.sort_by(|a, b| b.1.execution_ms().total_cmp(a.1.execution_ms()));

        if let Some(limit) = limit {
            slow.truncate(limit);
        }
        slow
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Aggregates backend call logs for the profiler
pub struct DataCollector {
    registry: Arc<dyn ManagerRegistry>,
    loggers: BTreeMap<String, Arc<dyn CallLogger>>,
    sanitizer: Sanitizer,
    data: Snapshot,
}

impl DataCollector {
    /// Create a collector with the default sanitizer
    pub fn new(registry: Arc<dyn ManagerRegistry>) -> Self {
        Self::with_sanitizer(registry, Sanitizer::default())
    }

    pub fn with_sanitizer(registry: Arc<dyn ManagerRegistry>, sanitizer: Sanitizer) -> Self {
        Self {
            registry,
            loggers: BTreeMap::new(),
            sanitizer,
            data: Snapshot::default(),
        }
    }

    /// Name of this collector in the profiler
    pub fn name(&self) -> &'static str {
        COLLECTOR_NAME
    }

    /// Attach the logger of a connection. A later logger with the same name replaces it.
    pub fn attach_logger(&mut self, name: impl Into<String>, logger: Arc<dyn CallLogger>) {
        let name = name.into();
        if self.loggers.insert(name.clone(), logger).is_some() {
            debug!(logger = %name, "replaced call logger");
        } else {
            debug!(logger = %name, "attached call logger");
        }
    }

    /// Names of the attached loggers
    pub fn logger_names(&self) -> impl Iterator<Item = &str> {
        self.loggers.keys().map(String::as_str)
    }

    /// Freeze the loggers' buffers and the registry state into a new snapshot
    pub fn collect(&mut self) {
        let mut calls = BTreeMap::new();
        for (name, logger) in &self.loggers {
            let records = match logger.calls() {
                Ok(entries) => entries
                    .iter()
                    .map(|entry| entry.sanitize(&self.sanitizer))
                    .collect(),
                Err(e) => {
                    warn!(logger = %name, "could not read call log, treating it as empty: {}", e);
                    Vec::new()
                }
            };
            calls.insert(name.clone(), records);
        }

        let managers = self.registry.manager_names();
        let mut documents = BTreeMap::new();
        for manager in &managers {
            let classes = match self.registry.loaded_metadata(manager) {
                Ok(classes) => classes,
                Err(e) => {
                    warn!(manager = %manager, "could not list loaded metadata: {}", e);
                    Vec::new()
                }
            };
            documents.insert(manager.to_string(), classes);
        }

        self.data = Snapshot {
            connections: self.registry.connection_names(),
            managers,
            calls,
            documents,
        };

        debug!(
            connections = self.data.connections.len(),
            calls = self.data.call_count(),
            total_ms = self.data.total_time_ms(),
            "collected backend calls"
        );
    }

    /// Drop the snapshot and clear every attached logger
    pub fn reset(&mut self) {
        self.data = Snapshot::default();
        for logger in self.loggers.values() {
            logger.clear();
        }
        debug!(loggers = self.loggers.len(), "reset data collector");
    }

    /// The most recent snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    pub fn connections(&self) -> &[ConnectionName] {
        &self.data.connections
    }

    pub fn managers(&self) -> &[ManagerName] {
        &self.data.managers
    }

    pub fn calls(&self) -> &BTreeMap<String, Vec<CallRecord>> {
        &self.data.calls
    }

    pub fn documents(&self) -> &BTreeMap<String, Vec<ClassName>> {
        &self.data.documents
    }

    pub fn call_count(&self) -> usize {
        self.data.call_count()
    }

    pub fn total_time_ms(&self) -> f64 {
        self.data.total_time_ms()
    }
}
