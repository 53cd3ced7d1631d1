//! Bundle configuration
//!
//! The configuration lists the repository connections, the document managers
//! layered over them, and the profiling options. It is usually read from a
//! JSON file:
//!
//! ```json
//! {
//!   "connections": [{ "name": "default", "logging": true, "workspace": "default" }],
//!   "managers": [{ "name": "default", "connection": "default", "documents": ["App\\Document\\Page"] }],
//!   "profiling": { "enabled": true, "max_depth": 32 }
//! }
//! ```
//!
//! Profiling options can be overridden from the environment:
//!
//! ```bash
//! export PHPCR_PROFILER_ENABLED=false
//! export PHPCR_PROFILER_MAX_DEPTH=8
//! ```

use crate::error::BundleError;
use phpcr_profiler::DEFAULT_MAX_DEPTH;
use phpcr_types::{ClassName, ConnectionName, ManagerName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub const ENV_PROFILER_ENABLED: &str = "PHPCR_PROFILER_ENABLED";
pub const ENV_PROFILER_MAX_DEPTH: &str = "PHPCR_PROFILER_MAX_DEPTH";

const DEFAULT_WORKSPACE: &str = "default";

fn default_true() -> bool {
    true
}

fn default_workspace() -> String {
    DEFAULT_WORKSPACE.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// One repository connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub name: ConnectionName,
    /// Record backend calls for the profiler
    #[serde(default = "default_true")]
    pub logging: bool,
    /// Workspace the session logs into
    #[serde(default = "default_workspace")]
    pub workspace: String,
}

impl ConnectionConfig {
    pub fn new(name: &str) -> Result<Self, BundleError> {
        Ok(Self {
            name: ConnectionName::new(name)?,
            logging: true,
            workspace: default_workspace(),
        })
    }

    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }
}

/// One document manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub name: ManagerName,
    /// Connection the manager works on; the first connection when unset
    #[serde(default)]
    pub connection: Option<ConnectionName>,
    /// Document classes this manager maps
    #[serde(default)]
    pub documents: Vec<ClassName>,
}

impl ManagerConfig {
    pub fn new(name: &str) -> Result<Self, BundleError> {
        Ok(Self {
            name: ManagerName::new(name)?,
            connection: None,
            documents: Vec::new(),
        })
    }

    pub fn on_connection(mut self, connection: &str) -> Result<Self, BundleError> {
        self.connection = Some(ConnectionName::new(connection)?);
        Ok(self)
    }

    pub fn with_document(mut self, class: &str) -> Result<Self, BundleError> {
        self.documents.push(ClassName::parse(class)?);
        Ok(self)
    }
}

/// Profiler options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Deepest parameter nesting shown before truncation
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ProfilingConfig {
    /// Apply `PHPCR_PROFILER_ENABLED` and `PHPCR_PROFILER_MAX_DEPTH` overrides
    pub fn apply_env(&mut self) -> Result<(), BundleError> {
        self.apply_overrides(
            std::env::var(ENV_PROFILER_ENABLED).ok(),
            std::env::var(ENV_PROFILER_MAX_DEPTH).ok(),
        )
    }

    /// Apply raw override values as they would come from the environment
    pub fn apply_overrides(
        &mut self,
        enabled: Option<String>,
        max_depth: Option<String>,
    ) -> Result<(), BundleError> {
        if let Some(value) = enabled {
            self.enabled = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(BundleError::InvalidEnv {
                        var: ENV_PROFILER_ENABLED,
                        value,
                    })
                }
            };
            debug!(enabled = self.enabled, "profiling toggled from environment");
        }

        if let Some(value) = max_depth {
            self.max_depth = match value.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => {
                    return Err(BundleError::InvalidEnv {
                        var: ENV_PROFILER_MAX_DEPTH,
                        value,
                    })
                }
            };
            debug!(max_depth = self.max_depth, "max depth set from environment");
        }

        Ok(())
    }
}

/// Complete bundle configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    pub connections: Vec<ConnectionConfig>,
    pub managers: Vec<ManagerConfig>,
    pub profiling: ProfilingConfig,
}

impl BundleConfig {
    pub fn from_json_str(json: &str) -> Result<Self, BundleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BundleError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loaded bundle configuration");
        Self::from_json_str(&content)
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn with_manager(mut self, manager: ManagerConfig) -> Self {
        self.managers.push(manager);
        self
    }

    /// Fill in the implicit default connection and manager, then validate
    ///
    /// Without connections a single `default` connection is assumed; without
    /// managers a `default` manager on the first connection. Managers without
    /// an explicit connection are bound to the first connection.
    pub fn resolve(mut self) -> Result<Self, BundleError> {
        if self.connections.is_empty() {
            self.connections.push(ConnectionConfig {
                name: ConnectionName::default_name(),
                logging: true,
                workspace: default_workspace(),
            });
        }

        let first = self.connections[0].name.clone();

        if self.managers.is_empty() {
            self.managers.push(ManagerConfig {
                name: ManagerName::default_name(),
                connection: None,
                documents: Vec::new(),
            });
        }

        for manager in &mut self.managers {
            if manager.connection.is_none() {
                manager.connection = Some(first.clone());
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Check for duplicate names and dangling manager connections
    pub fn validate(&self) -> Result<(), BundleError> {
        let mut connections = HashSet::new();
        for connection in &self.connections {
            if !connections.insert(&connection.name) {
                return Err(BundleError::DuplicateName {
                    kind: "connection",
                    name: connection.name.to_string(),
                });
            }
        }

        let mut managers = HashSet::new();
        for manager in &self.managers {
            if !managers.insert(&manager.name) {
                return Err(BundleError::DuplicateName {
                    kind: "manager",
                    name: manager.name.to_string(),
                });
            }

            if let Some(connection) = &manager.connection {
                if !connections.contains(connection) {
                    return Err(BundleError::UnknownConnection {
                        manager: manager.name.to_string(),
                        connection: connection.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.name.as_str() == name)
    }
}
