use crate::config::BundleConfig;
use crate::error::BundleError;
use parking_lot::RwLock;
use phpcr_profiler::{ManagerRegistry, RegistryError};
use phpcr_types::{ClassName, ConnectionName, ManagerName};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug)]
struct ManagerEntry {
    connection: ConnectionName,
    /// Classes this manager maps; empty means any class may be loaded
    mapped: Vec<ClassName>,
    /// Classes whose metadata has been loaded, in load order
    loaded: RwLock<Vec<ClassName>>,
}

/// Registry built from the bundle configuration
///
/// Connections and managers are fixed at construction. Class metadata is
/// marked as loaded through [`StaticRegistry::load_metadata`] as managers
/// start working with a document class.
#[derive(Debug)]
pub struct StaticRegistry {
    connections: Vec<ConnectionName>,
    manager_order: Vec<ManagerName>,
    managers: HashMap<ManagerName, ManagerEntry>,
}

impl StaticRegistry {
    /// Build from a resolved configuration
    pub fn from_config(config: &BundleConfig) -> Result<Self, BundleError> {
        config.validate()?;

        let connections: Vec<ConnectionName> =
            config.connections.iter().map(|c| c.name.clone()).collect();

        let mut manager_order = Vec::with_capacity(config.managers.len());
        let mut managers = HashMap::with_capacity(config.managers.len());
        for manager in &config.managers {
            let connection = match (&manager.connection, connections.first()) {
                (Some(connection), _) => connection.clone(),
                (None, Some(first)) => first.clone(),
                (None, None) => {
                    return Err(BundleError::UnknownConnection {
                        manager: manager.name.to_string(),
                        connection: ConnectionName::default_name().to_string(),
                    })
                }
            };

            manager_order.push(manager.name.clone());
            managers.insert(
                manager.name.clone(),
                ManagerEntry {
                    connection,
                    mapped: manager.documents.clone(),
                    loaded: RwLock::new(Vec::new()),
                },
            );
        }

        Ok(Self {
            connections,
            manager_order,
            managers,
        })
    }

    /// Connection a manager works on
    pub fn connection_of(&self, manager: &ManagerName) -> Option<&ConnectionName> {
        self.managers.get(manager).map(|entry| &entry.connection)
    }

    /// Mark the metadata of `class` as loaded by `manager`
    ///
    /// Returns `true` when the class was not loaded before.
    pub fn load_metadata(&self, manager: &ManagerName, class: &ClassName) -> Result<bool, BundleError> {
        let entry = self
            .managers
            .get(manager)
            .ok_or_else(|| BundleError::UnknownManager(manager.to_string()))?;

        if !entry.mapped.is_empty() && !entry.mapped.contains(class) {
            return Err(BundleError::UnmappedClass {
                manager: manager.to_string(),
                class: class.to_string(),
            });
        }

        let mut loaded = entry.loaded.write();
        if loaded.contains(class) {
            return Ok(false);
        }
        debug!(manager = %manager, class = %class, "loaded class metadata");
        loaded.push(class.clone());
        Ok(true)
    }

    /// Forget all loaded metadata
    pub fn clear_metadata(&self) {
        for entry in self.managers.values() {
            entry.loaded.write().clear();
        }
    }
}

impl ManagerRegistry for StaticRegistry {
    fn connection_names(&self) -> Vec<ConnectionName> {
        self.connections.clone()
    }

    fn manager_names(&self) -> Vec<ManagerName> {
        self.manager_order.clone()
    }

    fn loaded_metadata(&self, manager: &ManagerName) -> Result<Vec<ClassName>, RegistryError> {
        self.managers
            .get(manager)
            .map(|entry| entry.loaded.read().clone())
            .ok_or_else(|| RegistryError::UnknownManager(manager.to_string()))
    }
}
