use phpcr_types::{ClassName, ConnectionName, ManagerName};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown manager '{0}'")]
    UnknownManager(String),
}

/// Source of the configured connections, managers and loaded class metadata
pub trait ManagerRegistry: Send + Sync {
    /// Configured connection names, in configuration order
    fn connection_names(&self) -> Vec<ConnectionName>;

    /// Configured manager names, in configuration order
    fn manager_names(&self) -> Vec<ManagerName>;

    /// Classes whose mapping metadata the manager has loaded so far, in load order
    fn loaded_metadata(&self, manager: &ManagerName) -> Result<Vec<ClassName>, RegistryError>;
}
