//! PHPCR bundle wiring
//!
//! Boots the collaborators of the request profiler from a [`BundleConfig`]:
//! a [`StaticRegistry`] with the configured connections and managers, a
//! [`DebugStack`] per logging connection, one repository per connection and a
//! [`DataCollector`] with every stack attached.
//!
//! # Example
//! ```
//! use phpcr_bundle::{BundleConfig, ContentRepository, PhpcrBundle};
//!
//! let mut bundle = PhpcrBundle::boot(BundleConfig::default()).unwrap();
//!
//! let repo = bundle.repository("default").unwrap();
//! assert!(repo.invoke("getNode", &["/cms".into()]).is_err());
//!
//! let snapshot = bundle.finish_request();
//! assert_eq!(snapshot.call_count(), 1);
//! assert_eq!(bundle.collector().call_count(), 0);
//! ```

mod config;
mod error;
mod registry;
mod repository;

pub use config::{
    BundleConfig, ConnectionConfig, ManagerConfig, ProfilingConfig, ENV_PROFILER_ENABLED,
    ENV_PROFILER_MAX_DEPTH,
};
pub use error::{BundleError, RepositoryError};
pub use registry::StaticRegistry;
pub use repository::{ContentRepository, LoggedRepository, NoneRepository, Session};

use phpcr_profiler::{DataCollector, DebugStack, Sanitizer, Snapshot};
use phpcr_types::{ClassName, ConnectionName, ManagerName};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for [`PhpcrBundle`], used to plug in real backends
pub struct BundleBuilder {
    config: BundleConfig,
    backends: HashMap<ConnectionName, Arc<dyn ContentRepository>>,
}

impl BundleBuilder {
    pub fn new(config: BundleConfig) -> Self {
        Self {
            config,
            backends: HashMap::new(),
        }
    }

    /// Use `backend` for `connection` instead of a [`NoneRepository`]
    pub fn with_backend(
        mut self,
        connection: &str,
        backend: Arc<dyn ContentRepository>,
    ) -> Result<Self, BundleError> {
        self.backends.insert(ConnectionName::new(connection)?, backend);
        Ok(self)
    }

    pub fn boot(self) -> Result<PhpcrBundle, BundleError> {
        let config = self.config.resolve()?;

        for connection in self.backends.keys() {
            if config.connection(connection.as_str()).is_none() {
                return Err(BundleError::NoSuchConnection(connection.to_string()));
            }
        }

        let registry = Arc::new(StaticRegistry::from_config(&config)?);
        let mut collector = DataCollector::with_sanitizer(
            registry.clone(),
            Sanitizer::new(config.profiling.max_depth),
        );

        let mut stacks = BTreeMap::new();
        let mut repositories: BTreeMap<ConnectionName, Arc<dyn ContentRepository>> =
            BTreeMap::new();

        for connection in &config.connections {
            let backend: Arc<dyn ContentRepository> = self
                .backends
                .get(&connection.name)
                .cloned()
                .unwrap_or_else(|| Arc::new(NoneRepository) as Arc<dyn ContentRepository>);

            let repository: Arc<dyn ContentRepository> =
                if config.profiling.enabled && connection.logging {
                    let stack = DebugStack::new(connection.name.as_str());
                    collector.attach_logger(connection.name.as_str(), Arc::new(stack.clone()));
                    stacks.insert(connection.name.clone(), stack.clone());
                    Arc::new(LoggedRepository::new(
                        backend,
                        stack,
                        connection.workspace.clone(),
                    ))
                } else {
                    backend
                };

            repositories.insert(connection.name.clone(), repository);
        }

        info!(
            connections = config.connections.len(),
            managers = config.managers.len(),
            logging = stacks.len(),
            "booted phpcr bundle"
        );

        Ok(PhpcrBundle {
            registry,
            stacks,
            repositories,
            collector,
        })
    }
}

/// A booted bundle: registry, repositories and profiler for one application
pub struct PhpcrBundle {
    registry: Arc<StaticRegistry>,
    stacks: BTreeMap<ConnectionName, DebugStack>,
    repositories: BTreeMap<ConnectionName, Arc<dyn ContentRepository>>,
    collector: DataCollector,
}

impl PhpcrBundle {
    /// Boot with [`NoneRepository`] backends on every connection
    pub fn boot(config: BundleConfig) -> Result<Self, BundleError> {
        BundleBuilder::new(config).boot()
    }

    pub fn builder(config: BundleConfig) -> BundleBuilder {
        BundleBuilder::new(config)
    }

    pub fn registry(&self) -> &Arc<StaticRegistry> {
        &self.registry
    }

    /// Repository for `connection`
    pub fn repository(&self, connection: &str) -> Result<Arc<dyn ContentRepository>, BundleError> {
        self.repositories
            .get(&ConnectionName::new(connection)?)
            .cloned()
            .ok_or_else(|| BundleError::NoSuchConnection(connection.to_string()))
    }

    /// Repository of the connection a manager works on
    pub fn manager_repository(
        &self,
        manager: &str,
    ) -> Result<Arc<dyn ContentRepository>, BundleError> {
        let name = ManagerName::new(manager)?;
        let connection = self
            .registry
            .connection_of(&name)
            .ok_or_else(|| BundleError::UnknownManager(manager.to_string()))?;
        self.repository(connection.as_str())
    }

    /// Mark a document class as loaded by a manager
    pub fn load_metadata(&self, manager: &str, class: &str) -> Result<bool, BundleError> {
        self.registry
            .load_metadata(&ManagerName::new(manager)?, &ClassName::parse(class)?)
    }

    /// Call logger of a connection, if logging is enabled for it
    pub fn logger(&self, connection: &str) -> Option<&DebugStack> {
        let name = ConnectionName::new(connection).ok()?;
        self.stacks.get(&name)
    }

    pub fn collector(&self) -> &DataCollector {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut DataCollector {
        &mut self.collector
    }

    /// Collect the request's calls, reset for the next request and return what was collected
    ///
    /// Loaded metadata belongs to the managers, not the request, and is kept.
    pub fn finish_request(&mut self) -> Snapshot {
        self.collector.collect();
        let snapshot = self.collector.snapshot().clone();
        self.collector.reset();
        debug!(calls = snapshot.call_count(), "finished request");
        snapshot
    }
}
