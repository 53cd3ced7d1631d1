//! Request profiler for PHPCR content repository connections
//!
//! Collects the backend calls each connection made during a request and
//! sanitizes their parameters so they can be shown in a profiler toolbar or
//! exported as JSON.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use phpcr_profiler::prelude::*;
//!
//! struct Registry;
//!
//! impl ManagerRegistry for Registry {
//!     fn connection_names(&self) -> Vec<ConnectionName> {
//!         vec![ConnectionName::default_name()]
//!     }
//!     fn manager_names(&self) -> Vec<ManagerName> {
//!         vec![ManagerName::default_name()]
//!     }
//!     fn loaded_metadata(&self, _: &ManagerName) -> Result<Vec<ClassName>, RegistryError> {
//!         Ok(vec![])
//!     }
//! }
//!
//! let stack = DebugStack::new("default");
//! let mut collector = DataCollector::new(Arc::new(Registry));
//! collector.attach_logger("default", Arc::new(stack.clone()));
//!
//! stack.push(
//!     CallEntry::new("query")
//!         .with_params([RawParam::from(SqlQuery::jcr_sql2("SELECT * FROM [nt:base]"))])
//!         .took(4.0),
//! );
//!
//! collector.collect();
//! assert_eq!(collector.call_count(), 1);
//! assert_eq!(collector.total_time_ms(), 4.0);
//! ```

mod collector;
mod registry;

pub mod debug;
pub mod param;
pub mod prelude;
pub mod sanitize;

pub use collector::{DataCollector, Snapshot, COLLECTOR_NAME};
pub use debug::{CallEntry, CallLogger, CallRecord, DebugStack, LoggerError};
pub use param::{
    NamedObject, ParamObject, QueryLike, QueryWindow, RawParam, ResourceHandle, SqlQuery,
};
pub use registry::{ManagerRegistry, RegistryError};
pub use sanitize::{sanitize, SanitizedValue, Sanitizer, DEFAULT_MAX_DEPTH};

// Re-export the name types so callers need a single import
pub use phpcr_types::{ClassName, ConnectionName, ManagerName, NameError};
