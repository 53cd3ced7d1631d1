pub use crate::collector::{DataCollector, Snapshot};
pub use crate::debug::{CallEntry, CallLogger, CallRecord, DebugStack, LoggerError};
pub use crate::param::{ParamObject, QueryLike, QueryWindow, RawParam, SqlQuery};
pub use crate::registry::{ManagerRegistry, RegistryError};
pub use crate::sanitize::{SanitizedValue, Sanitizer};
pub use phpcr_types::{ClassName, ConnectionName, ManagerName};
