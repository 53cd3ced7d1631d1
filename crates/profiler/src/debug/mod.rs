//! Call logging for backend connections
//!
//! Each connection gets a [`DebugStack`] that records every backend call made
//! during a request. The data collector reads these stacks at the end of the
//! request and resets them afterwards.

pub mod call;
pub mod stack;

pub use call::{CallEntry, CallRecord};
pub use stack::{CallLogger, DebugStack, LoggerError};
