//! Content repository seam
//!
//! The bundle never talks to a real repository itself. Connections without a
//! configured backend get a [`NoneRepository`], which fails every call, and
//! logging connections wrap their backend in a [`LoggedRepository`] so each
//! call shows up in the profiler.

use crate::error::RepositoryError;
use phpcr_profiler::{CallEntry, DebugStack, RawParam};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// An authenticated repository session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub workspace: String,
    pub user_id: Option<String>,
}

/// A content repository backend
pub trait ContentRepository: Send + Sync {
    /// Open a session, `None` when the backend has nothing to log into
    fn login(&self) -> Result<Option<Session>, RepositoryError>;

    /// Invoke a backend method
    fn invoke(&self, method: &str, params: &[RawParam]) -> Result<Value, RepositoryError>;
}

impl<R: ContentRepository + ?Sized> ContentRepository for Arc<R> {
    fn login(&self) -> Result<Option<Session>, RepositoryError> {
        (**self).login()
    }

    fn invoke(&self, method: &str, params: &[RawParam]) -> Result<Value, RepositoryError> {
        (**self).invoke(method, params)
    }
}

impl<R: ContentRepository + ?Sized> ContentRepository for Box<R> {
    fn login(&self) -> Result<Option<Session>, RepositoryError> {
        (**self).login()
    }

    fn invoke(&self, method: &str, params: &[RawParam]) -> Result<Value, RepositoryError> {
        (**self).invoke(method, params)
    }
}

/// Stand-in for a connection without a configured backend
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneRepository;

impl ContentRepository for NoneRepository {
    fn login(&self) -> Result<Option<Session>, RepositoryError> {
        Ok(None)
    }

    fn invoke(&self, method: &str, _params: &[RawParam]) -> Result<Value, RepositoryError> {
        Err(RepositoryError::NotConfigured {
            method: method.to_string(),
        })
    }
}

/// Records every call of the wrapped backend into a [`DebugStack`]
#[derive(Debug, Clone)]
pub struct LoggedRepository<R> {
    inner: R,
    stack: DebugStack,
    workspace: String,
}

impl<R: ContentRepository> LoggedRepository<R> {
    pub fn new(inner: R, stack: DebugStack, workspace: impl Into<String>) -> Self {
        Self {
            inner,
            stack,
            workspace: workspace.into(),
        }
    }

    pub fn stack(&self) -> &DebugStack {
        &self.stack
    }
}

impl<R: ContentRepository> ContentRepository for LoggedRepository<R> {
    fn login(&self) -> Result<Option<Session>, RepositoryError> {
        self.inner.login()
    }

    fn invoke(&self, method: &str, params: &[RawParam]) -> Result<Value, RepositoryError> {
        let start = Instant::now();
        let result = self.inner.invoke(method, params);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut entry = CallEntry::new(method)
            .with_params(params.iter().cloned())
            .with_env("workspace", self.workspace.as_str())
            .took(elapsed_ms);
        if let Err(e) = &result {
            trace!(method, "backend call failed: {}", e);
            entry = entry.with_env("error", e.to_string());
        }
        self.stack.push(entry);

        result
    }
}
