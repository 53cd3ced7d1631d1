//! In-memory call logger for one backend connection

use super::call::CallEntry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggerError {
    #[error("call buffer lock poisoned for logger '{0}'")]
    Poisoned(String),

    #[error("logger '{0}' is unavailable: {1}")]
    Unavailable(String, String),
}

/// A logger the data collector can read and reset
///
/// Loggers are shared between the component doing the calls and the
/// collector, so every method takes `&self`.
pub trait CallLogger: Send + Sync {
    /// Buffered calls in recording order
    fn calls(&self) -> Result<Vec<CallEntry>, LoggerError>;

    /// Take the buffered calls and clear the buffer
    fn drain(&self) -> Result<Vec<CallEntry>, LoggerError>;

    /// Empty the buffer and rewind the call index to zero
    fn clear(&self);

    /// Index the next recorded call will get
    fn current_index(&self) -> usize;
}

#[derive(Debug, Default)]
struct StackState {
    calls: Vec<CallEntry>,
    current: usize,
}

/// Unbounded call buffer, one per connection
///
/// Clones share the buffer and the enabled flag.
#[derive(Clone, Debug)]
pub struct DebugStack {
    name: String,
    state: Arc<RwLock<StackState>>,
    enabled: Arc<AtomicBool>,
}

impl DebugStack {
    /// Create a new, enabled stack labelled `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(RwLock::new(StackState::default())),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enable or disable recording. Disabled stacks drop new calls.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record a completed call
    pub fn push(&self, entry: CallEntry) {
        if !self.is_enabled() {
            return;
        }
        if let Ok(mut state) = self.state.write() {
            trace!(
                logger = %self.name,
                index = state.current,
                method = %entry.method,
                execution_ms = entry.execution_ms,
                "recorded backend call"
            );
            state.calls.push(entry);
            state.current += 1;
        }
    }

    /// Get the current number of buffered calls
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.calls.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(&self) -> LoggerError {
        LoggerError::Poisoned(self.name.clone())
    }
}

impl CallLogger for DebugStack {
    fn calls(&self) -> Result<Vec<CallEntry>, LoggerError> {
        self.state
            .read()
            .map(|state| state.calls.clone())
            .map_err(|_| self.poisoned())
    }

    fn drain(&self) -> Result<Vec<CallEntry>, LoggerError> {
        let mut state = self.state.write().map_err(|_| self.poisoned())?;
        state.current = 0;
        Ok(std::mem::take(&mut state.calls))
    }

    fn clear(&self) {
        // A poisoned buffer is still reset so the next request starts clean
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.calls.clear();
        state.current = 0;
        drop(state);
        self.state.clear_poison();
    }

    fn current_index(&self) -> usize {
        match self.state.read() {
            Ok(state) => state.current,
            Err(poisoned) => poisoned.into_inner().current,
        }
    }
}
