use phpcr_types::NameError;
use thiserror::Error;

/// Errors raised while configuring or booting the bundle
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("manager '{manager}' refers to unknown connection '{connection}'")]
    UnknownConnection { manager: String, connection: String },

    #[error("no connection named '{0}'")]
    NoSuchConnection(String),

    #[error("no manager named '{0}'")]
    UnknownManager(String),

    #[error("class '{class}' is not mapped by manager '{manager}'")]
    UnmappedClass { manager: String, class: String },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Errors returned by content repository backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("configure a real phpcr session (called `{method}`)")]
    NotConfigured { method: String },

    #[error("backend call `{method}` failed: {message}")]
    Backend { method: String, message: String },
}
