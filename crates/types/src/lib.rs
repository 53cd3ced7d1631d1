use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Invalid connection name: {0}")]
    InvalidConnectionName(String),

    #[error("Invalid manager name: {0}")]
    InvalidManagerName(String),

    #[error("Invalid class name: {0}")]
    InvalidClassName(String),

    #[error("Empty name")]
    Empty,
}

/// Namespace separator used by mapped document class names
pub const NAMESPACE_SEPARATOR: char = '\\';

fn check_identifier(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    Ok(())
}

/// Name of a configured backend connection (e.g., "default")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionName(String);

impl ConnectionName {
    /// Create a new ConnectionName with validation
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        check_identifier(&name)?;

        if name.chars().any(char::is_whitespace) {
            return Err(NameError::InvalidConnectionName(format!(
                "'{}' contains whitespace",
                name
            )));
        }

        Ok(Self(name))
    }

    /// The name used when no connection is configured explicitly
    pub fn default_name() -> Self {
        Self("default".to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConnectionName> for String {
    fn from(name: ConnectionName) -> Self {
        name.0
    }
}

impl FromStr for ConnectionName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ConnectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ConnectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Name of a document manager layered over a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ManagerName(String);

impl ManagerName {
    /// Create a new ManagerName with validation
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        check_identifier(&name)?;

        if name.chars().any(char::is_whitespace) {
            return Err(NameError::InvalidManagerName(format!(
                "'{}' contains whitespace",
                name
            )));
        }

        Ok(Self(name))
    }

    pub fn default_name() -> Self {
        Self("default".to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ManagerName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ManagerName> for String {
    fn from(name: ManagerName) -> Self {
        name.0
    }
}

impl FromStr for ManagerName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ManagerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ManagerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A fully-qualified mapped document class (e.g., "App\Document\Page")
///
/// Segments are separated by a backslash. A single leading separator is
/// accepted and stripped, so "\App\Page" and "App\Page" are the same class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassName(String);

impl ClassName {
    /// Parse a fully-qualified class name
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let trimmed = name.strip_prefix(NAMESPACE_SEPARATOR).unwrap_or(name);
        check_identifier(trimmed)?;

        if trimmed
            .split(NAMESPACE_SEPARATOR)
            .any(|segment| segment.is_empty())
        {
            return Err(NameError::InvalidClassName(format!(
                "Empty namespace segment in '{}'",
                name
            )));
        }

        if trimmed.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(NameError::InvalidClassName(format!(
                "Unexpected character in '{}'",
                name
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The class name without its namespace
    pub fn short_name(&self) -> &str {
        self.0
            .rsplit(NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or(&self.0)
    }

    /// The namespace part, if any
    pub fn namespace(&self) -> Option<&str> {
        self.0
            .rsplit_once(NAMESPACE_SEPARATOR)
            .map(|(namespace, _)| namespace)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClassName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClassName> for String {
    fn from(name: ClassName) -> Self {
        name.0
    }
}

impl FromStr for ClassName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
