//! Resource urns: `module:resource`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AssetError;
use crate::module::ModuleName;

/// Fully qualified name of a module-provided resource.
///
/// Both halves compare ignoring ASCII case and are displayed lowercase.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUrn {
    module: String,
    resource: String,
}

impl ResourceUrn {
    /// Build an urn from a module and a bare resource name
    pub fn new(module: &ModuleName, resource: &str) -> Result<Self, AssetError> {
        validate_resource(resource)?;
        Ok(Self {
            module: module.normalised().to_string(),
            resource: resource.to_ascii_lowercase(),
        })
    }

    /// Parse `module:resource`
    pub fn parse(text: &str) -> Result<Self, AssetError> {
        let (module, resource) = text
            .split_once(':')
            .ok_or_else(|| AssetError::InvalidUrn(text.to_string()))?;
        let module = ModuleName::new(module).map_err(|_| AssetError::InvalidUrn(text.to_string()))?;
        Self::new(&module, resource).map_err(|_| AssetError::InvalidUrn(text.to_string()))
    }

    /// Lowercase module half
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Lowercase resource half
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Whether `text` looks qualified (contains a module separator)
    pub fn is_qualified(text: &str) -> bool {
        text.contains(':')
    }
}

fn validate_resource(resource: &str) -> Result<(), AssetError> {
    let valid = !resource.is_empty()
        && resource
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(AssetError::InvalidUrn(resource.to_string()))
    }
}

impl fmt::Display for ResourceUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.resource)
    }
}

impl fmt::Debug for ResourceUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceUrn({self})")
    }
}

impl FromStr for ResourceUrn {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceUrn {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceUrn> for String {
    fn from(urn: ResourceUrn) -> Self {
        urn.to_string()
    }
}
