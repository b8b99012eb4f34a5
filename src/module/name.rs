//! Validated module identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::EnvError;

/// A module identifier.
///
/// Identifiers start with an ASCII letter or digit and continue with letters,
/// digits, `_` or `-`. Two names are equal when they match ignoring ASCII
/// case; the spelling first given is kept for display.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleName {
    original: String,
    normalised: String,
}

impl ModuleName {
    /// Validate a module identifier
    pub fn new(name: &str) -> Result<Self, EnvError> {
        let invalid = |reason: &'static str| EnvError::InvalidModuleName {
            name: name.to_string(),
            reason,
        };

        let mut chars = name.chars();
        match chars.next() {
            None => return Err(invalid("name is empty")),
            Some(first) if !first.is_ascii_alphanumeric() => {
                return Err(invalid("name must start with a letter or digit"));
            }
            Some(_) => {}
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(invalid("name may only contain letters, digits, '_' and '-'"));
        }

        Ok(Self {
            original: name.to_string(),
            normalised: name.to_ascii_lowercase(),
        })
    }

    /// Name as first spelled
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Lowercase form used for comparisons and urns
    pub fn normalised(&self) -> &str {
        &self.normalised
    }
}

impl PartialEq for ModuleName {
    fn eq(&self, other: &Self) -> bool {
        self.normalised == other.normalised
    }
}

impl Eq for ModuleName {}

impl Hash for ModuleName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalised.hash(state);
    }
}

impl PartialOrd for ModuleName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.normalised.cmp(&other.normalised)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl fmt::Debug for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleName({})", self.original)
    }
}

impl TryFrom<String> for ModuleName {
    type Error = EnvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ModuleName::new(&value)
    }
}

impl From<ModuleName> for String {
    fn from(name: ModuleName) -> Self {
        name.original
    }
}
