use crate::error::MappingError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated alias identifying a stored URL mapping.
///
/// Aliases are 1-32 characters long and contain only ASCII letters and
/// digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alias(String);

pub const MIN_LENGTH: usize = 1;
pub const MAX_LENGTH: usize = 32;

impl Alias {
    /// Creates a new `Alias` after validating the input.
    pub fn new(alias: impl Into<String>) -> std::result::Result<Self, MappingError> {
        let alias = alias.into();
        Self::validate(&alias)?;
        Ok(Self(alias))
    }

    /// Creates an `Alias` without validation.
    ///
    /// Use this only for values produced by trusted internal sources, such
    /// as a generator with a known alphabet or a row read back from storage.
    pub fn new_unchecked(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the alias as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn validate(alias: &str) -> std::result::Result<(), MappingError> {
        if alias.len() < MIN_LENGTH || alias.len() > MAX_LENGTH {
            return Err(MappingError::InvalidAlias(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                alias.len()
            )));
        }

        if !alias.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MappingError::InvalidAlias(format!(
                "must contain only alphanumeric characters: '{}'",
                alias
            )));
        }

        Ok(())
    }
}

impl TryFrom<String> for Alias {
    type Error = MappingError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Alias> for String {
    fn from(value: Alias) -> Self {
        value.0
    }
}

impl AsRef<str> for Alias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
