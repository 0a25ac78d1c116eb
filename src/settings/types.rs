//! Settings understood by the server

use serde::Deserialize;
use serde_json::Value;

use crate::config::{DEFAULT_MAX_LENGTH, DEFAULT_MAX_NUMBER_OF_PROBLEMS};
use crate::settings::error::SettingsError;

/// Contents of the `lll` settings section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LllSettings {
    /// Maximum line length passed to the checker as `-l`
    pub max_length: u32,
    /// Cap on diagnostics reported for one validation run
    pub max_number_of_problems: usize,
}

impl Default for LllSettings {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            max_number_of_problems: DEFAULT_MAX_NUMBER_OF_PROBLEMS,
        }
    }
}

impl LllSettings {
    /// Deserializes one settings section as returned by the client.
    ///
    /// `null` means the client has nothing configured, so the defaults apply.
    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let settings: Self = serde_json::from_value(value)?;
        settings.validated()
    }

    /// Rejects values the checker cannot be run with.
    pub fn validated(self) -> Result<Self, SettingsError> {
        if self.max_length == 0 {
            return Err(SettingsError::NonPositiveMaxLength);
        }
        Ok(self)
    }
}
