//! Where resource settings come from

use async_trait::async_trait;
use tower_lsp::Client;
use tower_lsp::lsp_types::{ConfigurationItem, Url};
use tracing::debug;

use crate::config::CONFIG_SECTION;
use crate::settings::error::SettingsError;
use crate::settings::types::LllSettings;

/// Trait for querying the settings that apply to one resource
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Fetches the `lll` settings section scoped to `scope`
    async fn fetch(&self, scope: &Url) -> Result<LllSettings, SettingsError>;
}

/// Asks the editor through `workspace/configuration`
pub struct ClientSettingsSource {
    client: Client,
}

impl ClientSettingsSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SettingsSource for ClientSettingsSource {
    async fn fetch(&self, scope: &Url) -> Result<LllSettings, SettingsError> {
        debug!(uri = %scope, "requesting workspace/configuration");

        let values = self
            .client
            .configuration(vec![ConfigurationItem {
                scope_uri: Some(scope.clone()),
                section: Some(CONFIG_SECTION.to_string()),
            }])
            .await?;

        let value = values.into_iter().next().ok_or(SettingsError::Missing)?;
        LllSettings::from_value(value)
    }
}
