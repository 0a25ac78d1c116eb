use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("workspace/configuration request failed: {0}")]
    Request(#[from] tower_lsp::jsonrpc::Error),

    #[error("client returned no configuration item")]
    Missing,

    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("maxLength must be a positive integer")]
    NonPositiveMaxLength,
}
