//! Settings layer
//! - types.rs: LllSettings as sent by the client
//! - error.rs: SettingsError
//! - source.rs: SettingsSource trait and the workspace/configuration client
//! - cache.rs: per-resource settings cache

pub mod cache;
pub mod error;
pub mod source;
pub mod types;

pub use cache::{SettingsCache, SettingsLookup};
pub use error::SettingsError;
pub use source::{ClientSettingsSource, SettingsSource};
pub use types::LllSettings;
