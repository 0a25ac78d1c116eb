pub mod config;
pub mod lint;
pub mod log;
pub mod lsp;
pub mod settings;
pub mod task;
