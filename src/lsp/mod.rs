// LSP protocol layer
// - server.rs: stdio server entry point
// - backend.rs: LanguageServer trait implementation
// - documents.rs: open documents and validation tickets
// - diagnostics.rs: problems to LSP diagnostics

pub mod backend;
pub mod diagnostics;
pub mod documents;
pub mod server;
