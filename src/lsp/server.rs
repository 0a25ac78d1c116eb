use std::sync::Arc;

use tower_lsp::{LspService, Server};
use tracing::info;

use crate::config::log_path;
use crate::lint::Checker;
use crate::log::init;
use crate::lsp::backend::Backend;

pub async fn run_server(checker: Arc<dyn Checker>) -> anyhow::Result<()> {
    init()?;

    info!(log_path = %log_path().display(), "Starting lll-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::build(client, checker));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("lll-lsp server stopped");
    Ok(())
}
