use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

use crate::config::CONFIG_SECTION;
use crate::lint::{Checker, parse_output};
use crate::lsp::diagnostics::to_diagnostics;
use crate::lsp::documents::{Documents, ValidationTicket};
use crate::settings::{ClientSettingsSource, LllSettings, SettingsCache, SettingsSource};

const DID_CHANGE_CONFIGURATION: &str = "workspace/didChangeConfiguration";

/// State shared between the protocol handlers and background validation runs
struct ServerState {
    documents: Mutex<Documents>,
    settings: SettingsCache,
    checker: Arc<dyn Checker>,
}

impl ServerState {
    /// One validation run: settings, checker, parse, publish.
    ///
    /// The settings entry is claimed while the document is known to be open,
    /// so a close that follows always drops it. The document table stays
    /// locked from the freshness check until the diagnostics are handed to
    /// the client, so a close or a newer request cannot slip in between.
    async fn validate(&self, client: &Client, ticket: ValidationTicket) {
        let lookup = {
            let documents = self.documents.lock().await;
            if !documents.is_open(&ticket.uri) {
                debug!(uri = %ticket.uri, "Document closed before validation started");
                return;
            }
            self.settings.lookup(&ticket.uri)
        };
        let settings = lookup.resolve().await;

        let result = self
            .checker
            .run(&ticket.path, settings.max_length)
            .await
            .map(|output| {
                let problems = parse_output(&output, settings.max_number_of_problems);
                to_diagnostics(&problems, settings.max_length)
            });
        if let Err(e) = &result {
            error!(uri = %ticket.uri, error = %e, "Checker failed");
        }

        let mut documents = self.documents.lock().await;
        if !documents.finish(&ticket) {
            debug!(
                uri = %ticket.uri,
                token = ticket.token,
                state = ?documents.state(&ticket.uri),
                "Discarding result of superseded validation run"
            );
            return;
        }

        let diagnostics = match result {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                client
                    .log_message(
                        MessageType::ERROR,
                        format!("lll failed for {}: {}", ticket.uri, e),
                    )
                    .await;
                return;
            }
        };

        info!(
            uri = %ticket.uri,
            count = diagnostics.len(),
            "Publishing diagnostics"
        );
        client
            .publish_diagnostics(ticket.uri, diagnostics, None)
            .await;
    }
}

pub struct Backend {
    client: Client,
    state: Arc<ServerState>,
    register_configuration: AtomicBool,
}

impl Backend {
    /// Creates a backend that runs `checker` and reads settings from the client.
    pub fn build(client: Client, checker: Arc<dyn Checker>) -> Self {
        let source = Arc::new(ClientSettingsSource::new(client.clone()));
        Self::build_with_source(client, checker, source)
    }

    pub fn build_with_source(
        client: Client,
        checker: Arc<dyn Checker>,
        source: Arc<dyn SettingsSource>,
    ) -> Self {
        let state = ServerState {
            documents: Mutex::new(Documents::new()),
            settings: SettingsCache::new(source),
            checker,
        };
        Self {
            client,
            state: Arc::new(state),
            register_configuration: AtomicBool::new(false),
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::NONE),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(false),
                    })),
                    ..Default::default()
                },
            )),
            ..Default::default()
        }
    }

    fn spawn_validation(&self, ticket: ValidationTicket) {
        let client = self.client.clone();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            state.validate(&client, ticket).await;
        });
    }

    /// Reads the `lll` section out of a didChangeConfiguration payload.
    fn global_settings(settings: &Value) -> LllSettings {
        let Some(section) = settings.get(CONFIG_SECTION) else {
            return LllSettings::default();
        };

        LllSettings::from_value(section.clone()).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring invalid global settings");
            LllSettings::default()
        })
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;

        let workspace = params.capabilities.workspace.as_ref();
        let per_resource = workspace
            .and_then(|w| w.configuration)
            .unwrap_or(false);
        let dynamic_registration = workspace
            .and_then(|w| w.did_change_configuration.as_ref())
            .and_then(|c| c.dynamic_registration)
            .unwrap_or(false);

        info!(
            per_resource,
            dynamic_registration, "Client configuration capabilities"
        );
        self.state.settings.set_per_resource(per_resource);
        self.register_configuration
            .store(dynamic_registration, Ordering::Release);

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "lll-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;

        if !self.register_configuration.load(Ordering::Acquire) {
            return;
        }

        let registration = Registration {
            id: DID_CHANGE_CONFIGURATION.to_string(),
            method: DID_CHANGE_CONFIGURATION.to_string(),
            register_options: None,
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            warn!(error = %e, "Failed to register for configuration changes");
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;

        self.client
            .log_message(MessageType::LOG, format!("Document opened: {}", uri))
            .await;

        let ticket = self.state.documents.lock().await.open(uri);
        if let Some(ticket) = ticket {
            self.spawn_validation(ticket);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;

        self.client
            .log_message(MessageType::LOG, format!("Document saved: {}", uri))
            .await;

        let ticket = self.state.documents.lock().await.request(&uri);
        if let Some(ticket) = ticket {
            self.spawn_validation(ticket);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        self.client
            .log_message(MessageType::LOG, format!("Document closed: {}", uri))
            .await;

        let mut documents = self.state.documents.lock().await;
        let was_open = documents.close(&uri);
        self.state.settings.invalidate(&uri);
        if was_open {
            // Clear whatever the last run left in the editor
            self.client.publish_diagnostics(uri, Vec::new(), None).await;
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.client
            .log_message(MessageType::LOG, "Configuration changed")
            .await;

        let settings = &self.state.settings;
        settings.invalidate_all();
        if !settings.is_per_resource() {
            settings.set_global(Self::global_settings(&params.settings));
        }

        let tickets = self.state.documents.lock().await.request_all();
        info!(count = tickets.len(), "Revalidating open documents");
        for ticket in tickets {
            self.spawn_validation(ticket);
        }
    }
}
