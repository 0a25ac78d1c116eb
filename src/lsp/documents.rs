//! Open document tracking
//!
//! Every validation run is handed a [`ValidationTicket`] carrying a token
//! taken from a counter shared by all documents. A document remembers the
//! token of its latest run, so a result may only be published while its
//! ticket is still the newest one for a document that is still open.

use std::path::PathBuf;

use indexmap::IndexMap;
use tower_lsp::lsp_types::Url;
use tracing::debug;

/// Permission to publish the result of one validation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    pub uri: Url,
    pub path: PathBuf,
    pub token: u64,
}

/// Lifecycle state of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Closed,
    Idle,
    Validating,
}

#[derive(Debug)]
struct OpenDocument {
    /// `None` when the URI has no local path; such documents are never linted
    path: Option<PathBuf>,
    /// Token of the newest run that has not finished yet
    pending: Option<u64>,
}

/// Documents currently open in the editor, in the order they were opened
#[derive(Debug, Default)]
pub struct Documents {
    open: IndexMap<Url, OpenDocument>,
    last_token: u64,
}

impl Documents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an opened document and returns a ticket for its first run.
    ///
    /// Returns `None` for documents whose URI has no local file path.
    pub fn open(&mut self, uri: Url) -> Option<ValidationTicket> {
        let path = uri.to_file_path().ok();
        if path.is_none() {
            debug!(uri = %uri, "document has no local path, not linting");
        }
        self.open.insert(
            uri.clone(),
            OpenDocument {
                path,
                pending: None,
            },
        );
        self.request(&uri)
    }

    /// Starts a new run for an open document, superseding any pending one.
    pub fn request(&mut self, uri: &Url) -> Option<ValidationTicket> {
        let token = self.last_token + 1;
        let document = self.open.get_mut(uri)?;
        let path = document.path.clone()?;

        self.last_token = token;
        document.pending = Some(token);
        Some(ValidationTicket {
            uri: uri.clone(),
            path,
            token,
        })
    }

    /// Starts a new run for every open, lintable document.
    pub fn request_all(&mut self) -> Vec<ValidationTicket> {
        let uris: Vec<Url> = self.open.keys().cloned().collect();
        uris.iter().filter_map(|uri| self.request(uri)).collect()
    }

    /// Forgets a document. Returns false if it was not open.
    pub fn close(&mut self, uri: &Url) -> bool {
        self.open.shift_remove(uri).is_some()
    }

    /// Marks the run behind `ticket` as finished.
    ///
    /// Returns true if its result may be published, i.e. the document is
    /// still open and no newer run has been requested since.
    pub fn finish(&mut self, ticket: &ValidationTicket) -> bool {
        let Some(document) = self.open.get_mut(&ticket.uri) else {
            return false;
        };
        if document.pending != Some(ticket.token) {
            return false;
        }
        document.pending = None;
        true
    }

    pub fn state(&self, uri: &Url) -> DocumentState {
        match self.open.get(uri) {
            None => DocumentState::Closed,
            Some(OpenDocument { pending: None, .. }) => DocumentState::Idle,
            Some(OpenDocument {
                pending: Some(_), ..
            }) => DocumentState::Validating,
        }
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.open.contains_key(uri)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.open.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
