//! Shared helpers for driving the server end to end
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::{Semaphore, mpsc};
use tower_lsp::ClientSocket;
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::lsp_types::{LogMessageParams, MessageType, PublishDiagnosticsParams};

use lll_lsp::lint::{Checker, CheckerError, LllChecker};

pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";
pub const LOG_MESSAGE: &str = "window/logMessage";

/// How long to wait for a notification that should arrive
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to watch for a notification that should not arrive
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

pub fn create_initialize_request(
    id: i64,
    configuration: bool,
    dynamic_registration: bool,
) -> Request {
    Request::build("initialize")
        .params(json!({
            "processId": null,
            "rootUri": null,
            "capabilities": {
                "workspace": {
                    "configuration": configuration,
                    "didChangeConfiguration": {
                        "dynamicRegistration": dynamic_registration
                    }
                }
            }
        }))
        .id(id)
        .finish()
}

pub fn create_initialized_notification() -> Request {
    Request::build("initialized").params(json!({})).finish()
}

pub fn create_did_open_notification(uri: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(json!({
            "textDocument": {
                "uri": uri,
                "languageId": "go",
                "version": 1,
                "text": ""
            }
        }))
        .finish()
}

pub fn create_did_save_notification(uri: &str) -> Request {
    Request::build("textDocument/didSave")
        .params(json!({ "textDocument": { "uri": uri } }))
        .finish()
}

pub fn create_did_close_notification(uri: &str) -> Request {
    Request::build("textDocument/didClose")
        .params(json!({ "textDocument": { "uri": uri } }))
        .finish()
}

pub fn create_did_change_configuration_notification(settings: Value) -> Request {
    Request::build("workspace/didChangeConfiguration")
        .params(json!({ "settings": settings }))
        .finish()
}

/// Editor side of the connection.
///
/// Forwards notifications to `notifications`, answers
/// `workspace/configuration` with the current `configuration` value and
/// every other request with `null`.
pub struct TestClient {
    pub notifications: mpsc::UnboundedReceiver<Request>,
    configuration: Arc<Mutex<Value>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestClient {
    pub fn set_configuration(&self, value: Value) {
        *self.configuration.lock().unwrap() = value;
    }

    /// Methods of every request the server sent, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn configuration_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|method| method.as_str() == "workspace/configuration")
            .count()
    }

    /// Waits for the next notification with `method`, skipping others
    pub async fn wait_for(&mut self, method: &str) -> Option<Request> {
        wait_for_notification(&mut self.notifications, method, RECEIVE_TIMEOUT).await
    }

    pub async fn wait_for_diagnostics(&mut self) -> PublishDiagnosticsParams {
        let notification = self
            .wait_for(PUBLISH_DIAGNOSTICS)
            .await
            .expect("Expected publishDiagnostics notification");
        serde_json::from_value(notification.params().unwrap().clone()).unwrap()
    }

    /// Collects `count` publishDiagnostics notifications keyed by URI
    pub async fn wait_for_diagnostics_of(
        &mut self,
        count: usize,
    ) -> HashMap<String, PublishDiagnosticsParams> {
        let mut received = HashMap::new();
        for _ in 0..count {
            let params = self.wait_for_diagnostics().await;
            received.insert(params.uri.to_string(), params);
        }
        received
    }

    /// Returns the publishDiagnostics notification sent within the quiet
    /// period, if any
    pub async fn unexpected_diagnostics(&mut self) -> Option<Request> {
        wait_for_notification(&mut self.notifications, PUBLISH_DIAGNOSTICS, QUIET_PERIOD).await
    }

    /// Messages of every error-level logMessage sent within the quiet period
    pub async fn error_log_messages(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Some(notification) = self.wait_for_within(LOG_MESSAGE, QUIET_PERIOD).await {
            let params: LogMessageParams =
                serde_json::from_value(notification.params().unwrap().clone()).unwrap();
            if params.typ == MessageType::ERROR {
                messages.push(params.message);
            }
        }
        messages
    }

    async fn wait_for_within(&mut self, method: &str, timeout: Duration) -> Option<Request> {
        wait_for_notification(&mut self.notifications, method, timeout).await
    }
}

pub fn spawn_test_client(socket: ClientSocket, configuration: Value) -> TestClient {
    let (tx, rx) = mpsc::unbounded_channel();
    let configuration = Arc::new(Mutex::new(configuration));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let (mut incoming, mut outgoing) = socket.split();
    let config = Arc::clone(&configuration);
    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        while let Some(request) = incoming.next().await {
            let Some(id) = request.id().cloned() else {
                if tx.send(request).is_err() {
                    break;
                }
                continue;
            };

            seen.lock().unwrap().push(request.method().to_string());
            let result = if request.method() == "workspace/configuration" {
                let items = request
                    .params()
                    .and_then(|params| params.get("items"))
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);
                Value::Array(vec![config.lock().unwrap().clone(); items])
            } else {
                Value::Null
            };

            if outgoing.send(Response::from_ok(id, result)).await.is_err() {
                break;
            }
        }
    });

    TestClient {
        notifications: rx,
        configuration,
        requests,
    }
}

pub async fn wait_for_notification(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
    timeout: Duration,
) -> Option<Request> {
    tokio::time::timeout(timeout, async {
        while let Some(notification) = rx.recv().await {
            if notification.method() == method {
                return Some(notification);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Polls `condition` until it holds, panicking after a few seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(RECEIVE_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Real checker running an inline shell script; inside the script `$2` is
/// the length limit and `$3` the file path
pub fn script_checker(script: &str) -> Arc<LllChecker> {
    Arc::new(LllChecker::new(
        "/bin/sh",
        vec!["-c".to_string(), script.to_string(), "lll".to_string()],
        Duration::from_secs(5),
    ))
}

#[derive(Debug, Clone)]
pub enum FakeOutput {
    Stdout(String),
    Fail,
}

/// In-process checker with scripted output per file.
///
/// Files without scripted output produce no output. With a gate, every run
/// waits for a permit before returning.
#[derive(Default)]
pub struct FakeChecker {
    outputs: Mutex<HashMap<PathBuf, FakeOutput>>,
    calls: Mutex<Vec<(PathBuf, u32)>>,
    runs_started: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn with_output(self, path: &str, output: &str) -> Self {
        self.set_output(path, FakeOutput::Stdout(output.to_string()));
        self
    }

    pub fn set_output(&self, path: &str, output: FakeOutput) {
        self.outputs
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), output);
    }

    /// Arguments of every run, in the order runs started
    pub fn calls(&self) -> Vec<(PathBuf, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn runs_started(&self) -> usize {
        self.runs_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Checker for FakeChecker {
    async fn run(&self, path: &Path, max_length: u32) -> Result<String, CheckerError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), max_length));
        self.runs_started.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let output = self.outputs.lock().unwrap().get(path).cloned();
        match output {
            Some(FakeOutput::Stdout(stdout)) => Ok(stdout),
            Some(FakeOutput::Fail) => Err(CheckerError::Spawn {
                program: "fake-lll".to_string(),
                source: io::Error::other("scripted failure"),
            }),
            None => Ok(String::new()),
        }
    }
}
