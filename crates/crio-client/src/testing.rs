//! Test utilities for crio-client
//!
//! Provides an in-process mock controller and a server harness so the
//! client can be exercised over real HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use crio_core::{Command, CrioError, HttpMethod, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::CrioClient;

/// A scripted controller response
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Option<String>,
    pub delay: Option<Duration>,
}

impl MockResponse {
    /// Response with a JSON body
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body.to_string()),
            delay: None,
        }
    }

    /// Response with an arbitrary (possibly non-JSON) body
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
            delay: None,
        }
    }

    /// Response without a body
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: None,
            delay: None,
        }
    }

    /// 400 with a well-formed bad-request envelope
    pub fn bad_request(message: &str, firmware_code: &str) -> Self {
        Self::json(
            400,
            json!({"400 (Bad Request) response": {
                "message": message,
                "LabVIEW error": firmware_code,
            }}),
        )
    }

    /// 403 with a well-formed service-inactive envelope
    pub fn service_inactive(message: &str) -> Self {
        Self::json(403, json!({"403 (Forbidden) response": {"message": message}}))
    }

    /// Wait before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request received by the mock controller
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<Command, MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock cRIO webserver
///
/// Answers every command with 200 by default (reads with sample bodies);
/// override per command with [`MockController::respond`].
#[derive(Clone, Default)]
pub struct MockController {
    state: Arc<MockState>,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for a command
    pub fn respond(self, command: Command, response: MockResponse) -> Self {
        self.state.responses.lock().insert(command, response);
        self
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Router serving the scripted responses
    pub fn router(&self) -> Router {
        Router::new().fallback(handle).with_state(self.clone())
    }

    fn response_for(&self, command: Command) -> MockResponse {
        if let Some(response) = self.state.responses.lock().get(&command) {
            return response.clone();
        }
        match command {
            Command::GetCurrentData => MockResponse::json(200, sample_current_data()),
            Command::GetSystemInformation => MockResponse::json(200, sample_system_information()),
            Command::GetAlarmInformation => MockResponse::json(200, json!({"Alarms": []})),
            _ => MockResponse::empty(200),
        }
    }
}

async fn handle(
    State(mock): State<MockController>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let body_json = serde_json::from_slice(&body).ok();
    mock.state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        body: body_json,
    });

    let command = path.rsplit('/').next().and_then(Command::from_path);
    let Some(command) = command else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let expected = match command.method() {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
    };
    if method != expected {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let response = mock.response_for(command);
    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        Some(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        None => status.into_response(),
    }
}

/// Current-data body in the firmware's format
pub fn sample_current_data() -> Value {
    json!({
        "CurrentData": {
            "TI-101": {"Value": 21.5, "Unit": "degC"},
            "PI-102": {"Value": 1.013, "Unit": "bar"},
            "FIC-103": {"Value": 12, "Unit": "kg/h"},
            "cRIO Timestamp": {"Value": "2024-01-01T00:00:00"}
        }
    })
}

/// System-information body in the firmware's format
pub fn sample_system_information() -> Value {
    json!({
        "Hostname": "crio-9045",
        "Firmware": "8.5.0",
        "Web Service": "running"
    })
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: CrioClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Start a server for a mock controller
    ///
    /// # Example
    ///
    /// ```ignore
    /// use crio_client::testing::{MockController, MockResponse, TestServer};
    ///
    /// let mock = MockController::new()
    ///     .respond(Command::SetSetpoint, MockResponse::bad_request("bad tag", "E12"));
    /// let server = TestServer::mock(&mock).await?;
    /// let err = server.client.set_setpoint(&Setpoint::new("T1", 42)).await.unwrap_err();
    /// ```
    pub async fn mock(mock: &MockController) -> Result<Self> {
        Self::start(mock.router()).await
    }

    /// Create a new test server from an axum Router
    pub async fn start(router: Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2)).await
    }

    /// Create a new test server with custom client timeouts
    pub async fn start_with_timeout(
        router: Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| CrioError::Config(format!("failed to bind test server: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| CrioError::Config(format!("failed to read test server address: {e}")))?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let client = CrioClient::with_config(&format!("http://{}", addr), Some(timeout), connect_timeout)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a reference to the client
    pub fn client(&self) -> &CrioClient {
        &self.client
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
