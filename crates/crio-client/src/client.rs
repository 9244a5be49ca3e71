//! cRIO webserver HTTP client implementation

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use crio_core::{
    classify, decode_error, normalize_current_data, normalize_object, Command, ControllerBackend,
    CrioError, CurrentData, DataLogging, Endpoint, OutcomeKind, PidConfiguration, Result,
    Setpoint, StructuredError, TransportFailure,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ClientConfig;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest body excerpt quoted in malformed-payload errors
const BODY_PREVIEW_LEN: usize = 200;

/// cRIO webserver client
///
/// Talks to exactly one controller. Each method issues a single request and
/// returns either the normalized result or one fully formed [`CrioError`];
/// nothing is retried. The client is cheap to clone and safe to share
/// between tasks.
#[derive(Debug, Clone)]
pub struct CrioClient {
    client: Client,
    endpoint: Endpoint,
    cancel: Option<CancellationToken>,
}

impl CrioClient {
    /// Create a new client with default timeouts
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the controller webserver (e.g., "http://192.168.1.10:8001")
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, Some(DEFAULT_TIMEOUT), DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts. `None` disables the request timeout.
    pub fn with_config(
        endpoint: &str,
        timeout: Option<Duration>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        Self::build(endpoint, timeout, Some(connect_timeout))
    }

    /// Create a client from a [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::build(&config.endpoint, config.timeout(), config.connect_timeout())
    }

    fn build(
        endpoint: &str,
        timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self> {
        let endpoint = Endpoint::parse(endpoint)?;

        // Redirects are answers too: the controller's own status gets classified
        let mut builder = Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(connect_timeout) = connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            CrioError::Config(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            endpoint,
            cancel: None,
        })
    }

    /// Attach a cancellation token.
    ///
    /// Once the token is cancelled, in-flight and later calls on this handle
    /// fail with a `Cancelled` transport error.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The controller endpoint
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    // =========================================================================
    // Read Commands
    // =========================================================================

    /// Get the latest values and units held by the controller
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn get_current_data(&self) -> Result<CurrentData> {
        info!("Getting current data");
        let body = self.get(Command::GetCurrentData).await?;
        normalize_current_data(&body).inspect_err(|e| report_violation(Command::GetCurrentData, e))
    }

    /// Get the controller's system information
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn get_system_information(&self) -> Result<Map<String, Value>> {
        info!("Getting system information");
        let body = self.get(Command::GetSystemInformation).await?;
        normalize_object(Command::GetSystemInformation, body)
            .inspect_err(|e| report_violation(Command::GetSystemInformation, e))
    }

    /// Get alarm information from the controller
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn get_alarm_information(&self) -> Result<Map<String, Value>> {
        info!("Getting alarm information");
        let body = self.get(Command::GetAlarmInformation).await?;
        normalize_object(Command::GetAlarmInformation, body)
            .inspect_err(|e| report_violation(Command::GetAlarmInformation, e))
    }

    // =========================================================================
    // Write Commands
    // =========================================================================

    /// Write one setpoint
    #[instrument(skip(self, setpoint), fields(endpoint = %self.endpoint, tag = setpoint.tag()))]
    pub async fn set_setpoint(&self, setpoint: &Setpoint) -> Result<()> {
        info!(value = %setpoint.value(), "Setting setpoint");
        self.put(Command::SetSetpoint, setpoint).await
    }

    /// Write several setpoints in one request, in the given order
    #[instrument(skip(self, setpoints), fields(endpoint = %self.endpoint, count = setpoints.len()))]
    pub async fn set_multiple_setpoints(&self, setpoints: &[Setpoint]) -> Result<()> {
        info!(
            tags = ?setpoints.iter().map(Setpoint::tag).collect::<Vec<_>>(),
            "Setting multiple setpoints"
        );
        self.put(Command::SetMultipleSetpoints, setpoints).await
    }

    /// Switch the controller's internal data logging on or off
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn switch_data_logging(&self, on: bool) -> Result<()> {
        info!("Switching controller data logging to {}", on);
        self.put(Command::SwitchDataLogging, &DataLogging { on }).await
    }

    /// Configure one of the PID controllers running on the cRIO
    #[instrument(skip(self, configuration), fields(endpoint = %self.endpoint, controller = configuration.controller()))]
    pub async fn configure_pid_controller(&self, configuration: &PidConfiguration) -> Result<()> {
        info!(
            pv = configuration.configuration().pv_tag(),
            cv = configuration.configuration().cv_tag(),
            "Configuring controller"
        );
        self.put(Command::ConfigurePIDController, configuration).await
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// GET a read command and return its parsed body
    async fn get(&self, command: Command) -> Result<Value> {
        let url = self.endpoint.url_for(command);
        info!("Accessing {}", url);
        self.dispatch(command, self.client.get(url)).await
    }

    /// PUT a write command with a JSON body
    async fn put<B: Serialize + ?Sized>(&self, command: Command, body: &B) -> Result<()> {
        let url = self.endpoint.url_for(command);
        info!("Accessing {}", url);
        self.dispatch(command, self.client.put(url).json(body))
            .await
            .map(|_| ())
    }

    /// Perform the request and route the response by status.
    ///
    /// Successful reads yield the parsed body; successful writes yield `Null`.
    async fn dispatch(&self, command: Command, request: RequestBuilder) -> Result<Value> {
        self.cancellable(command, async {
            let response = request
                .send()
                .await
                .map_err(|e| transport_error(command, TransportFailure::Request, e))?;
            route(command, response).await
        })
        .await
        .inspect_err(|e| report_violation(command, e))
    }

    async fn cancellable<F>(&self, command: Command, call: F) -> Result<Value>
    where
        F: Future<Output = Result<Value>>,
    {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(%command, "request cancelled");
                        Err(CrioError::transport(
                            TransportFailure::Cancelled,
                            format!("{command} cancelled"),
                        ))
                    }
                    result = call => result,
                }
            }
            None => call.await,
        }
    }
}

/// Classify the status, then normalize or decode the body
async fn route(command: Command, response: Response) -> Result<Value> {
    let status = response.status().as_u16();
    let kind = classify(status);
    debug!(%command, status, %kind, "controller responded");

    match kind {
        OutcomeKind::Success if command.is_read() => read_json(command, response).await,
        OutcomeKind::Success => Ok(Value::Null),
        kind if kind.has_error_envelope() => {
            let body = read_json(command, response).await?;
            let decoded = decode_error(kind, status, &body)?;
            error!(
                %command,
                status,
                message = decoded.message(),
                firmware_code = ?decoded.firmware_code(),
                "Controller rejected command"
            );
            Err(CrioError::from_structured(decoded))
        }
        _ => {
            warn!(%command, status, "Could not access the controller");
            Err(CrioError::from_structured(StructuredError::generic(kind, status)))
        }
    }
}

async fn read_json(command: Command, response: Response) -> Result<Value> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(command, TransportFailure::Body, e))?;

    serde_json::from_slice(&bytes).map_err(|e| {
        let text = String::from_utf8_lossy(&bytes);
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        CrioError::malformed(format!(
            "{command} response is not valid JSON: {e} (body preview: {preview:?})"
        ))
    })
}

/// Map a reqwest failure to a transport error; `fallback` applies when
/// the error is neither a timeout nor a connect failure
fn transport_error(command: Command, fallback: TransportFailure, err: reqwest::Error) -> CrioError {
    let kind = if err.is_timeout() {
        TransportFailure::Timeout
    } else if err.is_connect() {
        TransportFailure::Connect
    } else {
        fallback
    };
    CrioError::transport(kind, format!("{command}: {err}"))
}

fn report_violation(command: Command, err: &CrioError) {
    if err.is_contract_violation() {
        warn!(%command, error = %err, "Controller violated its response contract");
    }
}

#[async_trait]
impl ControllerBackend for CrioClient {
    fn describe(&self) -> String {
        format!("cRIO webserver at {}", self.endpoint)
    }

    async fn get_current_data(&self) -> Result<CurrentData> {
        CrioClient::get_current_data(self).await
    }

    async fn get_system_information(&self) -> Result<Map<String, Value>> {
        CrioClient::get_system_information(self).await
    }

    async fn get_alarm_information(&self) -> Result<Map<String, Value>> {
        CrioClient::get_alarm_information(self).await
    }

    async fn set_setpoint(&self, setpoint: &Setpoint) -> Result<()> {
        CrioClient::set_setpoint(self, setpoint).await
    }

    async fn set_multiple_setpoints(&self, setpoints: &[Setpoint]) -> Result<()> {
        CrioClient::set_multiple_setpoints(self, setpoints).await
    }

    async fn switch_data_logging(&self, on: bool) -> Result<()> {
        CrioClient::switch_data_logging(self, on).await
    }

    async fn configure_pid_controller(&self, configuration: &PidConfiguration) -> Result<()> {
        CrioClient::configure_pid_controller(self, configuration).await
    }
}
