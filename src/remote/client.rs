use super::{ExecutionParameter, RemoteError};
use crate::core::config::RemoteConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::Url;
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// ASCII set for encoding path segments (slashes included).
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'/').add(b'?').add(b'#');

const TOKEN_FIELDS: [&str; 3] = ["token", "access_token", "refresh_token"];

/// Bearer token returned by the login endpoint.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Lifecycle state reported for a workflow execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Running,
    Waiting,
    WaitingSignal,
    Completed,
    Failed,
    Canceled,
    Other(String),
}

impl ExecutionState {
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => ExecutionState::Running,
            "waiting" => ExecutionState::Waiting,
            "waiting-signal" => ExecutionState::WaitingSignal,
            "completed" => ExecutionState::Completed,
            "failed" => ExecutionState::Failed,
            "canceled" | "cancelled" => ExecutionState::Canceled,
            other => ExecutionState::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Failed | ExecutionState::Canceled
        )
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionState::Running => write!(f, "running"),
            ExecutionState::Waiting => write!(f, "waiting"),
            ExecutionState::WaitingSignal => write!(f, "waiting-signal"),
            ExecutionState::Completed => write!(f, "completed"),
            ExecutionState::Failed => write!(f, "failed"),
            ExecutionState::Canceled => write!(f, "canceled"),
            ExecutionState::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Attempts and linear backoff applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// HTTP client for the orchestrator's login and workflow execution endpoints.
#[derive(Clone)]
pub struct OrchestratorClient {
    http: reqwest::Client,
    base_url: Url,
    auth_path: String,
    retry: RetryPolicy,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl OrchestratorClient {
    /// Build a client from the remote configuration section.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base = config.base_url.as_deref().ok_or(RemoteError::MissingBaseUrl)?;
        let base_url =
            Url::parse(base).map_err(|err| RemoteError::Config(format!("base_url: {}", err)))?;
        let duration = |key: &str, parsed: Result<Duration, humantime::DurationError>| {
            parsed.map_err(|err| RemoteError::Config(format!("{}: {}", key, err)))
        };
        let request_timeout = duration("request_timeout", config.request_timeout())?;

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|err| RemoteError::Config(err.to_string()))?;

        Ok(Self {
            http,
            base_url,
            auth_path: config.auth_path.clone(),
            retry: RetryPolicy {
                attempts: config.retry_attempts.max(1),
                delay: duration("retry_delay", config.retry_delay())?,
            },
            poll_interval: duration("poll_interval", config.poll_interval())?,
            wait_timeout: duration("wait_timeout", config.wait_timeout())?,
        })
    }

    /// Exchange credentials for a bearer token.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, RemoteError> {
        let url = self.url(&[self.auth_path.trim_start_matches('/')]);
        let body: Value = self
            .with_retry("authenticate", || async {
                let response = self
                    .http
                    .post(&url)
                    .json(&json!({ "username": username, "password": password }))
                    .send()
                    .await
                    .map_err(network)?;
                let response = check_status(response).await?;
                response
                    .json::<Value>()
                    .await
                    .map_err(|err| RemoteError::Response(err.to_string()))
            })
            .await?;

        TOKEN_FIELDS
            .iter()
            .find_map(|field| body.get(*field).and_then(Value::as_str))
            .map(AuthToken::new)
            .ok_or_else(|| RemoteError::Response("login response carries no token".to_string()))
    }

    /// Start a workflow run and return its execution id.
    pub async fn start_execution(
        &self,
        token: &AuthToken,
        workflow_id: &str,
        parameters: &[ExecutionParameter],
    ) -> Result<String, RemoteError> {
        let url = self.url(&["vco", "api", "workflows", &encode_segment(workflow_id), "executions"]);
        let payload = json!({
            "parameters": parameters.iter().map(ExecutionParameter::to_payload).collect::<Vec<_>>()
        });

        let execution_id = self
            .with_retry("start execution", || async {
                let response = self
                    .http
                    .post(&url)
                    .header(AUTHORIZATION, token.header_value())
                    .json(&payload)
                    .send()
                    .await
                    .map_err(network)?;
                let response = check_status(response).await?;
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                // The run already started; a retry here would start it again.
                let text = response
                    .text()
                    .await
                    .map_err(|err| RemoteError::Response(err.to_string()))?;
                Ok(execution_id_from(&text, location.as_deref()))
            })
            .await?;

        let execution_id = execution_id.ok_or_else(|| {
            RemoteError::Response("execution response carries no id or Location".to_string())
        })?;
        tracing::info!(workflow_id, execution_id = %execution_id, "started remote execution");
        Ok(execution_id)
    }

    /// Fetch the current state of an execution.
    pub async fn execution_state(
        &self,
        token: &AuthToken,
        workflow_id: &str,
        execution_id: &str,
    ) -> Result<ExecutionState, RemoteError> {
        let url = self.url(&[
            "vco",
            "api",
            "workflows",
            &encode_segment(workflow_id),
            "executions",
            &encode_segment(execution_id),
            "state",
        ]);
        let body: Value = self
            .with_retry("execution state", || async {
                let response = self
                    .http
                    .get(&url)
                    .header(AUTHORIZATION, token.header_value())
                    .send()
                    .await
                    .map_err(network)?;
                let response = check_status(response).await?;
                response
                    .json::<Value>()
                    .await
                    .map_err(|err| RemoteError::Response(err.to_string()))
            })
            .await?;

        body.get("value")
            .and_then(Value::as_str)
            .map(ExecutionState::from_api)
            .ok_or_else(|| RemoteError::Response("state response carries no value".to_string()))
    }

    /// Poll until the execution reaches a terminal state or the wait timeout elapses.
    pub async fn wait_for_completion(
        &self,
        token: &AuthToken,
        workflow_id: &str,
        execution_id: &str,
    ) -> Result<ExecutionState, RemoteError> {
        let started = Instant::now();
        loop {
            let state = self.execution_state(token, workflow_id, execution_id).await?;
            if state.is_terminal() {
                return Ok(state);
            }
            let waited = started.elapsed();
            if waited + self.poll_interval > self.wait_timeout {
                return Err(RemoteError::Timeout {
                    execution_id: execution_id.to_string(),
                    state: state.to_string(),
                    waited,
                });
            }
            tracing::debug!(execution_id, state = %state, "execution still in progress");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Run `operation` up to `retry.attempts` times with linearly growing delays.
    async fn with_retry<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, RemoteError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "remote call failed, will retry"
                    );
                    tokio::time::sleep(self.retry.delay * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.as_str().trim_end_matches('/').to_string();
        for segment in segments {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }
}

fn network(err: reqwest::Error) -> RemoteError {
    RemoteError::Network(err.to_string())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        Err(RemoteError::Server {
            status: status.as_u16(),
            body,
        })
    } else {
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET).to_string()
}

/// Execution id from the response body `id`, falling back to the last Location segment.
fn execution_id_from(body: &str, location: Option<&str>) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("id").and_then(Value::as_str).map(str::to_string))
        .or_else(|| {
            location.and_then(|loc| {
                loc.trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
            })
        })
}
