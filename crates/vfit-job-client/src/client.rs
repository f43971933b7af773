//! Job server HTTP client.

use std::time::{Duration, Instant};

use image::DynamicImage;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::error::{JobError, JobResult};
use crate::jobs::{JobCatalog, JobInput, JobKind, JobStrategy};
use crate::retry::{drive, RetryPolicy, RunOutcome};
use crate::types::{validate_response, Payload};

/// Fixed sleep between retry attempts.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Timeout for the side-channel health probe.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a job client.
#[derive(Debug, Clone)]
pub struct JobClientConfig {
    /// Base URL of the job server.
    pub base_url: String,
    /// Overall transport timeout for one attempt.
    pub timeout: Duration,
    /// Attempt budget, including the first attempt.
    pub max_attempts: u32,
}

impl Default for JobClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(600), // inference jobs can run for minutes
            max_attempts: 3,
        }
    }
}

impl JobClientConfig {
    /// Config for a given server, with default timeout and attempt budget.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("JOB_SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("JOB_SERVER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            max_attempts: std::env::var("JOB_SERVER_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }
}

/// Client for one job kind against one server.
///
/// The encode/decode strategy is resolved once at construction; all per-call
/// state lives on the stack, so an instance can be shared freely across
/// sequential calls.
pub struct JobClient {
    http: Client,
    kind: JobKind,
    strategy: JobStrategy,
    config: JobClientConfig,
}

impl JobClient {
    /// Create a client for a job type tag.
    ///
    /// Fails with [`JobError::UnknownJobType`] before any network activity
    /// when the tag is not in the catalog.
    pub fn new(catalog: &JobCatalog, job_type: &str, config: JobClientConfig) -> JobResult<Self> {
        let (kind, strategy) = catalog.resolve(job_type)?;
        Self::build(kind, strategy, config)
    }

    /// Create a client for an already-typed job kind.
    pub fn for_kind(catalog: &JobCatalog, kind: JobKind, config: JobClientConfig) -> JobResult<Self> {
        let strategy = catalog
            .strategy(kind)
            .ok_or_else(|| JobError::unknown_job_type(kind.as_str()))?;
        Self::build(kind, strategy, config)
    }

    fn build(kind: JobKind, strategy: JobStrategy, config: JobClientConfig) -> JobResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(JobError::Transport)?;

        Ok(Self {
            http,
            kind,
            strategy,
            config,
        })
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Run one job to completion.
    ///
    /// Encodes the input (failing fast on missing fields), then drives
    /// send → validate → decode through the retry loop. On exhaustion the
    /// last error is surfaced to the caller.
    pub async fn run_job(&self, input: &JobInput) -> JobResult<DynamicImage> {
        let started = Instant::now();

        // Encoding is pure and deterministic, so it happens once, outside
        // the retry loop.
        let payload = (self.strategy.encode)(input)?;

        let policy = RetryPolicy {
            max_attempts: self.config.max_attempts,
            delay: RETRY_DELAY,
        };
        let payload_ref = &payload;
        let outcome = drive(&policy, |attempt| async move {
            debug!(
                "sending {} request to {} (attempt {})",
                self.kind, self.config.base_url, attempt
            );
            self.attempt(payload_ref).await
        })
        .await;

        match outcome {
            RunOutcome::Succeeded { value, attempts } => {
                info!(
                    "{} completed after {} attempt(s) in {:.2?}",
                    self.kind,
                    attempts,
                    started.elapsed()
                );
                Ok(value)
            }
            RunOutcome::Exhausted { error, attempts } => {
                error!("{} failed after {} attempt(s): {}", self.kind, attempts, error);
                if let JobError::Server { envelope, .. } = &error {
                    if let Some(trace) = envelope.stack_trace.as_deref() {
                        error!("server stack trace:\n{}", trace);
                    }
                }
                Err(error)
            }
        }
    }

    /// One send → validate → decode cycle.
    async fn attempt(&self, payload: &Payload) -> JobResult<DynamicImage> {
        let url = format!("{}/run_job", self.config.base_url);
        let form = payload.to_form()?;

        let response = self.http.post(&url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        let success = validate_response(status, &body)?;
        (self.strategy.decode)(&success)
    }

    /// Side-channel liveness check against `{base_url}/health`.
    ///
    /// True only on status 200; any failure, including timeout, reads as
    /// unhealthy. Never errors.
    pub async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!("health check failed for {}: {}", self.config.base_url, e);
                false
            }
        }
    }
}
