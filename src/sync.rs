use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::{Endpoint, SyncError, payload::HostHeaders, projector::Projection};

/// Path of the rules route on the injection service
pub const RULES_PATH: &str = "/rules";

/// Default timeout for one rules POST (5 seconds)
///
/// The service is local; anything slower means it is down or wedged, and the next edit
/// re-sends the full state anyway.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the injection service answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

/// Delivers a rules request to a URL
///
/// [`HttpTransport`] is the production implementation; tests substitute recorders.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// POST `body` as JSON to `url`
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on transport failure, timeout, or a non-2xx status.
    async fn post_rules(&self, url: &str, body: &[HostHeaders]) -> Result<Delivery, SyncError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_rules(&self, url: &str, body: &[HostHeaders]) -> Result<Delivery, SyncError> {
        let response = timeout(self.timeout, self.client.post(url).json(body).send())
            .await
            .map_err(|_| SyncError::Timeout {
                operation: format!("POST {url}"),
                duration: self.timeout,
            })??;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(Delivery {
            status: status.as_u16(),
            body: text,
        })
    }
}

/// Builder for the HTTP-backed [`SyncClient`]
///
/// # Example
///
/// ```ignore
/// let client = SyncClientBuilder::new()
///     .timeout(Duration::from_secs(2))
///     .user_agent("headit-popup")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SyncClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for SyncClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Per-request timeout
    #[must_use]
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// `User-Agent` sent with each POST (defaults to `headit_sync/<version>`)
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// # Errors
    ///
    /// Returns `SyncError::Http` if the underlying reqwest client cannot be constructed.
    pub fn build(self) -> Result<SyncClient<HttpTransport>, SyncError> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("headit_sync/{}", env!("CARGO_PKG_VERSION")));
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(SyncClient::with_transport(HttpTransport {
            client,
            timeout: self.timeout,
        }))
    }
}

/// Result of one synchronization attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing to send and no clear requested
    Skipped,
    Delivered {
        status: u16,
        hosts: usize,
        at: DateTime<Utc>,
    },
    Failed {
        reason: String,
    },
}

/// Cheap-to-clone handle that pushes projections to the injection service
///
/// Cloning only copies an `Arc`, so each sync can run on its own task.
pub struct SyncClient<T = HttpTransport> {
    transport: Arc<T>,
}

impl<T> Clone for SyncClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl SyncClient<HttpTransport> {
    #[must_use]
    pub fn builder() -> SyncClientBuilder {
        SyncClientBuilder::new()
    }
}

impl<T: Transport> SyncClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Send `projection` to `{endpoint}/rules`
    ///
    /// An empty projection is only sent when `force` is set, which lets the service clear
    /// hosts that no longer have enabled rules. Failures are logged and reported in the
    /// returned outcome; they never propagate.
    pub async fn sync(&self, projection: &Projection, endpoint: &Endpoint, force: bool) -> SyncOutcome {
        let request = projection.to_request();
        if request.is_empty() && !force {
            debug!("no enabled rules, skipping sync");
            return SyncOutcome::Skipped;
        }

        let url = endpoint.join(RULES_PATH);
        debug!(%url, hosts = request.len(), force, "sending rules");

        match self.transport.post_rules(&url, &request).await {
            Ok(delivery) => {
                debug!(status = delivery.status, body = %delivery.body, "injection service response");
                SyncOutcome::Delivered {
                    status: delivery.status,
                    hosts: request.len(),
                    at: Utc::now(),
                }
            }
            Err(e) => {
                error!(%url, error = %e, "rule sync failed");
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
