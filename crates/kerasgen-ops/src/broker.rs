//! Training job dispatch to RabbitMQ.
//!
//! Jobs are published through the broker's management HTTP API: a
//! connection is opened per job (checking the vhost is reachable with the
//! configured credentials), used for one publish to the default exchange,
//! and closed again on every path. Nothing is retried.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::error::{OpsError, OpsResult};

/// Something that can accept a serialized training job.
#[async_trait]
pub trait JobPublisher: std::fmt::Debug + Send + Sync {
    /// Publish one job payload.
    async fn publish(&self, payload: &[u8]) -> OpsResult<()>;
}

// =============================================================================
// RabbitMQ
// =============================================================================

/// Publishes jobs to the configured RabbitMQ queue.
#[derive(Debug, Clone)]
pub struct BrokerPublisher {
    client: Client,
    config: BrokerConfig,
}

impl BrokerPublisher {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl JobPublisher for BrokerPublisher {
    async fn publish(&self, payload: &[u8]) -> OpsResult<()> {
        let conn = BrokerConnection::connect(self.client.clone(), &self.config).await?;
        let result = conn.publish(payload).await;
        conn.close();
        result
    }
}

/// An authenticated session against one vhost.
#[derive(Debug)]
pub struct BrokerConnection {
    client: Client,
    base: Url,
    vhost: String,
    queue: String,
    account: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct PublishReply {
    routed: bool,
}

impl BrokerConnection {
    /// Open a connection, failing if the vhost is unreachable or the
    /// credentials are rejected.
    pub async fn connect(client: Client, config: &BrokerConfig) -> OpsResult<Self> {
        let base = Url::parse(&config.host)
            .map_err(|e| OpsError::broker("connect", format!("invalid host {}: {}", config.host, e)))?;
        let conn = Self {
            client,
            base,
            vhost: config.vhost.clone(),
            queue: config.queue.clone(),
            account: config.account.clone(),
            password: config.password.clone(),
        };

        let url = conn.endpoint(&["api", "vhosts", &conn.vhost])?;
        let response = conn
            .client
            .get(url)
            .basic_auth(&conn.account, Some(&conn.password))
            .send()
            .await
            .map_err(|e| OpsError::broker("connect", e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                debug!(host = %conn.base, vhost = %conn.vhost, "Broker connection open");
                Ok(conn)
            }
            StatusCode::UNAUTHORIZED => Err(OpsError::broker(
                "connect",
                format!("credentials rejected for account {}", conn.account),
            )),
            StatusCode::NOT_FOUND => Err(OpsError::broker(
                "connect",
                format!("vhost {} does not exist", conn.vhost),
            )),
            status => Err(OpsError::broker("connect", format!("unexpected status {}", status))),
        }
    }

    /// Publish a payload to the queue through the default exchange.
    pub async fn publish(&self, payload: &[u8]) -> OpsResult<()> {
        let url = self.endpoint(&["api", "exchanges", &self.vhost, "amq.default", "publish"])?;
        let body = json!({
            "properties": {
                "content_type": "application/json",
                "delivery_mode": 2
            },
            "routing_key": self.queue,
            "payload": String::from_utf8_lossy(payload),
            "payload_encoding": "string"
        });

        let response = self
            .client
            .post(url)
            .basic_auth(&self.account, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| OpsError::broker("publish", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OpsError::broker("publish", format!("unexpected status {}", status)));
        }

        let reply: PublishReply = response
            .json()
            .await
            .map_err(|e| OpsError::broker("publish", e.to_string()))?;
        if !reply.routed {
            warn!(queue = %self.queue, "Broker accepted the job but routed it nowhere");
            return Err(OpsError::broker(
                "publish",
                format!("message not routed to queue {}", self.queue),
            ));
        }

        info!(queue = %self.queue, bytes = payload.len(), "Training job published");
        Ok(())
    }

    /// Release the connection. Dropping it has the same effect.
    pub fn close(self) {
        drop(self);
    }

    /// URL under the management API; segments are percent-encoded, so the
    /// default vhost `/` becomes `%2F`.
    fn endpoint(&self, segments: &[&str]) -> OpsResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| OpsError::broker("connect", format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Drop for BrokerConnection {
    fn drop(&mut self) {
        debug!(host = %self.base, vhost = %self.vhost, "Broker connection closed");
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Collects published payloads in memory instead of sending them.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    published: Mutex<Vec<Vec<u8>>>,
    fail_with: Option<String>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher that rejects every job with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Payloads published so far.
    pub fn published(&self) -> Vec<Vec<u8>> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl JobPublisher for MemoryPublisher {
    async fn publish(&self, payload: &[u8]) -> OpsResult<()> {
        if let Some(message) = &self.fail_with {
            return Err(OpsError::broker("publish", message.clone()));
        }
        self.published
            .lock()
            .map_err(|e| OpsError::broker("publish", e.to_string()))?
            .push(payload.to_vec());
        Ok(())
    }
}
