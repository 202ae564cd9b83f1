//! The crawler's dispatch loop.
//!
//! Pops URLs from the source and hands each one to the push-delivery broker
//! with a fixed delivery delay. Dispatch is at-most-once: a failed publish is
//! logged and the job is dropped, with no retry and no dead-letter record.
//!
//! ```text
//! loop
//!   ├─► next_url()            (empty → idle wait, cancellable)
//!   ├─► JobMessage::new(url)  (fresh id, before any network call)
//!   └─► publish(delay = 60s)  (bounded by publish_timeout, cancellable)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{DispatchError, DispatchPolicy};
use crate::common::{JobId, JobMessage};
use crate::kernel::{BaseJobPublisher, BaseUrlSource};

/// Timing knobs for the dispatch loop.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Wait after an empty poll before polling again
    pub idle_interval: Duration,
    /// How long the broker holds each job before delivering it
    pub delivery_delay: Duration,
    /// Upper bound on a single publish call; expiry counts as a publish failure
    pub publish_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_secs(1),
            delivery_delay: Duration::from_secs(60),
            publish_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of one successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Source was empty
    Idle,
    /// Broker accepted the job
    Published {
        job_id: JobId,
        url: String,
        broker_message_id: Option<String>,
    },
}

pub struct Dispatcher {
    source: Arc<dyn BaseUrlSource>,
    publisher: Arc<dyn BaseJobPublisher>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn BaseUrlSource>,
        publisher: Arc<dyn BaseJobPublisher>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            source,
            publisher,
            config,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Pop one URL and, if there is one, publish it. No waiting, no retry.
    pub async fn poll_once(&self) -> Result<DispatchOutcome, DispatchError> {
        match self.next_message().await? {
            Some(message) => self.publish(&message).await,
            None => Ok(DispatchOutcome::Idle),
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Shutdown is honoured while idle-waiting and while a publish call is in
    /// flight; a job whose publish is interrupted is dropped like any other
    /// failed publish.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), DispatchError> {
        info!(
            idle_interval = ?self.config.idle_interval,
            delivery_delay = ?self.config.delivery_delay,
            publish_timeout = ?self.config.publish_timeout,
            "dispatcher starting"
        );

        while !shutdown.is_cancelled() {
            let message = match self.next_message().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    if !self.idle_wait(&shutdown).await {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "failed to read from URL source");
                    if !self.idle_wait(&shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            let result = tokio::select! {
                _ = shutdown.cancelled() => {
                    warn!(
                        job_id = %message.id(),
                        url = %message.url(),
                        "shutdown during publish, job dropped"
                    );
                    break;
                }
                result = self.publish(&message) => result,
            };

            if let Err(e) = result {
                match e.policy() {
                    DispatchPolicy::Fatal => {
                        error!(error = %e, "dispatcher cannot continue");
                        return Err(e);
                    }
                    DispatchPolicy::LogAndContinue => {
                        error!(
                            job_id = %message.id(),
                            url = %message.url(),
                            error = %e,
                            "failed to publish URL, job dropped"
                        );
                    }
                }
            }
        }

        info!("dispatcher stopped");
        Ok(())
    }

    async fn next_message(&self) -> Result<Option<JobMessage>, DispatchError> {
        let url = self
            .source
            .next_url()
            .await
            .map_err(DispatchError::Source)?;

        Ok(url.map(|url| {
            let message = JobMessage::new(url);
            info!(job_id = %message.id(), url = %message.url(), "processing URL");
            message
        }))
    }

    async fn publish(&self, message: &JobMessage) -> Result<DispatchOutcome, DispatchError> {
        let timeout = self.config.publish_timeout;
        let call = self.publisher.publish(message, self.config.delivery_delay);

        let receipt = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => return Err(DispatchError::from_publish(e, timeout)),
            Err(_) => return Err(DispatchError::PublishTimeout(timeout)),
        };

        info!(
            job_id = %message.id(),
            url = %message.url(),
            broker_message_id = ?receipt.broker_message_id,
            "published URL to broker"
        );

        Ok(DispatchOutcome::Published {
            job_id: message.id(),
            url: message.url().to_string(),
            broker_message_id: receipt.broker_message_id,
        })
    }

    /// Returns `false` if shutdown was requested during the wait.
    async fn idle_wait(&self, shutdown: &CancellationToken) -> bool {
        debug!(interval = ?self.config.idle_interval, "waiting before next poll");
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.config.idle_interval) => true,
        }
    }
}
