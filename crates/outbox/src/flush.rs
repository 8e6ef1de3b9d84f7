//! Outbox flush job.

use std::sync::Arc;

use chrono::Utc;
use domain::DomainEvent;
use store::{UnitOfWork, UnitOfWorkExt};
use tracing::{error, info};

use crate::{EventRegistry, Mediator, OutboxError, Result};

/// Outcome of one [`OutboxFlusher::flush`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Unpublished messages read in this run.
    pub fetched: usize,

    /// Messages delivered and marked processed.
    pub published: usize,

    /// Messages left unprocessed for the next run.
    pub failed: usize,
}

/// Delivers pending outbox messages to the mediator.
///
/// Each run reads one page of unpublished messages oldest first, decodes and
/// publishes them one by one, and stamps the successful ones as processed in
/// a single save. A message that fails to decode or publish is logged and
/// left for the next run, so one bad message never blocks the others.
pub struct OutboxFlusher<E> {
    uow: Arc<dyn UnitOfWork>,
    registry: Arc<EventRegistry<E>>,
    mediator: Arc<Mediator<E>>,
}

impl<E> Clone for OutboxFlusher<E> {
    fn clone(&self) -> Self {
        Self {
            uow: Arc::clone(&self.uow),
            registry: Arc::clone(&self.registry),
            mediator: Arc::clone(&self.mediator),
        }
    }
}

impl<E: DomainEvent + 'static> OutboxFlusher<E> {
    pub fn new(
        uow: Arc<dyn UnitOfWork>,
        registry: Arc<EventRegistry<E>>,
        mediator: Arc<Mediator<E>>,
    ) -> Self {
        Self {
            uow,
            registry,
            mediator,
        }
    }

    /// Runs one flush inside a single unit-of-work scope.
    #[tracing::instrument(skip(self))]
    pub async fn flush(&self) -> Result<FlushReport> {
        let registry = Arc::clone(&self.registry);
        let mediator = Arc::clone(&self.mediator);

        let report = self
            .uow
            .run(move |scope| {
                Box::pin(async move {
                    let messages = scope.outbox().get_not_published_messages().await?;
                    let mut report = FlushReport {
                        fetched: messages.len(),
                        ..FlushReport::default()
                    };

                    let mut processed = Vec::with_capacity(messages.len());
                    for mut message in messages {
                        let event = match registry.decode(&message) {
                            Ok(event) => event,
                            Err(err) => {
                                error!(
                                    message_id = %message.id,
                                    event_type = %message.event_type,
                                    error = %err,
                                    "Failed to decode outbox message"
                                );
                                report.failed += 1;
                                continue;
                            }
                        };

                        if let Err(err) = mediator.publish(&event).await {
                            error!(
                                message_id = %message.id,
                                event_type = %message.event_type,
                                error = %err,
                                "Failed to publish outbox message"
                            );
                            report.failed += 1;
                            continue;
                        }

                        message.mark_processed(Utc::now());
                        processed.push(message);
                    }

                    report.published = processed.len();
                    if !processed.is_empty() {
                        scope.outbox().save(&processed).await?;
                    }

                    Ok::<_, OutboxError>(report)
                })
            })
            .await?;

        metrics::counter!("outbox_messages_published_total").increment(report.published as u64);
        metrics::counter!("outbox_messages_failed_total").increment(report.failed as u64);

        if report.fetched > 0 {
            info!(
                fetched = report.fetched,
                published = report.published,
                failed = report.failed,
                "Outbox flushed"
            );
        }

        Ok(report)
    }
}
