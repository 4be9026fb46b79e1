use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use log::info;
use thiserror::Error;
use tokio::sync::broadcast;

pub const DEFAULT_LOOKBACK_MINUTES: i64 = 10;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Subscription {0} already exists")]
    AlreadyExists(String),

    #[error("Resource {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub ack_id: String,
    pub data: Vec<u8>,
    pub attributes: HashMap<String, String>,
    pub publish_time: DateTime<Utc>,
}

/// The slice of a pub/sub service the replay driver needs.
pub trait SubscriberClient: Send + Sync {
    fn create_subscription<'a>(
        &'a self,
        subscription: &'a str,
        topic: &'a str,
    ) -> BoxFuture<'a, Result<(), SubscriptionError>>;

    fn seek<'a>(
        &'a self,
        subscription: &'a str,
        time: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<(), SubscriptionError>>;

    /// Waits for the next message. `None` means the subscription will not
    /// deliver anything more.
    fn pull<'a>(
        &'a self,
        subscription: &'a str,
    ) -> BoxFuture<'a, Result<Option<ReceivedMessage>, SubscriptionError>>;

    fn ack<'a>(
        &'a self,
        subscription: &'a str,
        ack_id: &'a str,
    ) -> BoxFuture<'a, Result<(), SubscriptionError>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub seek_time: DateTime<Utc>,
    pub handled: usize,
}

pub fn topic_path(project: &str, topic: &str) -> String {
    format!("projects/{project}/topics/{topic}")
}

pub fn subscription_path(project: &str, subscription: &str) -> String {
    format!("projects/{project}/subscriptions/{subscription}")
}

/// Creates the subscription, treating an existing one as success.
pub async fn ensure_subscription<C: SubscriberClient + ?Sized>(
    client: &C,
    subscription: &str,
    topic: &str,
) -> Result<(), SubscriptionError> {
    match client.create_subscription(subscription, topic).await {
        Ok(()) => {
            info!("Subscription {} created", subscription);
            Ok(())
        }
        Err(SubscriptionError::AlreadyExists(_)) => {
            info!("Subscription {} already exists", subscription);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Moves the delivery cursor back to `now - lookback` and returns that time.
pub async fn seek_to<C: SubscriberClient + ?Sized>(
    client: &C,
    subscription: &str,
    now: DateTime<Utc>,
    lookback: Duration,
) -> Result<DateTime<Utc>, SubscriptionError> {
    let target = now - lookback;
    client.seek(subscription, target).await?;
    info!("Seek done to {}", target.to_rfc3339());
    Ok(target)
}

/// Hands every delivered message to `handler` and acknowledges it.
///
/// Returns the number of handled messages once the subscription runs dry or
/// `shutdown_rx` fires. A pending pull is dropped on shutdown.
pub async fn stream_messages<C, H>(
    client: &C,
    subscription: &str,
    mut handler: H,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<usize, SubscriptionError>
where
    C: SubscriberClient + ?Sized,
    H: FnMut(&ReceivedMessage),
{
    let mut handled = 0;

    loop {
        let pulled = tokio::select! {
            pulled = client.pull(subscription) => pulled?,
            _ = shutdown_rx.recv() => {
                info!("Subscription {} cancelled", subscription);
                break
            }
        };

        let message = match pulled {
            Some(message) => message,
            None => break,
        };

        handler(&message);
        client.ack(subscription, &message.ack_id).await?;
        handled += 1;
    }

    Ok(handled)
}

pub async fn replay<C, H>(
    client: &C,
    subscription: &str,
    topic: &str,
    lookback: Duration,
    handler: H,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<ReplayReport, SubscriptionError>
where
    C: SubscriberClient + ?Sized,
    H: FnMut(&ReceivedMessage),
{
    ensure_subscription(client, subscription, topic).await?;
    let seek_time = seek_to(client, subscription, Utc::now(), lookback).await?;
    let handled = stream_messages(client, subscription, handler, shutdown_rx).await?;

    Ok(ReplayReport { seek_time, handled })
}

pub fn log_message(message: &ReceivedMessage) {
    info!(
        "data: {} | attributes: {:?}",
        String::from_utf8_lossy(&message.data),
        message.attributes
    );
}
