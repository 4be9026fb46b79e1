use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::Notify;

use super::subscriber::{ReceivedMessage, SubscriberClient, SubscriptionError};

#[derive(Debug, Clone)]
struct StoredMessage {
    id: u64,
    data: Vec<u8>,
    attributes: HashMap<String, String>,
    publish_time: DateTime<Utc>,
}

#[derive(Debug)]
struct Subscription {
    topic: String,
    cursor: usize,
    acked: Vec<String>,
}

#[derive(Debug, Default)]
struct BrokerState {
    next_id: u64,
    topics: HashMap<String, Vec<StoredMessage>>,
    subscriptions: HashMap<String, Subscription>,
    closed: bool,
}

/// In-process broker that retains every published message, so seeking back
/// in time redelivers them.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
    notify: Notify,
}

impl MemoryBroker {
    pub fn new() -> MemoryBroker {
        MemoryBroker::default()
    }

    pub fn create_topic(&self, topic: &str) -> Result<(), SubscriptionError> {
        self.lock()?.topics.entry(topic.to_string()).or_default();
        Ok(())
    }

    pub fn publish(
        &self,
        topic: &str,
        data: impl Into<Vec<u8>>,
        attributes: HashMap<String, String>,
        publish_time: DateTime<Utc>,
    ) -> Result<u64, SubscriptionError> {
        let id = {
            let mut state = self.lock()?;
            let id = state.next_id;
            let messages = state
                .topics
                .get_mut(topic)
                .ok_or_else(|| SubscriptionError::NotFound(topic.to_string()))?;
            messages.push(StoredMessage {
                id,
                data: data.into(),
                attributes,
                publish_time,
            });
            state.next_id += 1;
            id
        };

        self.notify.notify_waiters();
        Ok(id)
    }

    /// Ends delivery: pulls return `None` once their backlog is drained.
    pub fn close(&self) -> Result<(), SubscriptionError> {
        self.lock()?.closed = true;
        self.notify.notify_waiters();
        Ok(())
    }

    pub fn acked(&self, subscription: &str) -> Result<Vec<String>, SubscriptionError> {
        let state = self.lock()?;
        let sub = state
            .subscriptions
            .get(subscription)
            .ok_or_else(|| SubscriptionError::NotFound(subscription.to_string()))?;
        Ok(sub.acked.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BrokerState>, SubscriptionError> {
        self.state
            .lock()
            .map_err(|_| SubscriptionError::Other(anyhow!("broker state lock poisoned")))
    }

    fn try_next(&self, subscription: &str) -> Result<Delivery, SubscriptionError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let sub = state
            .subscriptions
            .get_mut(subscription)
            .ok_or_else(|| SubscriptionError::NotFound(subscription.to_string()))?;
        let messages = state
            .topics
            .get(&sub.topic)
            .ok_or_else(|| SubscriptionError::NotFound(sub.topic.clone()))?;

        if let Some(stored) = messages.get(sub.cursor) {
            sub.cursor += 1;
            return Ok(Delivery::Message(ReceivedMessage {
                ack_id: format!("{}:{}", subscription, stored.id),
                data: stored.data.clone(),
                attributes: stored.attributes.clone(),
                publish_time: stored.publish_time,
            }));
        }

        if state.closed {
            Ok(Delivery::Closed)
        } else {
            Ok(Delivery::Pending)
        }
    }
}

enum Delivery {
    Message(ReceivedMessage),
    Pending,
    Closed,
}

impl SubscriberClient for MemoryBroker {
    fn create_subscription<'a>(
        &'a self,
        subscription: &'a str,
        topic: &'a str,
    ) -> BoxFuture<'a, Result<(), SubscriptionError>> {
        Box::pin(async move {
            let mut state = self.lock()?;
            if state.subscriptions.contains_key(subscription) {
                return Err(SubscriptionError::AlreadyExists(subscription.to_string()));
            }

            // New subscriptions only see what is published after them.
            let cursor = state
                .topics
                .get(topic)
                .map(Vec::len)
                .ok_or_else(|| SubscriptionError::NotFound(topic.to_string()))?;

            state.subscriptions.insert(
                subscription.to_string(),
                Subscription {
                    topic: topic.to_string(),
                    cursor,
                    acked: Vec::new(),
                },
            );
            Ok(())
        })
    }

    fn seek<'a>(
        &'a self,
        subscription: &'a str,
        time: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<(), SubscriptionError>> {
        Box::pin(async move {
            let mut guard = self.lock()?;
            let state = &mut *guard;
            let sub = state
                .subscriptions
                .get_mut(subscription)
                .ok_or_else(|| SubscriptionError::NotFound(subscription.to_string()))?;
            let messages = state
                .topics
                .get(&sub.topic)
                .ok_or_else(|| SubscriptionError::NotFound(sub.topic.clone()))?;

            sub.cursor = messages
                .iter()
                .position(|m| m.publish_time >= time)
                .unwrap_or(messages.len());
            Ok(())
        })
    }

    fn pull<'a>(
        &'a self,
        subscription: &'a str,
    ) -> BoxFuture<'a, Result<Option<ReceivedMessage>, SubscriptionError>> {
        Box::pin(async move {
            loop {
                let notified = self.notify.notified();
                match self.try_next(subscription)? {
                    Delivery::Message(message) => return Ok(Some(message)),
                    Delivery::Closed => return Ok(None),
                    Delivery::Pending => notified.await,
                }
            }
        })
    }

    fn ack<'a>(
        &'a self,
        subscription: &'a str,
        ack_id: &'a str,
    ) -> BoxFuture<'a, Result<(), SubscriptionError>> {
        Box::pin(async move {
            let mut state = self.lock()?;
            let sub = state
                .subscriptions
                .get_mut(subscription)
                .ok_or_else(|| SubscriptionError::NotFound(subscription.to_string()))?;
            sub.acked.push(ack_id.to_string());
            Ok(())
        })
    }
}
