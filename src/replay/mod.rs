//! Seek-and-replay driver for a publish/subscribe subscription.
//!
//! The messaging service itself stays behind [`subscriber::SubscriberClient`];
//! [`memory::MemoryBroker`] is an in-process implementation of it.

pub mod memory;
pub mod subscriber;
