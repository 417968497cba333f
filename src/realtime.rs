//! Practice-scoped realtime fan-out.
//!
//! Every appointment mutation publishes an [`AppointmentChange`] on the
//! practice channel (`practice:<id>`). Subscribers (SSE streams) receive the
//! events in publish order. Publishing is fire-and-forget: with no subscriber
//! the event is dropped, and a lagging subscriber skips what it missed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::AppointmentStatus;

/// Event name carried by every appointment change.
pub const APPOINTMENTS_UPDATED: &str = "appointments.updated";

const CHANNEL_CAPACITY: usize = 64;

/// Name of a realtime channel, e.g. `practice:default`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel(String);

impl Channel {
    pub fn practice(practice_id: &str) -> Self {
        Self(format!("practice:{practice_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Payload of an `appointments.updated` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AppointmentChange {
    Created { id: Uuid },
    Updated { id: Uuid },
    Canceled { id: Uuid },
    Status { id: Uuid, status: AppointmentStatus },
}

impl AppointmentChange {
    #[cfg(test)]
    pub fn appointment_id(&self) -> Uuid {
        match self {
            Self::Created { id } | Self::Updated { id } | Self::Canceled { id } => *id,
            Self::Status { id, .. } => *id,
        }
    }
}

/// An event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeEvent {
    pub event: &'static str,
    pub change: AppointmentChange,
}

/// Channel registry. Lives in `CoreState`, shared across requests.
#[derive(Debug, Default)]
pub struct RealtimeBroker {
    channels: Mutex<HashMap<Channel, broadcast::Sender<RealtimeEvent>>>,
}

impl RealtimeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receiver for all future events on `channel`.
    ///
    /// Channels whose receivers have all been dropped are released here, so
    /// the registry only holds channels someone is still listening on.
    pub fn subscribe(&self, channel: &Channel) -> broadcast::Receiver<RealtimeEvent> {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channels.retain(|_, sender| sender.receiver_count() > 0);
        channels
            .entry(channel.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes to current subscribers. Returns how many received it.
    pub fn publish(&self, channel: &Channel, change: AppointmentChange) -> usize {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(sender) = channels.get(channel) else {
            tracing::trace!(channel = channel.as_str(), "No subscribers, event dropped");
            return 0;
        };

        let event = RealtimeEvent {
            event: APPOINTMENTS_UPDATED,
            change,
        };
        match sender.send(event) {
            Ok(count) => count,
            Err(_) => {
                // Every receiver is gone.
                channels.remove(channel);
                0
            }
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self, channel: &Channel) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(channel)
            .map_or(0, |sender| sender.receiver_count())
    }

    #[cfg(test)]
    fn channel_count(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Handle bound to one practice channel, handed to the booking service.
#[derive(Debug, Clone)]
pub struct PracticeFeed {
    broker: Arc<RealtimeBroker>,
    channel: Channel,
}

impl PracticeFeed {
    pub fn new(broker: Arc<RealtimeBroker>, practice_id: &str) -> Self {
        Self {
            broker,
            channel: Channel::practice(practice_id),
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn publish(&self, change: AppointmentChange) -> usize {
        self.broker.publish(&self.channel, change)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.broker.subscribe(&self.channel)
    }
}
