//! Outbound notification transport.
//!
//! - [`SlotNotificationMessage`]: the message emitted once per newly
//!   created notification.
//! - [`NotificationPublisher`]: the seam the notification engine publishes
//!   through.
//! - [`EventBus`]: in-process fan-out backed by `tokio::sync::broadcast`.
//! - [`delivery::redis::RedisPublisher`]: Redis pub/sub delivery.
//! - [`NotificationRelay`]: background service forwarding bus messages to
//!   an external publisher.

pub mod bus;
pub mod delivery;
pub mod message;
pub mod publisher;
pub mod relay;

pub use bus::EventBus;
pub use delivery::redis::RedisPublisher;
pub use message::SlotNotificationMessage;
pub use publisher::{NotificationPublisher, PublishError};
pub use relay::NotificationRelay;
