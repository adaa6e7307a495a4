//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Carries chain, mempool and ledger events between subsystems.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Chain/Mempool│                    │ Wallet Ledger│
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - Every subscriber observes events in publish order.
//! - Subscribers only see events published after they subscribed.
//! - A subscriber that falls more than the channel capacity behind loses the
//!   oldest events and logs a lag warning.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{ApiQueryError, BlockchainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Dead Letter Queue topic for failed messages.
pub const DLQ_TOPIC: &str = "dlq.critical";
