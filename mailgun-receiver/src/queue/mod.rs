//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - Message types for rejection notices and operator alerts
//! - Async publisher for enqueueing messages
//!
//! ## Architecture
//!
//! ```text
//! Web Server → rejection_notices queue → Mailer
//!            → operator_alerts queue   → Error tracking
//! ```

pub mod publisher;
pub mod types;

pub use publisher::Publisher;
pub use types::{OperatorAlert, RejectionNotice, ALERT_QUEUE, REJECTION_QUEUE};
