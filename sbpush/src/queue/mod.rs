//! Queue module for broker operations.
//!
//! This module provides:
//! - Destination and message types
//! - The injectable broker capability and the single-message publish routine
//! - An AMQP implementation of that capability
//!
//! ## Flow
//!
//! ```text
//! BrokerConnector → BrokerClient → MessageSender → send → close sender → close client
//! ```

pub mod broker;
pub mod publisher;
pub mod types;

pub use broker::{publish, BrokerClient, BrokerConnector, MessageSender, Receipt};
pub use publisher::AmqpConnector;
pub use types::{Destination, DestinationKind, OutboundMessage, CONTENT_TYPE};
