//! Broker capability and the single-message publish routine.
//!
//! The transport is injected through [`BrokerConnector`], so the publish flow
//! can run against the AMQP implementation in [`super::publisher`] or against
//! an in-memory broker in tests.

use std::fmt;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use tracing::info;

use super::types::{Destination, OutboundMessage};
use crate::error::{PushError, Result};

/// Opens broker clients from a connection string.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self, connection_string: &str) -> AnyResult<Box<dyn BrokerClient>>;
}

/// An open connection to the broker.
#[async_trait]
pub trait BrokerClient: Send {
    /// Open a sender scoped to one queue or topic.
    async fn open_sender(&mut self, destination: &Destination) -> AnyResult<Box<dyn MessageSender>>;

    /// Release the connection. Failures are logged, not returned.
    async fn close(&mut self);
}

/// A sender bound to a single destination.
#[async_trait]
pub trait MessageSender: Send {
    /// Send one message and wait for the broker to accept it.
    async fn send(&mut self, message: &OutboundMessage) -> AnyResult<()>;

    /// Release the sender. Failures are logged, not returned.
    async fn close(&mut self);
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub destination: Destination,
    pub correlation_id: String,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "message sent to {} (correlationId={})",
            self.destination, self.correlation_id
        )
    }
}

/// Publish one JSON message.
///
/// The client is closed on every path once it has been opened, and the sender
/// is always closed before the client.
pub async fn publish<C>(
    connector: &C,
    connection_string: &str,
    destination: &Destination,
    body: Vec<u8>,
    correlation_id: String,
) -> Result<Receipt>
where
    C: BrokerConnector + ?Sized,
{
    let mut client = connector
        .connect(connection_string)
        .await
        .map_err(PushError::Client)?;

    info!("broker_client_opened");

    let result = publish_with_client(client.as_mut(), destination, body, correlation_id).await;

    client.close().await;
    info!("broker_client_closed");

    result
}

async fn publish_with_client(
    client: &mut dyn BrokerClient,
    destination: &Destination,
    body: Vec<u8>,
    correlation_id: String,
) -> Result<Receipt> {
    let mut sender = client
        .open_sender(destination)
        .await
        .map_err(PushError::Sender)?;

    info!(
        kind = %destination.kind(),
        name = %destination.name(),
        "broker_sender_opened"
    );

    let result = send_one(sender.as_mut(), destination, body, correlation_id).await;

    sender.close().await;
    info!("broker_sender_closed");

    result
}

async fn send_one(
    sender: &mut dyn MessageSender,
    destination: &Destination,
    body: Vec<u8>,
    correlation_id: String,
) -> Result<Receipt> {
    let message = OutboundMessage::json(body, correlation_id)?;

    sender.send(&message).await.map_err(PushError::Send)?;

    info!(
        kind = %destination.kind(),
        name = %destination.name(),
        correlation_id = %message.correlation_id(),
        body_length = message.body().len(),
        "message_published"
    );

    Ok(Receipt {
        destination: destination.clone(),
        correlation_id: message.correlation_id().to_string(),
    })
}
