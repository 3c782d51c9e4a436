//! AMQP implementation of the broker capability, backed by lapin.
//!
//! Queues are addressed through the default exchange with the queue name as
//! routing key. Topics are topic exchanges addressed by name. Both entities
//! must already exist on the broker: the sender checks with a passive declare.
//! Queue publishes are mandatory; topic publishes succeed with no subscribers.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lapin::{
    options::{
        BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueDeclareOptions,
    },
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tracing::{info, warn};

use super::broker::{BrokerClient, BrokerConnector, MessageSender};
use super::types::{Destination, DestinationKind, OutboundMessage};

/// Persistent delivery mode.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Reply code sent when closing channels and connections.
const REPLY_SUCCESS: u16 = 200;

/// Connects to an AMQP broker from an `amqp://` or `amqps://` URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpConnector;

#[async_trait]
impl BrokerConnector for AmqpConnector {
    async fn connect(&self, connection_string: &str) -> Result<Box<dyn BrokerClient>> {
        info!(url_length = connection_string.len(), "rabbitmq_connecting");

        let connection = Connection::connect(connection_string, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_connected");

        Ok(Box::new(AmqpClient { connection }))
    }
}

/// An open AMQP connection.
pub struct AmqpClient {
    connection: Connection,
}

#[async_trait]
impl BrokerClient for AmqpClient {
    async fn open_sender(&mut self, destination: &Destination) -> Result<Box<dyn MessageSender>> {
        let channel = self
            .connection
            .create_channel()
            .await
            .context("Failed to create channel")?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .context("Failed to enable publisher confirms")?;

        match destination.kind() {
            DestinationKind::Queue => {
                channel
                    .queue_declare(
                        destination.name(),
                        QueueDeclareOptions {
                            passive: true,
                            ..Default::default()
                        },
                        FieldTable::default(),
                    )
                    .await
                    .with_context(|| format!("Queue '{}' is not available", destination.name()))?;
            }
            DestinationKind::Topic => {
                channel
                    .exchange_declare(
                        destination.name(),
                        ExchangeKind::Topic,
                        ExchangeDeclareOptions {
                            passive: true,
                            ..Default::default()
                        },
                        FieldTable::default(),
                    )
                    .await
                    .with_context(|| format!("Topic '{}' is not available", destination.name()))?;
            }
        }

        info!(
            kind = %destination.kind(),
            name = %destination.name(),
            "rabbitmq_destination_verified"
        );

        Ok(Box::new(AmqpSender {
            channel,
            destination: destination.clone(),
        }))
    }

    async fn close(&mut self) {
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_connection_close_error");
        }
    }
}

/// A confirm-mode channel bound to one destination.
pub struct AmqpSender {
    channel: Channel,
    destination: Destination,
}

impl AmqpSender {
    /// Exchange and routing key used to reach the destination.
    fn route(&self) -> (&str, &str) {
        route_for(&self.destination)
    }
}

fn route_for(destination: &Destination) -> (&str, &str) {
    match destination.kind() {
        DestinationKind::Queue => ("", destination.name()),
        DestinationKind::Topic => (destination.name(), ""),
    }
}

/// Queues must route the message; a topic without matching subscribers
/// still accepts it.
fn publish_options(destination: &Destination) -> BasicPublishOptions {
    BasicPublishOptions {
        mandatory: destination.kind() == DestinationKind::Queue,
        ..Default::default()
    }
}

fn properties_for(message: &OutboundMessage) -> BasicProperties {
    BasicProperties::default()
        .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
        .with_content_type(message.content_type().into())
        .with_correlation_id(message.correlation_id().into())
}

#[async_trait]
impl MessageSender for AmqpSender {
    async fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        let (exchange, routing_key) = self.route();

        let confirmation = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                publish_options(&self.destination),
                message.body(),
                properties_for(message),
            )
            .await
            .context("Failed to publish message")?
            .await
            .context("Failed to confirm publish")?;

        match confirmation {
            Confirmation::Ack(None) | Confirmation::NotRequested => Ok(()),
            Confirmation::Ack(Some(_)) => Err(anyhow!(
                "Message was returned as unroutable by {}",
                self.destination
            )),
            Confirmation::Nack(_) => Err(anyhow!(
                "Broker rejected the message for {}",
                self.destination
            )),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_channel_close_error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_routes_through_default_exchange() {
        let destination = Destination::new("orders", DestinationKind::Queue);
        assert_eq!(route_for(&destination), ("", "orders"));
    }

    #[test]
    fn test_topic_routes_through_named_exchange() {
        let destination = Destination::new("events", DestinationKind::Topic);
        assert_eq!(route_for(&destination), ("events", ""));
    }

    #[test]
    fn test_only_queues_publish_mandatory() {
        let queue = Destination::new("orders", DestinationKind::Queue);
        assert!(publish_options(&queue).mandatory);

        let topic = Destination::new("events", DestinationKind::Topic);
        assert!(!publish_options(&topic).mandatory);
    }

    #[test]
    fn test_message_properties() {
        let message = OutboundMessage::json(b"[1,2]".to_vec(), "abc-123").unwrap();
        let properties = properties_for(&message);

        assert_eq!(
            properties.content_type().as_ref().map(|s| s.as_str()),
            Some("application/json")
        );
        assert_eq!(
            properties.correlation_id().as_ref().map(|s| s.as_str()),
            Some("abc-123")
        );
        assert_eq!(*properties.delivery_mode(), Some(DELIVERY_MODE_PERSISTENT));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_uri() {
        let result = AmqpConnector.connect("not a uri").await;
        assert!(result.is_err());
    }
}
