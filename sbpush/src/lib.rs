//! sbpush - publish a single JSON payload to a broker queue or topic.
//!
//! The `push` binary wires these modules together:
//!
//! ```text
//! args → validate → connection string → payload → correlation id → publish
//! ```
//!
//! Each step fails fast; nothing is retried.

pub mod config;
pub mod error;
pub mod payload;
pub mod queue;

// Re-export commonly used types
pub use config::{PushArgs, Settings};
pub use error::{PushError, Result};
pub use queue::{AmqpConnector, BrokerConnector, Destination, DestinationKind, Receipt};

use tracing::info;

/// Run one push: validate the arguments, load the payload and publish it.
///
/// The connection string is resolved before the payload file is touched, and
/// the broker is only contacted once every local check has passed.
pub async fn run<C>(args: &PushArgs, settings: &Settings, connector: &C) -> Result<Receipt>
where
    C: BrokerConnector + ?Sized,
{
    let destination = args.validate()?;
    info!(
        kind = %destination.kind(),
        name = %destination.name(),
        "destination_resolved"
    );

    let connection_string = settings.resolve_connection_string()?;

    let body = payload::load_json(args.payload_path())?;

    let correlation_id = args.correlation_id();

    queue::publish(connector, &connection_string, &destination, body, correlation_id).await
}
