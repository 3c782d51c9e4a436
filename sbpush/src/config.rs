//! Command line arguments and environment configuration.
//!
//! Flags are parsed once into [`PushArgs`]; the connection-related environment
//! variables are captured once into [`Settings`]. Both are passed down into
//! [`crate::run`] so nothing below `main` touches the process environment.

use std::env;

use clap::Parser;
use tracing::debug;
use uuid::Uuid;

use crate::error::{PushError, Result};
use crate::queue::{Destination, DestinationKind};

/// Primary environment variable holding the broker connection string.
pub const CONNECTION_STRING_VAR: &str = "SB_CONNECTION_STRING";

/// Fallback environment variable, read when the primary one is unset or empty.
pub const ENDPOINT_VAR: &str = "SB_ENDPOINT";

const EXAMPLES: &str = "\
Examples:
  push --destination orders.created --type queue --payload payload.json
  push --queue orders.created --payload payload.json
  push -D orders.created -Y queue -P payload.json";

/// Publish a JSON message to a broker queue or topic.
///
/// The connection string is read from SB_CONNECTION_STRING (or SB_ENDPOINT),
/// optionally loaded from a local .env file.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "push", version, after_help = EXAMPLES)]
pub struct PushArgs {
    /// Queue name (legacy mode)
    #[arg(short = 'q', long, short_alias = 'Q')]
    pub queue: Option<String>,

    /// Topic name (legacy mode)
    #[arg(short = 't', long, short_alias = 'T')]
    pub topic: Option<String>,

    /// Destination name, queue or topic (unified mode)
    #[arg(short = 'd', long, short_alias = 'D')]
    pub destination: Option<String>,

    /// Destination type for unified mode: queue or topic
    #[arg(short = 'y', long = "type", short_alias = 'Y', value_name = "TYPE")]
    pub kind: Option<String>,

    /// Path to the JSON file to send
    #[arg(short = 'p', long, short_alias = 'P', value_name = "FILE")]
    pub payload: Option<String>,

    /// Correlation id for tracing; a UUID v4 is generated when omitted
    #[arg(long = "correlation-id", visible_alias = "cid", value_name = "ID")]
    pub correlation_id: Option<String>,
}

/// Returns the raw value when it is present and non-empty.
///
/// Whitespace-only values count as set; names are trimmed by
/// [`Destination::new`].
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl PushArgs {
    /// Check the destination flags and resolve the target.
    ///
    /// Rules are applied in order:
    /// 1. `--payload` is required.
    /// 2. Unified (`--destination`/`--type`) and legacy (`--queue`/`--topic`)
    ///    flags cannot be mixed.
    /// 3. Unified mode needs both flags and a type of `queue` or `topic`
    ///    (case-insensitive).
    /// 4. Legacy mode needs exactly one of `--queue` and `--topic`.
    pub fn validate(&self) -> Result<Destination> {
        if provided(&self.payload).is_none() {
            return Err(PushError::MissingPayload);
        }

        let destination = provided(&self.destination);
        let kind = provided(&self.kind);
        let queue = provided(&self.queue);
        let topic = provided(&self.topic);

        let using_unified = destination.is_some() || kind.is_some();
        let using_legacy = queue.is_some() || topic.is_some();

        if using_unified && using_legacy {
            return Err(PushError::MixedDestinationModes);
        }

        if using_unified {
            let (Some(name), Some(kind)) = (destination, kind) else {
                return Err(PushError::IncompleteUnifiedDestination);
            };
            let kind = kind
                .parse::<DestinationKind>()
                .map_err(|_| PushError::InvalidDestinationType(kind.to_string()))?;
            return Ok(Destination::new(name, kind));
        }

        match (queue, topic) {
            (None, None) => Err(PushError::MissingDestination),
            (Some(_), Some(_)) => Err(PushError::MultipleDestinations),
            (Some(name), None) => Ok(Destination::new(name, DestinationKind::Queue)),
            (None, Some(name)) => Ok(Destination::new(name, DestinationKind::Topic)),
        }
    }

    /// The payload path as given on the command line (may be relative).
    pub fn payload_path(&self) -> &str {
        self.payload.as_deref().unwrap_or_default()
    }

    /// The correlation id to attach to the message.
    pub fn correlation_id(&self) -> String {
        resolve_correlation_id(self.correlation_id.as_deref())
    }
}

/// Trim the user-supplied id, falling back to a random UUID v4 when it is
/// missing or blank.
pub fn resolve_correlation_id(supplied: Option<&str>) -> String {
    match supplied.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => {
            let id = Uuid::new_v4().to_string();
            debug!(correlation_id = %id, "correlation_id_generated");
            id
        }
    }
}

/// Connection settings captured from the environment at startup.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Raw value of `SB_CONNECTION_STRING`
    pub connection_string: Option<String>,

    /// Raw value of `SB_ENDPOINT`
    pub endpoint: Option<String>,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Settings {
            connection_string: lookup(CONNECTION_STRING_VAR),
            endpoint: lookup(ENDPOINT_VAR),
        }
    }

    /// Resolve the broker connection string.
    ///
    /// The primary variable wins when it is non-empty; otherwise the fallback
    /// is used. The chosen value must not be blank and is returned trimmed.
    pub fn resolve_connection_string(&self) -> Result<String> {
        let raw = self
            .connection_string
            .as_deref()
            .filter(|v| !v.is_empty())
            .or(self.endpoint.as_deref())
            .unwrap_or_default();

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PushError::MissingConnectionString);
        }
        Ok(trimmed.to_string())
    }
}
