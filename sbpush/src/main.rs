//! push - publish a JSON file to a broker queue or topic.
//!
//! Reads the connection string from SB_CONNECTION_STRING (or SB_ENDPOINT),
//! optionally from a local .env file, and sends exactly one message.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sbpush::{AmqpConnector, PushArgs, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // The .env file is optional; load it first so RUST_LOG from it applies
    let dotenv = dotenvy::dotenv();

    // Structured JSON logging on stderr; stdout only carries the confirmation
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(std::io::stderr),
        )
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "dotenv_loaded"),
        Err(e) if e.not_found() => debug!("dotenv_absent"),
        Err(e) => warn!(error = %e, "dotenv_invalid"),
    }

    let args = match PushArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // Help and version requests are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let settings = Settings::from_env();
    info!(
        connection_string_set = settings.connection_string.is_some(),
        endpoint_set = settings.endpoint.is_some(),
        "config_loaded"
    );

    match sbpush::run(&args, &settings, &AmqpConnector).await {
        Ok(receipt) => {
            println!("{receipt}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            // The user-facing report is the single line below
            debug!(error = %e, broker = e.is_broker(), "push_failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
