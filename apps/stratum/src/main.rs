//! # Stratum - Tiered Storage Coordinator
//!
//! The binary: CLI front end plus the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   apps/stratum (THE BINARY)                  │
//! │                                                              │
//! │   ┌─────────┐   ┌──────────┐                                 │
//! │   │   CLI   │   │ HTTP API │                                 │
//! │   │ (clap)  │   │  (axum)  │                                 │
//! │   └────┬────┘   └────┬─────┘                                 │
//! │        └──────┬──────┘                                       │
//! │               ▼                                              │
//! │        ┌─────────────┐   boot · sync · hydrator · warm       │
//! │        │   Bridge    │───────────────────────────────┐       │
//! │        └─────────────┘                               ▼       │
//! │                                              ┌──────────────┐│
//! │                                              │ stratum-core ││
//! │                                              │(capabilities)││
//! │                                              └──────────────┘│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! stratum serve --host 127.0.0.1 --port 8080
//! stratum status --json-mode
//! stratum export -o backup.strt
//! stratum query -s traverse -p '{"id": "e1", "depth": 2}'
//! ```

use clap::Parser;
use stratum::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // STRATUM_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("STRATUM_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stratum=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Stratum startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗████████╗██████╗  █████╗ ████████╗██╗   ██╗███╗   ███╗
  ██╔════╝╚══██╔══╝██╔══██╗██╔══██╗╚══██╔══╝██║   ██║████╗ ████║
  ███████╗   ██║   ██████╔╝███████║   ██║   ██║   ██║██╔████╔██║
  ╚════██║   ██║   ██╔══██╗██╔══██║   ██║   ██║   ██║██║╚██╔╝██║
  ███████║   ██║   ██║  ██║██║  ██║   ██║   ╚██████╔╝██║ ╚═╝ ██║
  ╚══════╝   ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝   ╚═╝    ╚═════╝ ╚═╝     ╚═╝

  Tiered Storage Coordinator v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
