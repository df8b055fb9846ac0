//! `memoir` command-line client.
//!
//! | Env Var                         | Default  |
//! |---------------------------------|----------|
//! | `MEMOIR_API_BASE_URL`           | required unless `--base-url` |
//! | `MEMOIR_REQUEST_TIMEOUT_MS`     | `30000`  |
//! | `MEMOIR_RETRY_ATTEMPTS`         | `3`      |
//! | `MEMOIR_RETRY_DELAY_MS`         | `1000`   |
//! | `MEMOIR_POLL_INTERVAL_MS`       | `5000`   |
//! | `MEMOIR_MAX_DURATION_MS`        | `600000` |
//! | `MEMOIR_MAX_CONSECUTIVE_ERRORS` | `5`      |
//! | `LOG_FORMAT`                    | `text` (`json` for structured logs) |
//! | `RUST_LOG`                      | `memoir=info,memoir_monitor=info,memoir_client=info` |

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "memoir=info,memoir_monitor=info,memoir_client=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = cli::Args::parse();
    init_logging();

    cli::dispatch(args).await
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}
