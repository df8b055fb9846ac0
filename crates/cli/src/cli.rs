use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use memoir_client::ClientConfig;
use memoir_core::session::Session;
use memoir_core::submission::JobSubmission;
use memoir_monitor::observer::{Fanout, TracingObserver};
use memoir_monitor::{JobService, MonitorConfig, MonitorHandle};

#[derive(Parser, Debug)]
#[command(name = "memoir")]
#[command(about = "Submit recordings for story processing and follow their progress")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Processing service base URL. Overrides MEMOIR_API_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Milliseconds between status polls. Overrides MEMOIR_POLL_INTERVAL_MS.
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Overall monitoring budget in milliseconds. Overrides MEMOIR_MAX_DURATION_MS.
    #[arg(long, global = true)]
    pub max_duration_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a processing job and print its session id.
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Recording URL; repeat for several recordings.
        #[arg(long = "audio-url", required = true)]
        audio_urls: Vec<String>,
        /// User preferences as a JSON object.
        #[arg(long)]
        preferences: Option<String>,
        /// Keep monitoring the new session until it finishes.
        #[arg(long)]
        watch: bool,
    },
    /// Monitor an existing session until it finishes.
    Watch { session_id: String },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let service = JobService::new(client_config(&args)?, monitor_config(&args)?);

    match args.cmd {
        Command::Submit {
            title,
            description,
            audio_urls,
            preferences,
            watch,
        } => {
            let submission = build_submission(audio_urls, title, description, preferences)?;
            let session_id = service
                .submit(&submission)
                .await
                .context("submit processing job")?;
            println!("{session_id}");

            if watch {
                let handle = service.monitor(session_id, observer()).await?;
                wait(handle).await?;
            }
            Ok(())
        }
        Command::Watch { session_id } => {
            let handle = service.monitor(session_id, observer()).await?;
            wait(handle).await
        }
    }
}

fn client_config(args: &Args) -> Result<ClientConfig> {
    let config = match &args.base_url {
        Some(url) => ClientConfig::from_env_with_base_url(url.clone())?,
        None => ClientConfig::from_env()?,
    };
    Ok(config)
}

fn monitor_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = MonitorConfig::from_env()?;
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = args.max_duration_ms {
        config.max_duration = Duration::from_millis(ms);
    }
    Ok(config)
}

fn build_submission(
    audio_urls: Vec<String>,
    title: String,
    description: String,
    preferences: Option<String>,
) -> Result<JobSubmission> {
    let mut submission = JobSubmission::new(audio_urls, title, description);
    if let Some(raw) = preferences {
        let value: serde_json::Value =
            serde_json::from_str(&raw).context("--preferences must be valid JSON")?;
        if !value.is_object() {
            bail!("--preferences must be a JSON object");
        }
        submission = submission.with_preferences(value);
    }
    Ok(submission)
}

fn observer() -> Arc<dyn memoir_monitor::ProgressObserver> {
    let print = |session: &Session| {
        eprintln!(
            "[{:>3}%] {} {}",
            session.progress_percentage,
            session.status,
            session.stage().label(),
        );
    };
    Arc::new(Fanout::new().with(Arc::new(TracingObserver)).with(Arc::new(print)))
}

/// Wait for the monitor, cancelling it on Ctrl-C, and print the results.
async fn wait(handle: MonitorHandle) -> Result<()> {
    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let session_id = handle.session_id().to_string();
    match handle.outcome().await {
        Some(Ok(results)) => {
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Some(Err(e)) => Err(e).with_context(|| format!("session {session_id}")),
        None => bail!("monitoring of session {session_id} was cancelled"),
    }
}
