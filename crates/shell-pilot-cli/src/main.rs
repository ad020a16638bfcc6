//! shell-pilot: let a decision oracle drive a remote machine over SSH.
//!
//! Configuration comes from flags or the environment (a `.env` file is
//! loaded first if present); see `.env.example` at the repository root.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use shell_pilot_controller::{RunConfig, SessionController};
use shell_pilot_core::Credentials;
use shell_pilot_oracle::{OpenAiOracle, OracleConfig, load_template};
use shell_pilot_ssh::ShellSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "shell-pilot", about, version)]
struct Args {
    /// Label identifying this session in logs and events.
    #[arg(long, env = "SESSION_ID", default_value = "default")]
    session_id: String,

    /// Remote host to drive.
    #[arg(long, env = "SSH_HOST")]
    ssh_host: String,

    /// Remote SSH port.
    #[arg(long, env = "SSH_PORT", default_value_t = 22)]
    ssh_port: u16,

    /// Login username.
    #[arg(long, env = "SSH_USERNAME")]
    ssh_username: String,

    /// Login password; also answers elevation prompts.
    #[arg(long, env = "SSH_PASSWORD", hide_env_values = true)]
    ssh_password: String,

    /// API key for the oracle endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Model identifier to request.
    #[arg(long, env = "OPENAI_MODEL")]
    openai_model: String,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = shell_pilot_oracle::client::DEFAULT_BASE_URL)]
    openai_base_url: String,

    /// Wall-clock budget for the session, in seconds.
    #[arg(long, env = "TIME_LIMIT_SECONDS", default_value_t = 30 * 60)]
    time_limit_seconds: u64,

    /// System prompt template with a `{history}` placeholder.
    #[arg(long, env = "SYSTEM_PROMPT_PATH", default_value = "prompts/system.txt")]
    system_prompt_path: PathBuf,

    /// Where to write the line-per-event history.
    #[arg(long, env = "HISTORY_PATH", default_value = "runs/history.jsonl")]
    history_path: PathBuf,

    /// Where to write the final summary.
    #[arg(long, env = "SUMMARY_PATH", default_value = "runs/summary.txt")]
    summary_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Flags read the environment, so the .env file loads first.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let template = load_template(&args.system_prompt_path).with_context(|| {
        format!(
            "failed to read system prompt template {}",
            args.system_prompt_path.display()
        )
    })?;

    let credentials = Credentials::new(
        args.ssh_host,
        args.ssh_port,
        args.ssh_username,
        args.ssh_password,
    );
    let session = ShellSession::new(args.session_id.clone(), credentials);

    let oracle = OpenAiOracle::new(
        OracleConfig::new(args.openai_api_key, args.openai_model)
            .with_base_url(args.openai_base_url),
        template,
    );

    let config = RunConfig::new(
        Duration::from_secs(args.time_limit_seconds),
        args.history_path.clone(),
        args.summary_path.clone(),
    );

    tracing::info!(
        session = %args.session_id,
        budget_secs = args.time_limit_seconds,
        "starting session"
    );

    let report = SessionController::new(session, oracle, config).run().await;

    tracing::info!(
        events = report.events_recorded,
        summarized = report.summarized,
        history = %args.history_path.display(),
        summary = %args.summary_path.display(),
        "session finished"
    );

    Ok(())
}
