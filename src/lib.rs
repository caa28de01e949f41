pub mod agent_engine;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod device;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;
pub mod repl;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::agent_engine::engine::AgentEngine;
use crate::agent_engine::handle::{spawn_engine, AgentHandle};
use crate::agent_engine::state::LoopStatus;
use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::device::client::HelperClient;
use crate::device::traits::DeviceControl;
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::executor::apps::AppTable;
use crate::executor::dispatcher::ActionExecutor;
use crate::llm::decision::DecisionClient;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::perception::screenshot::ScreenObserver;

/// Entry point shared by every CLI mode. Returns whether the session ended well;
/// for `run` that means the task reached `Succeeded`.
pub async fn run(cli: Cli) -> PhoneClawResult<bool> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let mut config = config::load_config()?;
    if let Some(max_steps) = cli.max_steps {
        config.agent.max_steps = max_steps;
        config.validate()?;
    }

    let helper = HelperClient::from_config(&config.device);
    tracing::info!(helper = %helper.base_url(), "checking device helper");
    let device: Arc<dyn DeviceControl> = Arc::new(helper);
    check_device(device.as_ref(), &config.device.helper_url).await?;

    let (agent, engine_task) = build_agent(&config, device)?;

    let ok = match cli.command() {
        Command::Run { task } => {
            let status = repl::run_once(&agent, &task.join(" ")).await?;
            status == LoopStatus::Succeeded
        }
        Command::Web { port } => {
            let port = port.unwrap_or(config.dashboard.port);
            dashboard::serve(agent.clone(), &config.dashboard.host, port).await?;
            true
        }
        Command::Interactive => {
            repl::run_interactive(&agent).await?;
            true
        }
    };

    agent.shutdown().await;
    if let Err(e) = engine_task.await {
        tracing::warn!(error = %e, "agent engine task ended abnormally");
    }
    Ok(ok)
}

/// The helper must answer `/status` with accessibility enabled before any loop starts.
pub async fn check_device(device: &dyn DeviceControl, helper_url: &str) -> PhoneClawResult<()> {
    match device.status().await {
        Ok(status) if status.accessibility_enabled => {
            tracing::info!("device helper ready");
            Ok(())
        }
        Ok(_) => Err(PhoneClawError::Precondition(
            "accessibility service is not enabled on the device".into(),
        )),
        Err(e) => Err(PhoneClawError::Precondition(format!(
            "device helper at {helper_url} is unreachable: {e}"
        ))),
    }
}

/// Wire observer, decision client and executor into an engine and start it.
pub fn build_agent(
    config: &AppConfig,
    device: Arc<dyn DeviceControl>,
) -> PhoneClawResult<(AgentHandle, JoinHandle<()>)> {
    let api_key = config
        .api_key()
        .ok_or_else(|| PhoneClawError::Config("vision model API key is not configured".into()))?;
    let model = Arc::new(OpenAiCompatibleProvider::from_config(&config.model, api_key));

    let apps = AppTable::with_overrides(&config.apps);
    let agent_cfg = &config.agent;
    let observer = ScreenObserver::new(
        device.clone(),
        agent_cfg.capture_attempts,
        Duration::from_millis(agent_cfg.capture_backoff_ms),
    );
    let decider = DecisionClient::new(model, agent_cfg.history_window, apps.names().to_vec());
    let executor = ActionExecutor::new(device, apps, config.device.swipe_duration_ms);

    let engine = AgentEngine::new(observer, decider, executor, config.loop_config());
    Ok(spawn_engine(engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeDevice;

    #[tokio::test]
    async fn precondition_requires_accessibility() {
        let ok = FakeDevice::new(10, 10);
        assert!(check_device(&ok, "http://helper").await.is_ok());

        let off = FakeDevice::new(10, 10).without_accessibility();
        let err = check_device(&off, "http://helper").await.unwrap_err();
        assert!(matches!(err, PhoneClawError::Precondition(_)));
    }

    #[tokio::test]
    async fn unreachable_helper_fails_precondition() {
        let helper = HelperClient::new(
            "http://127.0.0.1:9",
            Duration::from_millis(300),
            Duration::from_millis(300),
        );
        let err = check_device(&helper, "http://127.0.0.1:9").await.unwrap_err();
        assert!(err.to_string().contains("unreachable"), "{err}");
    }

    #[tokio::test]
    async fn build_agent_needs_api_key() {
        let device: Arc<dyn DeviceControl> = Arc::new(FakeDevice::new(10, 10));
        let config = AppConfig::default();
        assert!(matches!(
            build_agent(&config, device.clone()),
            Err(PhoneClawError::Config(_))
        ));

        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-test".into());
        let (agent, _task) = build_agent(&config, device).unwrap();
        assert_eq!(agent.state().state.max_steps, 20);
        assert!(!agent.is_busy());
    }
}
