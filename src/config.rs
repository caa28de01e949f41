use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent_engine::state::LoopConfig;
use crate::errors::{PhoneClawError, PhoneClawResult};

pub const ENV_API_KEY: &str = "PHONECLAW_API_KEY";
pub const ENV_API_URL: &str = "PHONECLAW_API_URL";
pub const ENV_MODEL: &str = "PHONECLAW_MODEL";
pub const ENV_HELPER_URL: &str = "PHONECLAW_HELPER_URL";
pub const ENV_MAX_STEPS: &str = "PHONECLAW_MAX_STEPS";
pub const ENV_WEB_PORT: &str = "PHONECLAW_WEB_PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Extra human-readable app name → package id entries, merged over the built-in table.
    #[serde(default)]
    pub apps: HashMap<String, String>,
}

/// Vision model endpoint (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Falls back to env var PHONECLAW_API_KEY, which always wins when set.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://ark.cn-beijing.volces.com/api/v3".into(),
            model: "doubao-seed-1-6-vision-250815".into(),
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

/// Device control helper running on the phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub helper_url: String,
    /// Timeout for status, tap, input, back, home and launch calls.
    pub control_timeout_ms: u64,
    /// Timeout for screenshot and swipe calls.
    pub slow_timeout_ms: u64,
    pub swipe_duration_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            helper_url: "http://localhost:8080".into(),
            control_timeout_ms: 5_000,
            slow_timeout_ms: 10_000,
            swipe_duration_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_steps: u32,
    /// Number of recent history entries summarised into each prompt.
    pub history_window: usize,
    pub capture_attempts: u32,
    pub capture_backoff_ms: u64,
    pub capture_retry_delay_ms: u64,
    pub max_capture_failures: u32,
    /// Settle delay after tap / input / launch.
    pub settle_long_ms: u64,
    /// Settle delay after every other dispatched action.
    pub settle_short_ms: u64,
    pub persist_sessions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            history_window: 5,
            capture_attempts: 3,
            capture_backoff_ms: 500,
            capture_retry_delay_ms: 2_000,
            max_capture_failures: 3,
            settle_long_ms: 1_500,
            settle_short_ms: 1_000,
            persist_sessions: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8888,
        }
    }
}

impl AppConfig {
    /// Overlay recognised environment variables on top of file/default values.
    pub fn apply_env<F>(&mut self, lookup: F) -> PhoneClawResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(ENV_API_KEY) {
            self.model.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.model.api_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.model.model = model;
        }
        if let Some(url) = lookup(ENV_HELPER_URL) {
            self.device.helper_url = url;
        }
        if let Some(raw) = lookup(ENV_MAX_STEPS) {
            self.agent.max_steps = raw.trim().parse().map_err(|_| {
                PhoneClawError::Config(format!("{ENV_MAX_STEPS} must be a positive integer, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_WEB_PORT) {
            self.dashboard.port = raw.trim().parse().map_err(|_| {
                PhoneClawError::Config(format!("{ENV_WEB_PORT} must be a port number, got '{raw}'"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> PhoneClawResult<()> {
        if self.api_key().is_none() {
            return Err(PhoneClawError::Config(format!(
                "{ENV_API_KEY} is not set (export it or add model.api_key to config.toml)"
            )));
        }
        if self.agent.max_steps == 0 {
            return Err(PhoneClawError::Config("agent.max_steps must be at least 1".into()));
        }
        if self.agent.capture_attempts == 0 || self.agent.max_capture_failures == 0 {
            return Err(PhoneClawError::Config(
                "capture_attempts and max_capture_failures must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.model
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn loop_config(&self) -> LoopConfig {
        let agent = &self.agent;
        LoopConfig {
            max_steps: agent.max_steps,
            history_window: agent.history_window,
            max_capture_failures: agent.max_capture_failures,
            capture_retry_delay: Duration::from_millis(agent.capture_retry_delay_ms),
            settle_long: Duration::from_millis(agent.settle_long_ms),
            settle_short: Duration::from_millis(agent.settle_short_ms),
            session_dir: agent.persist_sessions.then(sessions_dir),
        }
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    let candidate = std::env::current_dir().ok()?.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Some(candidate);
    }
    None
}

/// Load `config.toml` if present, overlay the environment, and validate.
pub fn load_config() -> PhoneClawResult<AppConfig> {
    let mut config = match resolve_config_path() {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let config: AppConfig = toml::from_str(&content)?;
            tracing::info!(path = %path.display(), "config file loaded");
            config
        }
        None => {
            tracing::debug!("no config.toml found, using defaults");
            AppConfig::default()
        }
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    tracing::info!(
        model = %config.model.model,
        helper = %config.device.helper_url,
        max_steps = config.agent.max_steps,
        "config ready"
    );
    Ok(config)
}

/// `~/.local/share/phoneclaw/sessions` (or the platform equivalent),
/// falling back to `./sessions`.
fn sessions_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("phoneclaw").join("sessions"))
        .unwrap_or_else(|| PathBuf::from("sessions"))
}
