//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Lead-capture endpoint configuration.
#[derive(Debug, Clone)]
pub struct LeadConfig {
    /// Endpoint that receives onboarding submissions. `None` logs leads locally.
    pub endpoint: Option<String>,
    /// Optional bearer token sent with each submission.
    pub api_key: Option<SecretString>,
    /// Value of the `source` field in the submission body.
    pub source: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    /// Request timeout for the lead endpoint.
    pub timeout: Duration,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            source: "content-studio".to_string(),
            utm_source: "direct".to_string(),
            utm_medium: "app".to_string(),
            utm_campaign: "free-trial".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Content workflow configuration.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Artificial delay before a generated result is returned.
    pub simulated_latency: Duration,
    /// Delay between the last free generation and the onboarding prompt.
    pub onboarding_prompt_delay: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            simulated_latency: Duration::from_millis(1200),
            onboarding_prompt_delay: Duration::from_millis(1500),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Scope for this device's local trial storage.
    pub device_id: String,
    pub lead: LeadConfig,
    pub workflow: WorkflowConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from("./data/content-studio.db"),
            device_id: "default".to_string(),
            lead: LeadConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build config from `CONTENT_STUDIO_*` environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-unparseable values are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(&format!("CONTENT_STUDIO_{name}")).filter(|v| !v.is_empty());

        let port = parse_var(&var, "PORT")?.unwrap_or(defaults.port);
        let db_path = var("DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path);
        let device_id = var("DEVICE_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let lead_defaults = LeadConfig::default();
        let lead = LeadConfig {
            endpoint: var("LEAD_ENDPOINT"),
            api_key: var("LEAD_API_KEY").map(SecretString::from),
            source: var("LEAD_SOURCE").unwrap_or(lead_defaults.source),
            utm_source: var("UTM_SOURCE").unwrap_or(lead_defaults.utm_source),
            utm_medium: var("UTM_MEDIUM").unwrap_or(lead_defaults.utm_medium),
            utm_campaign: var("UTM_CAMPAIGN").unwrap_or(lead_defaults.utm_campaign),
            timeout: parse_var::<u64, _>(&var, "LEAD_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(lead_defaults.timeout),
        };

        let workflow_defaults = WorkflowConfig::default();
        let workflow = WorkflowConfig {
            simulated_latency: parse_var::<u64, _>(&var, "SIMULATED_LATENCY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(workflow_defaults.simulated_latency),
            onboarding_prompt_delay: parse_var::<u64, _>(&var, "ONBOARDING_PROMPT_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(workflow_defaults.onboarding_prompt_delay),
        };

        Ok(Self {
            port,
            db_path,
            device_id,
            lead,
            workflow,
        })
    }
}

fn parse_var<T, F>(var: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: format!("CONTENT_STUDIO_{name}"),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}
