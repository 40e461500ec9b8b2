//! Configuration for report runs

use agent_runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ReportError, Result};

/// Default Apify API endpoint
pub const DEFAULT_APIFY_API_BASE: &str = "https://api.apify.com/v2";

/// Actor serving Yahoo Finance data
pub const DEFAULT_YAHOO_ACTOR: &str = "canadesk/yahoo-finance";

/// Actor serving Google News search results
pub const DEFAULT_GOOGLE_NEWS_ACTOR: &str = "lhotanova/google-news-scraper";

/// How the next step is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorKind {
    /// Deterministic routing from the state phase
    #[default]
    Rule,
    /// The model picks the step; its choice is checked against the phase
    Model,
}

/// Configuration for report runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Chat model used by every step
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,

    /// Model calls allowed inside one analysis step
    pub analysis_max_iterations: usize,

    /// Supervisor decisions allowed per run
    pub max_steps: usize,

    /// Supervisor implementation
    pub supervisor: SupervisorKind,

    /// Apify API token
    #[serde(skip_serializing)]
    pub apify_token: Option<String>,

    /// Apify API base URL
    pub apify_api_base: String,

    /// Actor for the four Yahoo tools
    pub yahoo_actor: String,

    /// Actor for the Google News tool
    pub google_news_actor: String,

    /// Longest wait for one actor run
    pub actor_timeout: Duration,

    /// Timeout of a single HTTP request
    pub request_timeout: Duration,

    /// How long fetched datasets stay cached
    pub cache_ttl: Duration,

    /// Apify requests per minute
    pub rate_limit_per_minute: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: None,
            analysis_max_iterations: 10,
            max_steps: 4,
            supervisor: SupervisorKind::Rule,
            apify_token: None,
            apify_api_base: DEFAULT_APIFY_API_BASE.to_string(),
            yahoo_actor: DEFAULT_YAHOO_ACTOR.to_string(),
            google_news_actor: DEFAULT_GOOGLE_NEWS_ACTOR.to_string(),
            actor_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(600),
            rate_limit_per_minute: 30,
        }
    }
}

impl ReportConfig {
    /// Create a new configuration builder
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ReportError::ConfigError("model must not be empty".to_string()));
        }
        if self.max_steps < 2 {
            return Err(ReportError::ConfigError(
                "max_steps must be at least 2 (analysis and report)".to_string(),
            ));
        }
        if self.analysis_max_iterations == 0 {
            return Err(ReportError::ConfigError(
                "analysis_max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ReportError::ConfigError(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }
        for (name, actor) in [
            ("yahoo_actor", &self.yahoo_actor),
            ("google_news_actor", &self.google_news_actor),
        ] {
            if !actor.contains('/') {
                return Err(ReportError::ConfigError(format!(
                    "{name} must look like `user/actor`, got `{actor}`"
                )));
            }
        }
        Ok(())
    }

    /// Runtime defaults shared by the model-backed steps
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            max_iterations: self.analysis_max_iterations,
        }
    }
}

/// Builder for ReportConfig
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    analysis_max_iterations: Option<usize>,
    max_steps: Option<usize>,
    supervisor: Option<SupervisorKind>,
    apify_token: Option<String>,
    apify_api_base: Option<String>,
    yahoo_actor: Option<String>,
    google_news_actor: Option<String>,
    actor_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    rate_limit_per_minute: Option<u32>,
}

impl ReportConfigBuilder {
    /// Set the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max tokens per completion
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set model calls allowed inside one analysis step
    pub fn analysis_max_iterations(mut self, iterations: usize) -> Self {
        self.analysis_max_iterations = Some(iterations);
        self
    }

    /// Set supervisor decisions allowed per run
    pub fn max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Set the supervisor implementation
    pub fn supervisor(mut self, kind: SupervisorKind) -> Self {
        self.supervisor = Some(kind);
        self
    }

    /// Set the Apify API token
    pub fn apify_token(mut self, token: impl Into<String>) -> Self {
        self.apify_token = Some(token.into());
        self
    }

    /// Set the Apify API base URL
    pub fn apify_api_base(mut self, base: impl Into<String>) -> Self {
        self.apify_api_base = Some(base.into());
        self
    }

    /// Set the Yahoo Finance actor
    pub fn yahoo_actor(mut self, actor: impl Into<String>) -> Self {
        self.yahoo_actor = Some(actor.into());
        self
    }

    /// Set the Google News actor
    pub fn google_news_actor(mut self, actor: impl Into<String>) -> Self {
        self.google_news_actor = Some(actor.into());
        self
    }

    /// Set the actor run timeout
    pub fn actor_timeout(mut self, duration: Duration) -> Self {
        self.actor_timeout = Some(duration);
        self
    }

    /// Set the HTTP request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the dataset cache TTL
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set Apify requests per minute
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Fill unset values from `OPENAI_MODEL`, `APIFY_TOKEN` and `APIFY_API_BASE`
    pub fn from_env(mut self) -> Self {
        if self.model.is_none() {
            self.model = non_empty_env("OPENAI_MODEL");
        }
        if self.apify_token.is_none() {
            self.apify_token = non_empty_env("APIFY_TOKEN");
        }
        if self.apify_api_base.is_none() {
            self.apify_api_base = non_empty_env("APIFY_API_BASE");
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ReportConfig> {
        let defaults = ReportConfig::default();

        let config = ReportConfig {
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.or(defaults.temperature),
            analysis_max_iterations: self
                .analysis_max_iterations
                .unwrap_or(defaults.analysis_max_iterations),
            max_steps: self.max_steps.unwrap_or(defaults.max_steps),
            supervisor: self.supervisor.unwrap_or(defaults.supervisor),
            apify_token: self.apify_token,
            apify_api_base: self.apify_api_base.unwrap_or(defaults.apify_api_base),
            yahoo_actor: self.yahoo_actor.unwrap_or(defaults.yahoo_actor),
            google_news_actor: self.google_news_actor.unwrap_or(defaults.google_news_actor),
            actor_timeout: self.actor_timeout.unwrap_or(defaults.actor_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
        };

        config.validate()?;
        Ok(config)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
