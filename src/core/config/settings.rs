use std::time::Duration;

use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_environment, parse_gateway_url,
    parse_positive_u64, parse_u64,
};
use super::types::{
    AiSettings, ConfigError, Environment, GatewaySettings, LookupSettings, RuntimeSettings,
    Settings, TelemetrySettings, UploadSettings,
};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_AI_MODEL: &str = "gemini-3-flash-preview";

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = parse_environment(
            env_optional("SPORTSDAY_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("SPORTSDAY_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let gateway_url = parse_gateway_url(env_or_default("GATEWAY_URL", ""))?;
        let gateway_timeout_seconds = parse_positive_u64(
            "GATEWAY_TIMEOUT_SECONDS",
            env_or_default("GATEWAY_TIMEOUT_SECONDS", "300"),
        )?;

        let api_key = env_or_default("GEMINI_API_KEY", "");
        let base_url = env_or_default("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL);
        let model = env_or_default("AI_MODEL", DEFAULT_AI_MODEL);
        let request_timeout =
            parse_positive_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "60"))?;

        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "100"))?;
        let poll_interval_seconds = parse_positive_u64(
            "RESULT_POLL_INTERVAL_SECONDS",
            env_or_default("RESULT_POLL_INTERVAL_SECONDS", "20"),
        )?;

        let log_level = env_or_default("SPORTSDAY_LOG_LEVEL", "info");
        let json = env_optional("SPORTSDAY_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            runtime: RuntimeSettings { environment, strict_config },
            gateway: GatewaySettings { url: gateway_url, timeout_seconds: gateway_timeout_seconds },
            ai: AiSettings { api_key, base_url, model, request_timeout },
            upload: UploadSettings { max_upload_size_mb },
            lookup: LookupSettings { poll_interval_seconds },
            telemetry: TelemetrySettings { log_level, json },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Defaults without reading the environment, pointed at `gateway_url`.
    pub fn for_gateway(gateway_url: impl Into<String>) -> Self {
        Self {
            runtime: RuntimeSettings { environment: Environment::Test, strict_config: false },
            gateway: GatewaySettings { url: gateway_url.into(), timeout_seconds: 300 },
            ai: AiSettings {
                api_key: String::new(),
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                model: DEFAULT_AI_MODEL.to_string(),
                request_timeout: 60,
            },
            upload: UploadSettings { max_upload_size_mb: 100 },
            lookup: LookupSettings { poll_interval_seconds: 20 },
            telemetry: TelemetrySettings { log_level: "info".to_string(), json: false },
        }
    }

    pub fn with_ai(mut self, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.ai.api_key = api_key.into();
        self.ai.base_url = base_url.into();
        self
    }

    pub fn with_max_upload_size_mb(mut self, value: u64) -> Self {
        self.upload.max_upload_size_mb = value;
        self
    }

    pub fn with_poll_interval_seconds(mut self, value: u64) -> Self {
        self.lookup.poll_interval_seconds = value.max(1);
        self
    }

    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub fn gateway(&self) -> &GatewaySettings {
        &self.gateway
    }

    pub fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub fn upload(&self) -> &UploadSettings {
        &self.upload
    }

    pub fn lookup(&self) -> &LookupSettings {
        &self.lookup
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.lookup.poll_interval_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.gateway.url.is_empty() {
            return Err(ConfigError::MissingSecret("GATEWAY_URL"));
        }

        if self.ai.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("GEMINI_API_KEY"));
        }

        Ok(())
    }
}
