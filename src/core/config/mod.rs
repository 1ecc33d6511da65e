mod parsing;
mod settings;
mod types;

pub use types::{
    AiSettings, ConfigError, Environment, GatewaySettings, LookupSettings, RuntimeSettings,
    Settings, TelemetrySettings, UploadSettings,
};
