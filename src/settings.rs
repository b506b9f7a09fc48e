use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub enable_swagger: bool,
    pub port: u16,
    /// IANA zone the class catalog is stored in and listed in by default.
    pub studio_timezone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            enable_swagger: true,
            port: 8080,
            studio_timezone: "Asia/Kolkata".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let defaults = Settings::default();

        let config = Config::builder()
            .set_default("debug", defaults.debug)?
            .set_default("enable_swagger", defaults.enable_swagger)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("studio_timezone", defaults.studio_timezone)?
            .add_source(File::with_name("config").required(false))
            // APP_STUDIO_TIMEZONE -> studio_timezone
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
