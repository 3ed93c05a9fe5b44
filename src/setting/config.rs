use std::{
    fs,
    io::{ErrorKind, Write},
    path::PathBuf,
    time::Duration,
};

use crate::{
    detector::QualityProfile, error::Error, overlay::SkeletonStyle, result::Result,
    session::Facing,
};

const ENV_PREFIX: &str = "POSEVIEW";

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub scheduler: SchedulerConfig,
    pub overlay: OverlayConfig,
    pub messenger: MessengerConfig,
    pub logging: LoggingConfig,
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub facing: Facing,
    pub profile: QualityProfile,
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Zero (the default) waits for every detection. A non-zero timeout
    /// moves on to the next frame while the expired call may still be
    /// running in the detector, so more than one call can be outstanding.
    pub detection_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub skeleton: SkeletonStyle,
    pub min_likelihood: f32,
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MessengerConfig {
    pub notice_duration_ms: u64,
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub name: String,
    pub filter: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            detection_timeout_ms: 0,
            shutdown_grace_ms: 500,
        }
    }
}

impl SchedulerConfig {
    pub fn detection_timeout(&self) -> Option<Duration> {
        (self.detection_timeout_ms > 0).then(|| Duration::from_millis(self.detection_timeout_ms))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            skeleton: SkeletonStyle::Torso,
            min_likelihood: 0.,
        }
    }
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            notice_duration_ms: 3000,
        }
    }
}

impl MessengerConfig {
    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            name: "poseview".into(),
            filter: "info".into(),
        }
    }
}

impl Config {
    pub fn get() -> Result<Config> {
        let config_dir = Self::get_config_dir()?;

        let config_str = match fs::read_to_string(config_dir.clone()) {
            Ok(config) => config,
            Err(err) => {
                if err.kind() == ErrorKind::NotFound {
                    return Self::upsert_new(config_dir);
                }
                tracing::warn!("failed to read {}: {}", config_dir.display(), err);
                return Ok(Self::default());
            }
        };

        match Self::from_json_str(&config_str) {
            Ok(cfg) => Ok(cfg),
            Err(err) => {
                tracing::warn!("replacing unreadable config file: {}", err);
                Self::upsert_new(config_dir)
            }
        }
    }

    pub fn from_json_str(config_str: &str) -> Result<Config> {
        config::Config::builder()
            .add_source(config::File::from_str(config_str, config::FileFormat::Json))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(Error::ConfigError)?
            .try_deserialize::<Config>()
            .map_err(Error::ConfigError)
    }

    fn get_config_dir() -> Result<PathBuf> {
        Ok(std::env::current_dir()
            .map_err(Error::as_unknown_error)?
            .join("config.json"))
    }

    fn upsert_new(config_dir: PathBuf) -> Result<Config> {
        let config = Self::default();
        Self::upsert_config_file(config_dir, &config)?;
        Ok(config)
    }

    fn upsert_config_file(config_dir: PathBuf, config: &Config) -> Result<()> {
        fs::File::create(config_dir)
            .map_err(Error::as_unknown_error)?
            .write_all(
                serde_json::to_string_pretty(config)
                    .map_err(Error::as_unknown_error)?
                    .as_bytes(),
            )
            .map_err(Error::as_unknown_error)
    }
}
