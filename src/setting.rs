pub use self::config::{
    Config, LoggingConfig, MessengerConfig, OverlayConfig, SchedulerConfig, SessionConfig,
};

use crate::result::Result;

pub mod config;

#[derive(Default, Debug, Clone)]
pub struct Setting {
    pub config: Config,
}

impl Setting {
    pub fn get() -> Result<Self> {
        let config = Config::get()?;
        Ok(Self { config })
    }
}
