use std::{error::Error as StdError, sync::PoisonError};

use crate::detector::DetectionError;

#[derive(Debug)]
pub enum Error {
    ConfigError(config::ConfigError),
    ImageError(image::ImageError),
    SyncError(Box<dyn StdError + Send + Sync>),
    GuardError(String),
    TransitionError {
        state: &'static str,
        event: &'static str,
    },
    DimensionError {
        width: u32,
        height: u32,
    },
    RotationError(u32),
    DetectionError(DetectionError),
    ReleaseError(String),
    UnknownError(Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub fn as_sync_error<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::SyncError(Box::new(err))
    }

    pub fn as_guard_error<T>(err: PoisonError<T>) -> Self {
        Self::GuardError(err.to_string())
    }

    pub fn as_unknown_error<E: Into<Box<dyn StdError + Send + Sync>>>(err: E) -> Self {
        Self::UnknownError(err.into())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConfigError(err) => write!(f, "configuration error: {}", err),
            Error::ImageError(err) => write!(f, "image error: {}", err),
            Error::SyncError(err) => write!(f, "sync error: {}", err),
            Error::GuardError(err) => write!(f, "lock guard error: {}", err),
            Error::TransitionError { state, event } => {
                write!(f, "session cannot handle `{}` while in `{}`", event, state)
            }
            Error::DimensionError { width, height } => {
                write!(f, "invalid dimensions: {}x{}", width, height)
            }
            Error::RotationError(degrees) => {
                write!(f, "rotation must be a multiple of 90 degrees, got {}", degrees)
            }
            Error::DetectionError(err) => write!(f, "detection error: {}", err),
            Error::ReleaseError(err) => write!(f, "frame release error: {}", err),
            Error::UnknownError(err) => write!(f, "unknown error: {}", err),
        }
    }
}

impl StdError for Error {}

impl From<config::ConfigError> for Error {
    fn from(value: config::ConfigError) -> Self {
        Self::ConfigError(value)
    }
}

impl From<image::ImageError> for Error {
    fn from(value: image::ImageError) -> Self {
        Self::ImageError(value)
    }
}

impl From<DetectionError> for Error {
    fn from(value: DetectionError) -> Self {
        Self::DetectionError(value)
    }
}
