//! Boundary to the landmark detection service.

use std::time::Duration;

use crate::{
    frame::Rotation,
    image::Image,
    model::{DetectionResult, Dimensions},
};

pub mod simulated;
pub mod still;

pub type Outcome = std::result::Result<DetectionResult, DetectionError>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityProfile {
    SingleShot,
    #[default]
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorMode {
    SingleImage,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceMode {
    Accurate,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorOptions {
    pub mode: DetectorMode,
    pub performance: PerformanceMode,
}

impl QualityProfile {
    pub fn options(self) -> DetectorOptions {
        match self {
            QualityProfile::SingleShot => DetectorOptions {
                mode: DetectorMode::SingleImage,
                performance: PerformanceMode::Accurate,
            },
            QualityProfile::Streaming => DetectorOptions {
                mode: DetectorMode::Stream,
                performance: PerformanceMode::Fast,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    Model(String),
    MalformedImage(String),
    /// The completion handle was dropped without a result.
    Abandoned,
    TimedOut(Duration),
}

impl std::fmt::Display for DetectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionError::Model(msg) => write!(f, "model failure: {}", msg),
            DetectionError::MalformedImage(msg) => write!(f, "malformed image: {}", msg),
            DetectionError::Abandoned => write!(f, "detector dropped the request without a result"),
            DetectionError::TimedOut(after) => {
                write!(f, "no result after {} ms", after.as_millis())
            }
        }
    }
}

impl std::error::Error for DetectionError {}

#[derive(Debug, Clone)]
pub struct InputImage {
    pub image: Image,
    pub rotation: Rotation,
}

impl InputImage {
    pub fn new(image: Image, rotation: Rotation) -> Self {
        Self { image, rotation }
    }

    pub fn upright_size(&self) -> Dimensions {
        self.image.upright_size(self.rotation)
    }
}

/// Move-only handle for reporting the outcome of one `detect` call.
///
/// `succeed` and `fail` consume the handle, so a call reports at most once.
/// Dropping it unreported reports [`DetectionError::Abandoned`], so it also
/// reports at least once.
pub struct Completion {
    report: Option<Box<dyn FnOnce(Outcome) + Send + 'static>>,
}

impl Completion {
    pub fn new<F>(report: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        Self {
            report: Some(Box::new(report)),
        }
    }

    pub fn succeed(self, result: DetectionResult) {
        self.report(Ok(result))
    }

    pub fn fail(self, error: DetectionError) {
        self.report(Err(error))
    }

    pub fn report(mut self, outcome: Outcome) {
        if let Some(report) = self.report.take() {
            report(outcome);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(report) = self.report.take() {
            report(Err(DetectionError::Abandoned));
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.report.is_some())
            .finish()
    }
}

pub trait Detector: Send + Sync {
    fn detect(&self, input: InputImage, profile: QualityProfile, completion: Completion);
}

impl<D: Detector + ?Sized> Detector for std::sync::Arc<D> {
    fn detect(&self, input: InputImage, profile: QualityProfile, completion: Completion) {
        (**self).detect(input, profile, completion)
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recording_completion() -> (Completion, Arc<Mutex<Vec<Outcome>>>) {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&outcomes);
        let completion = Completion::new(move |outcome| sink.lock().unwrap().push(outcome));
        (completion, outcomes)
    }

    #[test]
    fn profiles_map_to_detector_options() {
        assert_eq!(
            QualityProfile::SingleShot.options(),
            DetectorOptions {
                mode: DetectorMode::SingleImage,
                performance: PerformanceMode::Accurate
            }
        );
        assert_eq!(
            QualityProfile::Streaming.options(),
            DetectorOptions {
                mode: DetectorMode::Stream,
                performance: PerformanceMode::Fast
            }
        );
    }

    #[test]
    fn completion_reports_exactly_once() {
        let (completion, outcomes) = recording_completion();
        completion.succeed(DetectionResult::empty());
        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0], Ok(DetectionResult::empty()));
    }

    #[test]
    fn dropped_completion_reports_abandoned() {
        let (completion, outcomes) = recording_completion();
        drop(completion);
        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![Err(DetectionError::Abandoned)]
        );
    }

    #[test]
    fn failure_is_forwarded() {
        let (completion, outcomes) = recording_completion();
        completion.fail(DetectionError::MalformedImage("no planes".into()));
        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![Err(DetectionError::MalformedImage("no planes".into()))]
        );
    }
}
