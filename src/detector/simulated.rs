use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::runtime::Handle;

use super::{Completion, DetectionError, Detector, InputImage, Outcome, QualityProfile};
use crate::model::{DetectionResult, Dimensions, Landmark, LandmarkKind};

// normalized (x, y) of a person standing facing the camera, in LandmarkKind order
const STANDING_POSE: [(f32, f32); LandmarkKind::COUNT] = [
    (0.50, 0.12),
    (0.48, 0.11),
    (0.47, 0.11),
    (0.46, 0.11),
    (0.52, 0.11),
    (0.53, 0.11),
    (0.54, 0.11),
    (0.44, 0.12),
    (0.56, 0.12),
    (0.48, 0.14),
    (0.52, 0.14),
    (0.40, 0.22),
    (0.60, 0.22),
    (0.36, 0.34),
    (0.64, 0.34),
    (0.34, 0.45),
    (0.66, 0.45),
    (0.33, 0.47),
    (0.67, 0.47),
    (0.34, 0.48),
    (0.66, 0.48),
    (0.35, 0.47),
    (0.65, 0.47),
    (0.44, 0.50),
    (0.56, 0.50),
    (0.44, 0.68),
    (0.56, 0.68),
    (0.44, 0.85),
    (0.56, 0.85),
    (0.43, 0.87),
    (0.57, 0.87),
    (0.46, 0.89),
    (0.54, 0.89),
];

/// Stand-in for a real pose model. Answers on a tokio runtime after a fixed
/// latency with a synthetic figure that sways a little from call to call.
pub struct SimulatedDetector {
    handle: Handle,
    latency: Duration,
    fail_every: Option<u64>,
    calls: AtomicU64,
}

impl SimulatedDetector {
    pub fn new(handle: Handle, latency: Duration) -> Self {
        Self {
            handle,
            latency,
            fail_every: None,
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_failures(mut self, every: u64) -> Self {
        self.fail_every = (every > 0).then_some(every);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn synthetic_pose(size: Dimensions, sway: f32) -> Outcome {
        let landmarks = LandmarkKind::ALL
            .iter()
            .zip(STANDING_POSE.iter())
            .map(|(&kind, &(x, y))| {
                Landmark::new(
                    kind,
                    (x + sway) * size.width as f32,
                    y * size.height as f32,
                    0.95,
                )
            })
            .collect();
        DetectionResult::new(landmarks)
    }
}

impl Detector for SimulatedDetector {
    fn detect(&self, input: InputImage, profile: QualityProfile, completion: Completion) {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let options = profile.options();
        let latency = self.latency;
        let fails = self.fail_every.is_some_and(|every| call % every == 0);
        tracing::trace!(call, ?options, "simulated detection");

        self.handle.spawn(async move {
            tokio::time::sleep(latency).await;
            if fails {
                completion.fail(DetectionError::Model(format!(
                    "simulated failure on call {}",
                    call
                )));
                return;
            }
            let sway = ((call % 10) as f32 - 5.) * 0.004;
            completion.report(Self::synthetic_pose(input.upright_size(), sway));
        });
    }
}
