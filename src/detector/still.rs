use std::{sync::mpsc, time::Duration};

use super::{Completion, DetectionError, Detector, InputImage, QualityProfile};
use crate::{
    frame::Rotation, image::Image, model::Dimensions, session::ScanState, Error, Result,
};

/// Detection failures come back as `ScanState::Failed`; only an unusable
/// image or a broken channel is an `Err`.
#[tracing::instrument(name = "Analysing still image", skip(detector), err)]
pub fn analyse_still(
    detector: &dyn Detector,
    image: Image,
    rotation: Rotation,
    timeout: Option<Duration>,
) -> Result<ScanState> {
    let size = image.size();
    Dimensions::non_empty(size.width, size.height)?;

    let input = InputImage::new(image, rotation);
    let image_size = input.upright_size();
    let (sender, receiver) = mpsc::channel();
    detector.detect(
        input,
        QualityProfile::SingleShot,
        Completion::new(move |outcome| {
            let _ = sender.send(outcome);
        }),
    );

    let outcome = match timeout {
        Some(timeout) => match receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(DetectionError::TimedOut(timeout)),
            Err(err) => return Err(Error::as_sync_error(err)),
        },
        None => receiver.recv().map_err(Error::as_sync_error)?,
    };
    if let Err(err) = &outcome {
        tracing::warn!("still image detection failed: {}", err);
    }
    Ok(ScanState::from_outcome(outcome, image_size))
}
