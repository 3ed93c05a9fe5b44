use crate::{
    detector::{DetectionError, Outcome},
    model::{DetectionResult, Dimensions},
};

/// Terminal value of one detection attempt. Built once, handed to the
/// overlay, then dropped; nothing keeps a history of these.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    /// `image_size` is the upright size of the frame this result came from.
    Success {
        result: DetectionResult,
        image_size: Dimensions,
    },
    Failed(DetectionError),
}

impl ScanState {
    pub fn from_outcome(outcome: Outcome, image_size: Dimensions) -> Self {
        match outcome {
            Ok(result) => ScanState::Success { result, image_size },
            Err(err) => ScanState::Failed(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanState::Success { .. })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn outcome_maps_to_terminal_state() {
        let size = Dimensions::new(480, 640);
        assert_eq!(
            ScanState::from_outcome(Ok(DetectionResult::empty()), size),
            ScanState::Success {
                result: DetectionResult::empty(),
                image_size: size
            }
        );
        let failed = ScanState::from_outcome(Err(DetectionError::Abandoned), size);
        assert!(!failed.is_success());
        assert_eq!(failed, ScanState::Failed(DetectionError::Abandoned));
    }
}
