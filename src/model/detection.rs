use super::{Landmark, LandmarkKind};
use crate::detector::DetectionError;

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct DetectionResult {
    landmarks: Vec<Landmark>,
}

impl DetectionResult {
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, DetectionError> {
        let mut seen = [false; LandmarkKind::COUNT];
        for landmark in &landmarks {
            let slot = &mut seen[landmark.kind.index()];
            if *slot {
                return Err(DetectionError::Model(format!(
                    "landmark {} reported more than once",
                    landmark.kind
                )));
            }
            *slot = true;
        }
        Ok(Self { landmarks })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn get(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.landmarks.iter().find(|landmark| landmark.kind == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Landmark> {
        self.landmarks.iter()
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }
}

impl<'a> IntoIterator for &'a DetectionResult {
    type Item = &'a Landmark;
    type IntoIter = std::slice::Iter<'a, Landmark>;

    fn into_iter(self) -> Self::IntoIter {
        self.landmarks.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_kind_is_a_detector_fault() {
        let err = DetectionResult::new(vec![
            Landmark::new(LandmarkKind::Nose, 1., 1., 0.9),
            Landmark::new(LandmarkKind::Nose, 2., 2., 0.8),
        ])
        .unwrap_err();
        assert!(matches!(err, DetectionError::Model(_)));
    }

    #[test]
    fn absent_kind_is_not_a_zero_point() {
        let result =
            DetectionResult::new(vec![Landmark::new(LandmarkKind::LeftHip, 10., 20., 0.7)])
                .unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.get(LandmarkKind::RightHip).is_none());
        assert_eq!(
            result.get(LandmarkKind::LeftHip).map(|l| l.position.y),
            Some(20.)
        );
        assert!(DetectionResult::empty().is_empty());
    }
}
