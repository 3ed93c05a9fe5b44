use crate::{
    model::{DetectionResult, Dimensions, LandmarkKind, Point},
    Result,
};

type Connection = (LandmarkKind, LandmarkKind);

/// Shoulder line, then hip line.
pub const TORSO_CONNECTIONS: [Connection; 2] = [
    (LandmarkKind::LeftShoulder, LandmarkKind::RightShoulder),
    (LandmarkKind::LeftHip, LandmarkKind::RightHip),
];

pub const FULL_CONNECTIONS: [Connection; 24] = [
    // torso
    (LandmarkKind::LeftShoulder, LandmarkKind::RightShoulder),
    (LandmarkKind::LeftHip, LandmarkKind::RightHip),
    (LandmarkKind::LeftShoulder, LandmarkKind::LeftHip),
    (LandmarkKind::RightShoulder, LandmarkKind::RightHip),
    // face
    (LandmarkKind::LeftEar, LandmarkKind::LeftEye),
    (LandmarkKind::LeftEye, LandmarkKind::Nose),
    (LandmarkKind::Nose, LandmarkKind::RightEye),
    (LandmarkKind::RightEye, LandmarkKind::RightEar),
    (LandmarkKind::LeftMouth, LandmarkKind::RightMouth),
    // arms
    (LandmarkKind::LeftShoulder, LandmarkKind::LeftElbow),
    (LandmarkKind::LeftElbow, LandmarkKind::LeftWrist),
    (LandmarkKind::LeftWrist, LandmarkKind::LeftIndex),
    (LandmarkKind::RightShoulder, LandmarkKind::RightElbow),
    (LandmarkKind::RightElbow, LandmarkKind::RightWrist),
    (LandmarkKind::RightWrist, LandmarkKind::RightIndex),
    // legs
    (LandmarkKind::LeftHip, LandmarkKind::LeftKnee),
    (LandmarkKind::LeftKnee, LandmarkKind::LeftAnkle),
    (LandmarkKind::LeftAnkle, LandmarkKind::LeftHeel),
    (LandmarkKind::LeftHeel, LandmarkKind::LeftFootIndex),
    (LandmarkKind::RightHip, LandmarkKind::RightKnee),
    (LandmarkKind::RightKnee, LandmarkKind::RightAnkle),
    (LandmarkKind::RightAnkle, LandmarkKind::RightHeel),
    (LandmarkKind::RightHeel, LandmarkKind::RightFootIndex),
    (LandmarkKind::LeftAnkle, LandmarkKind::LeftFootIndex),
];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonStyle {
    #[default]
    Torso,
    Full,
}

impl SkeletonStyle {
    pub fn connections(self) -> &'static [Connection] {
        match self {
            SkeletonStyle::Torso => &TORSO_CONNECTIONS,
            SkeletonStyle::Full => &FULL_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Scale {
    pub sx: f32,
    pub sy: f32,
}

impl Scale {
    pub fn between(source: Dimensions, viewport: Dimensions) -> Result<Self> {
        let source = Dimensions::non_empty(source.width, source.height)?;
        let viewport = Dimensions::non_empty(viewport.width, viewport.height)?;
        Ok(Self {
            sx: viewport.width as f32 / source.width as f32,
            sy: viewport.height as f32 / source.height as f32,
        })
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(point.x * self.sx, point.y * self.sy)
    }

    pub fn invert(&self, point: Point) -> Point {
        Point::new(point.x / self.sx, point.y / self.sy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct OverlayPoint {
    pub kind: LandmarkKind,
    pub position: Point,
    pub likelihood: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Segment {
    pub from: LandmarkKind,
    pub to: LandmarkKind,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OverlayGeometry {
    pub source: Dimensions,
    pub viewport: Dimensions,
    pub scale: Scale,
    pub points: Vec<OverlayPoint>,
    pub segments: Vec<Segment>,
}

impl OverlayGeometry {
    pub fn build(
        result: &DetectionResult,
        source: Dimensions,
        viewport: Dimensions,
        style: SkeletonStyle,
        min_likelihood: f32,
    ) -> Result<Self> {
        let scale = Scale::between(source, viewport)?;

        let points: Vec<OverlayPoint> = result
            .iter()
            .filter(|landmark| landmark.is_likely(min_likelihood))
            .map(|landmark| OverlayPoint {
                kind: landmark.kind,
                position: scale.apply(landmark.position),
                likelihood: landmark.likelihood,
            })
            .collect();

        let find = |kind: LandmarkKind| points.iter().find(|point| point.kind == kind);
        let segments = style
            .connections()
            .iter()
            .filter_map(|&(from, to)| {
                let (start, end) = (find(from)?, find(to)?);
                Some(Segment {
                    from,
                    to,
                    start: start.position,
                    end: end.position,
                })
            })
            .collect();

        Ok(Self {
            source,
            viewport,
            scale,
            points,
            segments,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
