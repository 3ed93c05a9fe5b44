pub use detection::DetectionResult;
pub use landmark::{Landmark, LandmarkKind};
pub use point::{Dimensions, Point};

pub mod detection;
pub mod landmark;
pub mod point;
