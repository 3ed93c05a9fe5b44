pub mod geometry;
pub mod renderer;
pub mod resolution;
pub mod surface;

pub use geometry::{OverlayGeometry, OverlayPoint, Scale, Segment, SkeletonStyle};
pub use renderer::{OverlayRenderer, Viewport};
pub use resolution::{select_bind_plan, AspectRatio, BindPlan, DisplayMetrics, Orientation};
pub use surface::{OverlaySurface, TracingSurface};
