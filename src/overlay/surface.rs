use super::geometry::{OverlayPoint, Scale, Segment};
use crate::model::Dimensions;

/// Drawing surface owned by the host UI. Both calls may arrive from any
/// thread and may repeat the previous values; the surface schedules its own
/// redraw.
pub trait OverlaySurface: Send + Sync {
    fn update_geometry(&self, points: &[OverlayPoint], segments: &[Segment]);

    fn update_viewport_scale(&self, source: Dimensions, scale: Scale);
}

#[derive(Debug, Default)]
pub struct TracingSurface;

impl OverlaySurface for TracingSurface {
    fn update_geometry(&self, points: &[OverlayPoint], segments: &[Segment]) {
        tracing::debug!(
            points = points.len(),
            segments = segments.len(),
            "overlay geometry updated"
        );
        for segment in segments {
            tracing::trace!(
                "{} ({:.1}, {:.1}) -> {} ({:.1}, {:.1})",
                segment.from,
                segment.start.x,
                segment.start.y,
                segment.to,
                segment.end.x,
                segment.end.y
            );
        }
    }

    fn update_viewport_scale(&self, source: Dimensions, scale: Scale) {
        tracing::debug!(?source, sx = scale.sx, sy = scale.sy, "overlay scale updated");
    }
}
