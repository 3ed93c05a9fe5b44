use std::sync::{Arc, RwLock};

use super::{
    geometry::{OverlayGeometry, Scale},
    surface::OverlaySurface,
};
use crate::{
    messenger::{MessageSeverity, Messenger},
    model::Dimensions,
    session::ScanState,
    setting::OverlayConfig,
    sync::{Publisher, ScanHandler},
    Error, Result,
};

#[derive(Debug, Clone, Default)]
pub struct Viewport(Arc<RwLock<Dimensions>>);

impl Viewport {
    pub fn new(dimensions: Dimensions) -> Self {
        Self(Arc::new(RwLock::new(dimensions)))
    }

    pub fn get(&self) -> Dimensions {
        self.0.read().map(|dimensions| *dimensions).unwrap_or_default()
    }

    pub fn set(&self, dimensions: Dimensions) -> Result<()> {
        *self.0.write().map_err(Error::as_guard_error)? = dimensions;
        Ok(())
    }
}

/// A success replaces the whole overlay with geometry built from that scan's
/// own image size. A failure leaves the overlay as it was and posts a
/// warning notice.
pub struct OverlayRenderer {
    surface: Arc<dyn OverlaySurface>,
    viewport: Viewport,
    config: OverlayConfig,
    messenger: Messenger,
    publisher: Publisher<OverlayGeometry>,
    last_scale: Option<(Dimensions, Scale)>,
}

impl OverlayRenderer {
    pub fn new(
        surface: Arc<dyn OverlaySurface>,
        viewport: Viewport,
        config: OverlayConfig,
        messenger: Messenger,
        publisher: Publisher<OverlayGeometry>,
    ) -> Self {
        Self {
            surface,
            viewport,
            config,
            messenger,
            publisher,
            last_scale: None,
        }
    }

    pub fn render(&mut self, scan: ScanState) -> Result<()> {
        match scan {
            ScanState::Success { result, image_size } => {
                let viewport = self.viewport.get();
                if viewport.is_empty() {
                    tracing::debug!("no viewport yet, skipping overlay update");
                    return Ok(());
                }
                let geometry = OverlayGeometry::build(
                    &result,
                    image_size,
                    viewport,
                    self.config.skeleton,
                    self.config.min_likelihood,
                )?;

                if self.last_scale != Some((image_size, geometry.scale)) {
                    self.surface
                        .update_viewport_scale(image_size, geometry.scale);
                    self.last_scale = Some((image_size, geometry.scale));
                }
                self.surface
                    .update_geometry(&geometry.points, &geometry.segments);
                self.publisher.publish(geometry)
            }
            ScanState::Failed(err) => self.messenger.send_message(
                format!("Pose scan failed: {}", err),
                Some(MessageSeverity::Warning),
            ),
        }
    }

    pub fn into_handler(mut self) -> ScanHandler {
        Box::new(move |scan| {
            if let Err(err) = self.render(scan) {
                tracing::warn!("failed to update overlay: {}", err);
            }
        })
    }
}
