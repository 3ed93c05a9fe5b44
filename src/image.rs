use std::sync::Arc;

use crate::{frame::Rotation, model::Dimensions, result::Result};

// long side cap for still images handed to the detector
const MAX_LONG_SIDE: u32 = 1920;

#[derive(Clone)]
pub struct Image(Arc<image::RgbaImage>);

impl Default for Image {
    fn default() -> Self {
        Self(Arc::new(image::RgbaImage::new(0, 0)))
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.0.dimensions();
        write!(f, "Image({}x{})", w, h)
    }
}

impl Image {
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut image = image::open(path)?;
        if image.width().max(image.height()) > MAX_LONG_SIDE {
            image = image.resize(
                MAX_LONG_SIDE,
                MAX_LONG_SIDE,
                image::imageops::FilterType::Triangle,
            );
        }
        Ok(Self(Arc::new(image.to_rgba8())))
    }

    pub fn size(&self) -> Dimensions {
        let (width, height) = self.0.dimensions();
        Dimensions::new(width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    pub fn upright_size(&self, rotation: Rotation) -> Dimensions {
        let size = self.size();
        if rotation.is_transposing() {
            size.transposed()
        } else {
            size
        }
    }
}

impl From<image::RgbaImage> for Image {
    fn from(value: image::RgbaImage) -> Self {
        Self(Arc::new(value))
    }
}

impl std::ops::Deref for Image {
    type Target = image::RgbaImage;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn upright_size_swaps_for_quarter_turns() {
        let image = Image::from(image::RgbaImage::new(640, 480));
        assert_eq!(image.upright_size(Rotation::Deg0), Dimensions::new(640, 480));
        assert_eq!(image.upright_size(Rotation::Deg90), Dimensions::new(480, 640));
        assert_eq!(image.upright_size(Rotation::Deg180), Dimensions::new(640, 480));
        assert_eq!(image.upright_size(Rotation::Deg270), Dimensions::new(480, 640));
    }

    #[test]
    fn default_image_is_empty() {
        assert!(Image::default().is_empty());
    }
}
