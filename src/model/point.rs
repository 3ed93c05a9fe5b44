use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn non_empty(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::DimensionError { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn transposed(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// long side / short side, always >= 1 for non-empty dimensions
    pub fn long_short_ratio(&self) -> f64 {
        let (long, short) = (
            self.width.max(self.height) as f64,
            self.width.min(self.height) as f64,
        );
        long / short
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_side_is_rejected() {
        assert!(Dimensions::non_empty(0, 10).is_err());
        assert!(Dimensions::non_empty(10, 0).is_err());
        assert_eq!(
            Dimensions::non_empty(4, 3).unwrap(),
            Dimensions::new(4, 3)
        );
    }

    #[test]
    fn ratio_ignores_orientation() {
        let portrait = Dimensions::new(1080, 2400);
        assert_eq!(portrait.long_short_ratio(), portrait.transposed().long_short_ratio());
        assert!((portrait.long_short_ratio() - 2.2222).abs() < 1e-3);
    }
}
