use std::sync::atomic::{AtomicU64, Ordering};

use crate::{image::Image, Error, Result};

static FRAME_SEQ: AtomicU64 = AtomicU64::new(0);

type ReleaseFn = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Result<Self> {
        match degrees % 360 {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(Error::RotationError(degrees)),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn is_transposing(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Hands the frame's buffer back to its producer. Runs at most once: either
/// through [`ReleaseGuard::release`] or when the guard is dropped.
pub struct ReleaseGuard {
    frame_id: u64,
    release: Option<ReleaseFn>,
}

impl ReleaseGuard {
    fn new(frame_id: u64, release: ReleaseFn) -> Self {
        Self {
            frame_id,
            release: Some(release),
        }
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn release(mut self) -> bool {
        self.run()
    }

    fn run(&mut self) -> bool {
        let Some(release) = self.release.take() else {
            return true;
        };
        match release() {
            Ok(()) => {
                tracing::trace!(frame = self.frame_id, "frame released");
                true
            }
            Err(err) => {
                tracing::warn!(frame = self.frame_id, "failed to release frame: {}", err);
                false
            }
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for ReleaseGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseGuard")
            .field("frame_id", &self.frame_id)
            .field("armed", &self.release.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct Frame {
    image: Option<Image>,
    rotation: Rotation,
    guard: ReleaseGuard,
}

impl Frame {
    pub fn new<F>(image: Option<Image>, rotation: Rotation, release: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let id = FRAME_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            image,
            rotation,
            guard: ReleaseGuard::new(id, Box::new(release)),
        }
    }

    pub fn id(&self) -> u64 {
        self.guard.frame_id
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn release(self) -> bool {
        self.guard.release()
    }

    pub fn into_parts(self) -> (Option<Image>, Rotation, ReleaseGuard) {
        (self.image, self.rotation, self.guard)
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    fn counted_frame(counter: &Arc<AtomicUsize>) -> Frame {
        let counter = Arc::clone(counter);
        Frame::new(
            Some(Image::from(image::RgbaImage::new(2, 2))),
            Rotation::Deg0,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
    }

    #[test]
    fn explicit_release_runs_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let frame = counted_frame(&released);
        assert!(frame.release());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_a_frame_releases_it() {
        let released = Arc::new(AtomicUsize::new(0));
        drop(counted_frame(&released));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn split_guard_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let (image, _, guard) = counted_frame(&released).into_parts();
        assert!(image.is_some());
        assert_eq!(released.load(Ordering::SeqCst), 0);
        guard.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_release_is_reported_not_raised() {
        let frame = Frame::new(None, Rotation::Deg0, || {
            Err(Error::ReleaseError("buffer already closed".into()))
        });
        assert!(!frame.release());
    }

    #[test]
    fn rotation_accepts_quarter_turns_only() {
        assert_eq!(Rotation::from_degrees(450).unwrap(), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(270).unwrap().degrees(), 270);
        assert!(matches!(
            Rotation::from_degrees(45),
            Err(Error::RotationError(45))
        ));
    }
}
