use std::sync::{mpsc, Arc};

use crate::{
    detector::{Detector, QualityProfile},
    frame::Frame,
    messenger::{MessageSeverity, Messenger},
    model::Dimensions,
    overlay::{
        select_bind_plan, BindPlan, DisplayMetrics, OverlayGeometry, OverlayRenderer,
        OverlaySurface, Viewport,
    },
    setting::Config,
    sync::{FrameScheduler, LatestReceiver, Publisher, SchedulerOptions, SchedulerStats},
    Error, Result,
};

pub mod scan;
pub mod state;

pub use scan::ScanState;
pub use state::{Facing, SessionMachine, SessionState};

pub struct Session {
    config: Config,
    detector: Arc<dyn Detector>,
    surface: Arc<dyn OverlaySurface>,
    machine: SessionMachine,
    overlay: Publisher<OverlayGeometry>,
    messenger: Messenger,
    viewport: Viewport,
    scheduler: Option<FrameScheduler>,
}

impl Session {
    #[tracing::instrument(name = "Creating session", skip_all, err)]
    pub fn new(
        config: &Config,
        detector: Arc<dyn Detector>,
        surface: Arc<dyn OverlaySurface>,
    ) -> Result<Self> {
        let machine = SessionMachine::new(config.session.facing, Publisher::new())?;
        Ok(Self {
            config: config.clone(),
            detector,
            surface,
            machine,
            overlay: Publisher::new(),
            messenger: Messenger::from_config(&config.messenger),
            viewport: Viewport::default(),
            scheduler: None,
        })
    }

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    pub fn facing(&self) -> Facing {
        self.machine.facing()
    }

    pub fn profile(&self) -> QualityProfile {
        self.config.session.profile
    }

    pub fn subscribe(&self) -> Result<mpsc::Receiver<SessionState>> {
        self.machine.publisher().subscribe()
    }

    /// Only the newest geometry is kept for a subscriber that falls behind.
    pub fn subscribe_overlay(&self) -> Result<LatestReceiver<OverlayGeometry>> {
        self.overlay.subscribe_latest()
    }

    pub fn messenger(&self) -> &Messenger {
        &self.messenger
    }

    pub fn permission_denied(&mut self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.machine.permission_denied(message.clone())?;
        self.messenger
            .send_message(message, Some(MessageSeverity::Error))
    }

    pub fn bind_failed(&mut self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.machine.bind_failed(message.clone())?;
        self.messenger
            .send_message(message, Some(MessageSeverity::Error))
    }

    /// Camera provider is ready. Picks the capture plan for `metrics`, starts
    /// the frame pipeline and moves to `PreviewReady`. Any failure on the way
    /// leaves the session in `Error` with nothing started.
    #[tracing::instrument(name = "Binding session", skip(self), err)]
    pub fn bind(&mut self, metrics: DisplayMetrics) -> Result<BindPlan> {
        if !matches!(self.machine.state(), SessionState::Setup(_)) {
            return Err(Error::TransitionError {
                state: self.machine.state().name(),
                event: "bind",
            });
        }
        match self.start_pipeline(metrics) {
            Ok((plan, scheduler)) => {
                self.scheduler = Some(scheduler);
                self.machine.bind_succeeded()?;
                Ok(plan)
            }
            Err(err) => {
                self.bind_failed(format!("Camera bind failed: {}", err))?;
                Err(err)
            }
        }
    }

    fn start_pipeline(&self, metrics: DisplayMetrics) -> Result<(BindPlan, FrameScheduler)> {
        let plan = select_bind_plan(&metrics)?;
        self.viewport.set(metrics.viewport)?;

        let renderer = OverlayRenderer::new(
            Arc::clone(&self.surface),
            self.viewport.clone(),
            self.config.overlay.clone(),
            self.messenger.clone(),
            self.overlay.clone(),
        );
        let scheduler = FrameScheduler::new(
            &format!("frame_scheduler_{:?}", self.facing()).to_lowercase(),
            Arc::clone(&self.detector),
            SchedulerOptions::new(self.profile(), &self.config.scheduler),
            renderer.into_handler(),
        )?;
        Ok((plan, scheduler))
    }

    pub fn set_viewport(&self, viewport: Dimensions) -> Result<()> {
        Dimensions::non_empty(viewport.width, viewport.height)?;
        self.viewport.set(viewport)
    }

    pub fn submit(&self, frame: Frame) -> Result<()> {
        match &self.scheduler {
            Some(scheduler) => scheduler.submit(frame),
            None => {
                tracing::debug!(
                    frame = frame.id(),
                    state = self.machine.state().name(),
                    "pipeline not running, releasing frame"
                );
                frame.release();
                Ok(())
            }
        }
    }

    pub fn sync(&self) -> Result<()> {
        match &self.scheduler {
            Some(scheduler) => scheduler.sync(),
            None => Ok(()),
        }
    }

    pub fn stats(&self) -> Option<SchedulerStats> {
        self.scheduler.as_ref().map(FrameScheduler::stats)
    }

    pub fn shutdown(&mut self) -> Option<SchedulerStats> {
        self.scheduler.take().map(FrameScheduler::shutdown)
    }

    pub fn switch_facing(&mut self, facing: Facing) -> Result<Option<SchedulerStats>> {
        let stats = self.shutdown();
        self.machine = SessionMachine::new(facing, self.machine.publisher().clone())?;
        self.config.session.facing = facing;
        tracing::info!(?facing, "camera facing switched");
        Ok(stats)
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;
    use crate::{
        detector::{Completion, InputImage},
        frame::Rotation,
        image::Image,
        model::{DetectionResult, Landmark, LandmarkKind},
        overlay::{AspectRatio, Orientation, OverlayPoint, Scale, Segment},
    };

    /// Reports both shoulders at the top of the frame, synchronously.
    struct ShoulderDetector;

    impl Detector for ShoulderDetector {
        fn detect(&self, input: InputImage, _: QualityProfile, completion: Completion) {
            let size = input.upright_size();
            let y = size.height as f32 / 4.;
            completion.report(DetectionResult::new(vec![
                Landmark::new(LandmarkKind::LeftShoulder, 0., y, 0.9),
                Landmark::new(LandmarkKind::RightShoulder, size.width as f32, y, 0.9),
            ]));
        }
    }

    #[derive(Default)]
    struct CountingSurface {
        segments: Mutex<Vec<Segment>>,
        updates: AtomicUsize,
    }

    impl OverlaySurface for CountingSurface {
        fn update_geometry(&self, _: &[OverlayPoint], segments: &[Segment]) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            *self.segments.lock().unwrap() = segments.to_vec();
        }

        fn update_viewport_scale(&self, _: Dimensions, _: Scale) {}
    }

    struct Fixture {
        session: Session,
        surface: Arc<CountingSurface>,
        released: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new() -> Self {
            let surface = Arc::new(CountingSurface::default());
            let session = Session::new(
                &Config::default(),
                Arc::new(ShoulderDetector),
                Arc::clone(&surface) as Arc<dyn OverlaySurface>,
            )
            .unwrap();
            Self {
                session,
                surface,
                released: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// The detector reports from inside `detect`, which queues the
        /// completion behind the first barrier; the second one drains it.
        fn settle(&self) {
            self.session.sync().unwrap();
            self.session.sync().unwrap();
        }

        fn frame(&self, width: u32, height: u32) -> Frame {
            let released = Arc::clone(&self.released);
            Frame::new(
                Some(Image::from(image::RgbaImage::new(width, height))),
                Rotation::Deg0,
                move || {
                    released.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            )
        }
    }

    fn phone() -> DisplayMetrics {
        DisplayMetrics::new(Dimensions::new(1080, 2400), Orientation::Portrait)
    }

    #[test]
    fn bind_starts_pipeline_and_draws_overlay() {
        let mut fixture = Fixture::new();
        assert_eq!(fixture.session.state(), &SessionState::Setup(Facing::Back));

        let plan = fixture.session.bind(phone()).unwrap();
        assert_eq!(plan.preview_ratio, AspectRatio::Ratio16x9);
        assert_eq!(plan.working_resolution, Dimensions::new(1080, 1920));
        assert!(fixture.session.state().is_preview_ready());

        fixture.session.submit(fixture.frame(540, 1200)).unwrap();
        fixture.settle();

        assert_eq!(fixture.surface.updates.load(Ordering::SeqCst), 1);
        let segments = fixture.surface.segments.lock().unwrap().clone();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end.x, 1080.);
        assert_eq!(segments[0].end.y, 600.);
        assert_eq!(fixture.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn denied_permission_never_starts_pipeline() {
        let mut fixture = Fixture::new();
        fixture.session.permission_denied("Camera permission denied").unwrap();

        assert_eq!(
            fixture.session.state(),
            &SessionState::Error("Camera permission denied".into(), Facing::Back)
        );
        let notice = fixture.session.messenger().current().unwrap();
        assert_eq!(notice.severity, MessageSeverity::Error);

        fixture.session.submit(fixture.frame(8, 8)).unwrap();
        assert_eq!(fixture.released.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.session.stats(), None);

        let err = fixture.session.bind(phone()).unwrap_err();
        assert!(matches!(err, Error::TransitionError { state: "error", .. }));
    }

    #[test]
    fn unusable_display_fails_the_bind() {
        let mut fixture = Fixture::new();
        let metrics = DisplayMetrics::new(Dimensions::new(0, 0), Orientation::Portrait);
        assert!(fixture.session.bind(metrics).is_err());
        assert!(matches!(fixture.session.state(), SessionState::Error(..)));
        assert_eq!(fixture.session.stats(), None);
    }

    #[test]
    fn switching_facing_restarts_in_setup() {
        let mut fixture = Fixture::new();
        let states = fixture.session.subscribe().unwrap();
        fixture.session.bind(phone()).unwrap();
        fixture.session.submit(fixture.frame(8, 8)).unwrap();
        fixture.settle();

        let stats = fixture.session.switch_facing(Facing::Front).unwrap().unwrap();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.released, 1);
        assert_eq!(fixture.session.facing(), Facing::Front);
        assert_eq!(
            states.try_iter().collect::<Vec<_>>(),
            vec![
                SessionState::Setup(Facing::Back),
                SessionState::PreviewReady(Facing::Back),
                SessionState::Setup(Facing::Front),
            ]
        );
    }

    #[test]
    fn slow_overlay_reader_sees_only_newest_geometry() {
        let mut fixture = Fixture::new();
        let overlay = fixture.session.subscribe_overlay().unwrap();
        fixture.session.bind(phone()).unwrap();

        for width in 1..=200 {
            fixture.session.submit(fixture.frame(width * 4, 800)).unwrap();
            fixture.settle();
        }

        let geometry = overlay.try_take().unwrap();
        assert_eq!(geometry.source, Dimensions::new(800, 800));
        assert_eq!(overlay.try_take(), None);
        assert_eq!(fixture.surface.updates.load(Ordering::SeqCst), 200);
    }

    #[test]
    fn viewport_must_not_be_empty() {
        let fixture = Fixture::new();
        assert!(fixture.session.set_viewport(Dimensions::new(0, 10)).is_err());
        assert!(fixture.session.set_viewport(Dimensions::new(10, 10)).is_ok());
    }
}
