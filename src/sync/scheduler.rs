use std::{
    sync::{
        atomic::Ordering,
        mpsc::{self, RecvTimeoutError},
        Arc, RwLock,
    },
    thread,
    time::{Duration, Instant},
};

use super::THREAD_SEQ;
use crate::{
    detector::{Completion, DetectionError, Detector, InputImage, Outcome, QualityProfile},
    frame::{Frame, ReleaseGuard},
    model::Dimensions,
    session::ScanState,
    setting::SchedulerConfig,
    Error, Result,
};

pub type ScanHandler = Box<dyn FnMut(ScanState) + Send + 'static>;

enum Message {
    Submit(Frame),
    Completed { ticket: u64, outcome: Outcome },
    Sync(mpsc::Sender<()>),
    Terminate,
}

/// Frame accounting. Every delivered frame ends up counted in `released`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerStats {
    pub received: u64,
    pub empty: u64,
    pub dispatched: u64,
    pub discarded: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub released: u64,
    pub release_failures: u64,
}

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub profile: QualityProfile,
    pub detection_timeout: Option<Duration>,
    pub shutdown_grace: Duration,
}

impl SchedulerOptions {
    pub fn new(profile: QualityProfile, config: &SchedulerConfig) -> Self {
        Self {
            profile,
            detection_timeout: config.detection_timeout(),
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

/// Feeds frames to a [`Detector`] one at a time.
/// A frame arriving while a detection is in flight waits in a single pending
/// slot; a newer arrival replaces it and the replaced frame is released
/// without detection. When the in-flight detection completes, the pending
/// frame (if any) is dispatched next.
pub struct FrameScheduler {
    id: usize,
    sender: mpsc::Sender<Message>,
    stats: Arc<RwLock<SchedulerStats>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl FrameScheduler {
    #[tracing::instrument(name = "Starting frame scheduler", skip(detector, handler), err)]
    pub fn new(
        name: &str,
        detector: Arc<dyn Detector>,
        options: SchedulerOptions,
        handler: ScanHandler,
    ) -> Result<Self> {
        let id = THREAD_SEQ.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::channel();
        let stats = Arc::new(RwLock::new(SchedulerStats::default()));

        let admission = Admission {
            scheduler_id: id,
            detector,
            options,
            handler,
            sender: sender.clone(),
            stats: Arc::clone(&stats),
            in_flight: None,
            pending: None,
            next_ticket: 0,
        };

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || admission.run(receiver))
            .map_err(Error::as_unknown_error)?;

        Ok(Self {
            id,
            sender,
            stats,
            thread: Some(thread),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn submit(&self, frame: Frame) -> Result<()> {
        if let Err(mpsc::SendError(message)) = self.sender.send(Message::Submit(frame)) {
            drop(message);
            return Err(Error::SyncError(
                format!("frame scheduler {} is not running", self.id).into(),
            ));
        }
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        let (done_sender, done_receiver) = mpsc::channel();
        self.sender
            .send(Message::Sync(done_sender))
            .map_err(|_| {
                Error::SyncError(format!("frame scheduler {} is not running", self.id).into())
            })?;
        done_receiver.recv().map_err(Error::as_sync_error)
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
            .read()
            .map(|stats| *stats)
            .unwrap_or_default()
    }

    pub fn shutdown(self) -> SchedulerStats {
        let stats = Arc::clone(&self.stats);
        drop(self);
        let final_stats = stats.read().map(|stats| *stats).unwrap_or_default();
        tracing::info!(?final_stats, "frame scheduler stopped");
        final_stats
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        tracing::info!("Sending terminate message to frame scheduler {}", self.id);
        let _ = self.sender.send(Message::Terminate);

        tracing::info!("Shutting down frame scheduler {}", self.id);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("frame scheduler {} panicked", self.id);
            }
        }
    }
}

struct InFlight {
    ticket: u64,
    guard: ReleaseGuard,
    image_size: Dimensions,
    dispatched_at: Instant,
}

struct Admission {
    scheduler_id: usize,
    detector: Arc<dyn Detector>,
    options: SchedulerOptions,
    handler: ScanHandler,
    sender: mpsc::Sender<Message>,
    stats: Arc<RwLock<SchedulerStats>>,
    in_flight: Option<InFlight>,
    pending: Option<Frame>,
    next_ticket: u64,
}

impl Admission {
    fn run(mut self, receiver: mpsc::Receiver<Message>) {
        loop {
            let message = match self.deadline() {
                Some(deadline) if deadline <= Instant::now() => {
                    self.expire();
                    continue;
                }
                Some(deadline) => {
                    match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => {
                            self.expire();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match receiver.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };

            match message {
                Message::Submit(frame) => self.admit(frame),
                Message::Completed { ticket, outcome } => self.complete(ticket, outcome),
                Message::Sync(done) => {
                    let _ = done.send(());
                }
                Message::Terminate => break,
            }
        }
        self.drain(&receiver);
    }

    fn deadline(&self) -> Option<Instant> {
        let timeout = self.options.detection_timeout?;
        self.in_flight
            .as_ref()
            .map(|in_flight| in_flight.dispatched_at + timeout)
    }

    fn admit(&mut self, frame: Frame) {
        if frame.image().map_or(true, |image| image.is_empty()) {
            tracing::debug!(frame = frame.id(), "frame has no image payload");
            self.record(|stats| stats.empty += 1);
            let (_, _, guard) = frame.into_parts();
            self.release(guard);
            return;
        }
        self.record(|stats| stats.received += 1);

        if self.in_flight.is_none() {
            self.dispatch(frame);
            return;
        }
        if let Some(superseded) = self.pending.replace(frame) {
            tracing::trace!(frame = superseded.id(), "superseded by a newer frame");
            self.record(|stats| stats.discarded += 1);
            let (_, _, guard) = superseded.into_parts();
            self.release(guard);
        }
    }

    fn dispatch(&mut self, frame: Frame) {
        let (image, rotation, guard) = frame.into_parts();
        let Some(image) = image else {
            self.release(guard);
            return;
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let input = InputImage::new(image, rotation);
        let sender = self.sender.clone();
        let completion = Completion::new(move |outcome| {
            // the scheduler may already be gone; the frame was released then
            let _ = sender.send(Message::Completed { ticket, outcome });
        });

        tracing::debug!(
            scheduler = self.scheduler_id,
            frame = guard.frame_id(),
            rotation = rotation.degrees(),
            ticket,
            "dispatching frame"
        );
        self.in_flight = Some(InFlight {
            ticket,
            guard,
            image_size: input.upright_size(),
            dispatched_at: Instant::now(),
        });
        self.record(|stats| stats.dispatched += 1);
        self.detector.detect(input, self.options.profile, completion);
    }

    fn complete(&mut self, ticket: u64, outcome: Outcome) {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.ticket == ticket => in_flight,
            other => {
                self.in_flight = other;
                tracing::debug!(ticket, "ignoring completion of an expired detection");
                return;
            }
        };

        match &outcome {
            Ok(result) => {
                tracing::trace!(ticket, landmarks = result.len(), "detection succeeded");
                self.record(|stats| stats.succeeded += 1);
            }
            Err(err) => {
                tracing::warn!(ticket, "detection failed: {}", err);
                self.record(|stats| stats.failed += 1);
            }
        }
        let image_size = in_flight.image_size;
        self.finish(in_flight, ScanState::from_outcome(outcome, image_size));
    }

    fn expire(&mut self) {
        let Some(timeout) = self.options.detection_timeout else {
            return;
        };
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        tracing::warn!(
            ticket = in_flight.ticket,
            "detection timed out after {} ms",
            timeout.as_millis()
        );
        self.record(|stats| stats.timed_out += 1);
        self.finish(in_flight, ScanState::Failed(DetectionError::TimedOut(timeout)));
    }

    fn finish(&mut self, in_flight: InFlight, scan: ScanState) {
        (self.handler)(scan);
        self.release(in_flight.guard);
        if let Some(next) = self.pending.take() {
            self.dispatch(next);
        }
    }

    fn drain(&mut self, receiver: &mpsc::Receiver<Message>) {
        if let Some(pending) = self.pending.take() {
            self.record(|stats| stats.discarded += 1);
            let (_, _, guard) = pending.into_parts();
            self.release(guard);
        }

        let grace_deadline = Instant::now() + self.options.shutdown_grace;
        while self.in_flight.is_some() {
            let remaining = grace_deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match receiver.recv_timeout(remaining) {
                Ok(Message::Completed { ticket, outcome }) => self.complete(ticket, outcome),
                Ok(message) => self.reject(message),
                Err(_) => break,
            }
        }
        if let Some(in_flight) = self.in_flight.take() {
            tracing::warn!(
                ticket = in_flight.ticket,
                "releasing in-flight frame without a result"
            );
            self.release(in_flight.guard);
        }

        while let Ok(message) = receiver.try_recv() {
            self.reject(message);
        }
        tracing::info!("frame scheduler {} drained", self.scheduler_id);
    }

    fn reject(&mut self, message: Message) {
        match message {
            Message::Submit(frame) => {
                self.record(|stats| {
                    stats.received += 1;
                    stats.discarded += 1;
                });
                let (_, _, guard) = frame.into_parts();
                self.release(guard);
            }
            Message::Sync(done) => {
                let _ = done.send(());
            }
            Message::Completed { ticket, .. } => {
                tracing::debug!(ticket, "dropping completion after shutdown")
            }
            Message::Terminate => {}
        }
    }

    fn release(&mut self, guard: ReleaseGuard) {
        let released = guard.release();
        self.record(|stats| {
            stats.released += 1;
            if !released {
                stats.release_failures += 1;
            }
        });
    }

    fn record<F: FnOnce(&mut SchedulerStats)>(&self, f: F) {
        if let Ok(mut stats) = self.stats.write() {
            f(&mut stats);
        }
    }
}
