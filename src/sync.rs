use std::sync::atomic::AtomicUsize;

static THREAD_SEQ: AtomicUsize = AtomicUsize::new(0);

pub mod publisher;
pub mod scheduler;

pub use publisher::{LatestReceiver, Publisher};
pub use scheduler::{FrameScheduler, ScanHandler, SchedulerOptions, SchedulerStats};
