use std::{sync::Arc, time::Duration};

use poseview::{
    detector::{simulated::SimulatedDetector, still::analyse_still, Detector},
    frame::{Frame, Rotation},
    image::Image,
    model::Dimensions,
    overlay::{DisplayMetrics, TracingSurface},
    result::Result,
    session::{ScanState, Session},
    setting::Setting,
    Error,
};

const DETECTION_LATENCY: Duration = Duration::from_millis(40);
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const STREAM_FRAMES: usize = 150;

#[tokio::main]
async fn main() -> Result<()> {
    // Get Setting
    let setting = Setting::get()?;
    poseview::tracing::init(&setting.config.logging)?;

    let detector = Arc::new(
        SimulatedDetector::new(tokio::runtime::Handle::current(), DETECTION_LATENCY)
            .with_failures(40),
    );

    // Still image (and its rotation) from the arguments, otherwise a synthetic camera stream
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(path) => {
            let degrees = args
                .next()
                .map(|degrees| degrees.parse::<u32>().map_err(Error::as_unknown_error))
                .transpose()?
                .unwrap_or_default();
            let rotation = Rotation::from_degrees(degrees)?;
            tokio::task::block_in_place(|| run_still(&setting, &*detector, &path, rotation))
        }
        None => tokio::task::block_in_place(|| run_stream(&setting, detector)),
    }
}

fn run_still(
    setting: &Setting,
    detector: &dyn Detector,
    path: &str,
    rotation: Rotation,
) -> Result<()> {
    let image = Image::from_path(path)?;
    let scan = analyse_still(
        detector,
        image,
        rotation,
        setting.config.scheduler.detection_timeout(),
    )?;
    match scan {
        ScanState::Success { result, image_size } => {
            let report = serde_json::json!({
                "path": path,
                "image_size": image_size,
                "landmarks": result,
            });
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
        }
        ScanState::Failed(err) => tracing::error!("no pose found in {}: {}", path, err),
    }
    Ok(())
}

fn run_stream(setting: &Setting, detector: Arc<SimulatedDetector>) -> Result<()> {
    let mut session = Session::new(&setting.config, detector.clone(), Arc::new(TracingSurface))?;
    let states = session.subscribe()?;

    let plan = session.bind(DisplayMetrics::from_viewport(Dimensions::new(1080, 2400)))?;
    tracing::info!(
        ratio = %plan.preview_ratio,
        resolution = ?plan.working_resolution,
        "camera bound"
    );

    let payload = Image::from(image::RgbaImage::new(480, 640));
    for index in 0..STREAM_FRAMES {
        let frame = Frame::new(Some(payload.clone()), Rotation::Deg0, move || {
            tracing::trace!(index, "buffer returned to producer");
            Ok(())
        });
        session.submit(frame)?;
        if let Some(notice) = session.messenger().current() {
            tracing::debug!(severity = ?notice.severity, "showing: {}", notice.content);
        }
        std::thread::sleep(FRAME_INTERVAL);
    }

    if let Some(stats) = session.shutdown() {
        tracing::info!(
            detector_calls = detector.calls(),
            "stream finished: {}",
            serde_json::to_string(&stats).unwrap_or_default()
        );
    }
    for state in states.try_iter() {
        tracing::debug!(state = state.name(), facing = ?state.facing(), "observed session state");
    }
    Ok(())
}
