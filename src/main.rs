// src/main.rs

mod config;
mod follower;
mod inference;
mod overlay;
mod pipeline;
mod preprocessing;
mod recorder;
mod steering;
mod types;
mod video_processor;
mod vision;

use anyhow::Result;
use follower::{HandCodedLaneFollower, SteeringSource};
use inference::ModelLaneFollower;
use pipeline::{Driver, MetricsSummary};
use recorder::FrameRecorder;
use steering::{ClampedActuator, LoggingActuator};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use types::{Config, SteeringMode};
use video_processor::VideoSource;

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pi_lane_follower={},ort=warn", config.logging.level))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚗 Lane follower starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Color band {:?}..{:?} | canny {}/{} | roi cut {:.2} | mode {}",
        config.color.lower,
        config.color.upper,
        config.edges.low_threshold,
        config.edges.high_threshold,
        config.roi.cut,
        config.steering.mode.as_str()
    );

    let mut steering: Box<dyn SteeringSource> = match config.steering.mode {
        SteeringMode::HandCoded => Box::new(HandCodedLaneFollower::new(config.clone())),
        SteeringMode::Model => Box::new(ModelLaneFollower::from_config(&config)?),
    };
    info!("✓ {} steering ready", steering.name());

    if let Some(index) = config.video.camera_index {
        let source = VideoSource::open_camera(index, &config.video)?;
        let prefix = FrameRecorder::session_prefix();
        let summary = drive(&config, source, &prefix, steering.as_mut())?;
        report(&prefix, &summary)?;
        return Ok(());
    }

    let video_files = video_processor::find_video_files(&config.video.input)?;
    if video_files.is_empty() {
        error!("No video files found in {}", config.video.input);
        return Ok(());
    }

    for (idx, video_path) in video_files.iter().enumerate() {
        info!("========================================");
        info!(
            "Processing video {}/{}: {}",
            idx + 1,
            video_files.len(),
            video_path.display()
        );

        steering.reset();
        let result = VideoSource::open_file(video_path).and_then(|source| {
            let name = source.name.clone();
            drive(&config, source, &name, steering.as_mut()).map(|summary| (name, summary))
        });

        match result {
            Ok((name, summary)) => report(&name, &summary)?,
            Err(e) => error!("Failed to process video: {:#}", e),
        }
    }

    Ok(())
}

fn drive(
    config: &Config,
    mut source: VideoSource,
    name: &str,
    steering: &mut dyn SteeringSource,
) -> Result<MetricsSummary> {
    let skipped = source.skip_frames(config.video.skip_frames)?;
    if skipped > 0 {
        info!("Skipped {} warm-up frame(s)", skipped);
    }

    let writer = if config.overlay.enabled {
        video_processor::create_overlay_writer(
            &config.video,
            name,
            source.width,
            source.height,
            source.fps,
        )?
    } else {
        None
    };

    let recorder = if config.recording.enabled {
        Some(FrameRecorder::new(&config.recording, name)?)
    } else {
        None
    };

    let actuator = ClampedActuator::new(LoggingActuator::new(), &config.servo);
    let mut driver = Driver::new(config.clone(), actuator)
        .with_overlay_sink(writer)
        .with_recorder(recorder);

    let summary = driver.run(steering, &mut source)?;
    let servo = driver.actuator().inner();
    info!(
        "Servo received {} command(s), last {:?}°",
        servo.commands(),
        servo.last_angle()
    );
    Ok(summary)
}

fn report(name: &str, summary: &MetricsSummary) -> Result<()> {
    info!("📊 Final report for {}:", name);
    info!("  Total frames: {}", summary.total_frames);
    info!(
        "  Two lanes: {} | one lane: {} | model: {} | none: {}",
        summary.frames_two_lanes,
        summary.frames_one_lane,
        summary.frames_model,
        summary.frames_no_detection
    );
    let failures = summary.steering_failures
        + summary.actuator_failures
        + summary.overlay_failures
        + summary.recorder_failures;
    if failures > 0 {
        warn!("  ⚠️  {} stage failure(s) were skipped", failures);
    }
    info!("  Processing Speed: {:.1} FPS", summary.fps);
    info!("{}", serde_json::to_string(summary)?);
    Ok(())
}
