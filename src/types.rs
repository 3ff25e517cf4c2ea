use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub color: ColorConfig,
    pub edges: EdgeConfig,
    pub roi: RoiConfig,
    pub hough: HoughConfig,
    pub lanes: LaneConfig,
    pub steering: SteeringConfig,
    pub servo: ServoConfig,
    pub overlay: OverlayConfig,
    pub model: ModelConfig,
    pub video: VideoConfig,
    pub recording: RecordingConfig,
    pub logging: LoggingConfig,
}

/// HSV band of the track marking. OpenCV scale: hue 0..180, sat/val 0..255.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            lower: [150, 50, 120],
            upper: [180, 255, 255],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f64,
    pub high_threshold: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: 200.0,
            high_threshold: 400.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Fraction of the frame height discarded from the top, in (0, 1).
    pub cut: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self { cut: 1.0 / 3.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    pub rho: f64,
    pub theta_degrees: f64,
    pub threshold: i32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta_degrees: 1.0,
            threshold: 25,
            min_line_length: 10.0,
            max_line_gap: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    /// Width fraction excluded from each side's assignment zone.
    /// 1/3 gives a left zone over the left 2/3 and a right zone over the right 2/3.
    pub boundary: f64,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            boundary: 1.0 / 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteeringMode {
    HandCoded,
    Model,
}

impl SteeringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HandCoded => "handcoded",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub mode: SteeringMode,
    pub max_deviation_two_lanes: i32,
    pub max_deviation_one_lane: i32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            mode: SteeringMode::HandCoded,
            max_deviation_two_lanes: 5,
            max_deviation_one_lane: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub min_angle: i32,
    pub max_angle: i32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_angle: 45,
            max_angle: 135,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub heading_width: i32,
    pub lane_width: i32,
    /// Weight of the original frame in the blend.
    pub opacity: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heading_width: 5,
            lane_width: 10,
            opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub input_name: String,
    pub input_width: usize,
    pub input_height: usize,
    pub num_threads: usize,
    pub max_deviation: i32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/lane-navigation.onnx".to_string(),
            input_name: "input".to_string(),
            input_width: 200,
            input_height: 66,
            num_threads: 2,
            max_deviation: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Video file or directory of recordings. Ignored when `camera_index` is set.
    pub input: String,
    pub camera_index: Option<i32>,
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    pub skip_frames: usize,
    pub max_frames: Option<u64>,
    pub output_dir: String,
    pub save_overlay: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input: "data/video".to_string(),
            camera_index: None,
            width: 320,
            height: 240,
            fps: 20.0,
            skip_frames: 3,
            max_frames: None,
            output_dir: "output".to_string(),
            save_overlay: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub enabled: bool,
    pub output_dir: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: "footage".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// FRAME & GEOMETRY
// ============================================================================

/// BGR, 8 bits per channel, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

/// Straight segment in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }

    pub fn is_horizontal(&self) -> bool {
        self.y1 == self.y2
    }

    /// Degree-1 fit `y = slope * x + intercept` through both endpoints.
    /// `None` for vertical segments.
    pub fn slope_intercept(&self) -> Option<(f64, f64)> {
        if self.is_vertical() {
            return None;
        }
        let slope = (self.y2 - self.y1) as f64 / (self.x2 - self.x1) as f64;
        let intercept = self.y1 as f64 - slope * self.x1 as f64;
        Some((slope, intercept))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaneSide {
    Left,
    Right,
}

/// One fitted lane line. `segment` runs from the frame bottom (x1, y1)
/// to mid-height (x2, y2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lane {
    pub side: LaneSide,
    pub segment: LineSegment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_intercept() {
        let seg = LineSegment::new(100, 240, 150, 120);
        let (slope, intercept) = seg.slope_intercept().unwrap();
        assert!((slope + 2.4).abs() < 1e-9);
        assert!((intercept - 480.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_has_no_fit() {
        let seg = LineSegment::new(10, 0, 10, 50);
        assert!(seg.is_vertical());
        assert!(seg.slope_intercept().is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.color.lower, [150, 50, 120]);
        assert_eq!(config.hough.threshold, 25);
        assert_eq!(config.steering.mode, SteeringMode::HandCoded);
        assert_eq!(config.servo.max_angle, 135);
    }

    #[test]
    fn test_partial_section_override() {
        let yaml = "steering:\n  mode: model\n  max_deviation_two_lanes: 7\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.steering.mode, SteeringMode::Model);
        assert_eq!(config.steering.max_deviation_two_lanes, 7);
        assert_eq!(config.steering.max_deviation_one_lane, 3);
    }
}
