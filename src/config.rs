use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.roi.cut > 0.0 && self.roi.cut < 1.0) {
            bail!("roi.cut must lie in (0, 1), got {}", self.roi.cut);
        }
        if !(self.lanes.boundary >= 0.0 && self.lanes.boundary < 0.5) {
            bail!("lanes.boundary must lie in [0, 0.5), got {}", self.lanes.boundary);
        }
        for c in 0..3 {
            if self.color.lower[c] > self.color.upper[c] {
                bail!(
                    "color band is empty on channel {}: lower {} > upper {}",
                    c,
                    self.color.lower[c],
                    self.color.upper[c]
                );
            }
        }
        if self.edges.low_threshold <= 0.0 || self.edges.high_threshold <= 0.0 {
            bail!("edge thresholds must be positive");
        }
        if self.hough.rho <= 0.0 || self.hough.theta_degrees <= 0.0 || self.hough.threshold <= 0 {
            bail!("hough resolution and vote threshold must be positive");
        }
        if self.steering.max_deviation_two_lanes <= 0
            || self.steering.max_deviation_one_lane <= 0
            || self.model.max_deviation <= 0
        {
            bail!("steering deviation bounds must be positive");
        }
        if self.servo.min_angle > self.servo.max_angle {
            bail!(
                "servo.min_angle {} exceeds servo.max_angle {}",
                self.servo.min_angle,
                self.servo.max_angle
            );
        }
        if self.video.width <= 0 || self.video.height <= 0 || self.video.fps <= 0.0 {
            bail!("video width, height and fps must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_cut_outside_unit_interval() {
        let mut config = Config::default();
        config.roi.cut = 1.0;
        assert!(config.validate().is_err());
        config.roi.cut = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_servo_range() {
        let mut config = Config::default();
        config.servo.min_angle = 140;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_color_band() {
        let mut config = Config::default();
        config.color.lower[0] = 181;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "roi:\n  cut: 0.5\nservo:\n  min_angle: 50").unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.roi.cut, 0.5);
        assert_eq!(config.servo.min_angle, 50);
        assert_eq!(config.servo.max_angle, 135);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "roi:\n  cut: 1.5").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }
}
