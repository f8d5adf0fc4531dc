use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::CctvError;
use crate::types::{FrameFormat, Resolution};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "CCTV_CONFIG";

/// Window title used when none is configured.
pub const DEFAULT_TITLE: &str = "CCTV";

/// Display configuration: window geometry, frame format and pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub resolution: Resolution,
    pub format: FrameFormat,
    pub title: String,
    #[serde(alias = "targetFPS")]
    pub target_fps: u32,
    #[serde(alias = "loopPlayback")]
    pub loop_playback: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::VGA,
            format: FrameFormat::Yuyv,
            title: DEFAULT_TITLE.into(),
            target_fps: 30,
            loop_playback: false,
        }
    }
}

impl DisplayConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CctvError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        info!("Loaded display config from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Builds the config from `CCTV_CONFIG` (if set) plus the individual
    /// `CCTV_FORMAT` / `CCTV_WIDTH` / `CCTV_HEIGHT` overrides.
    pub fn from_env() -> Result<Self, CctvError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies field overrides looked up by variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CctvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = lookup("CCTV_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(width) = lookup("CCTV_WIDTH") {
            self.resolution.width = parse_dimension("CCTV_WIDTH", &width)?;
        }
        if let Some(height) = lookup("CCTV_HEIGHT") {
            self.resolution.height = parse_dimension("CCTV_HEIGHT", &height)?;
        }
        debug!("Display config after overrides: {:?}", self);
        self.validate()
    }

    pub fn validate(&self) -> Result<(), CctvError> {
        self.resolution.validate_for_window()?;
        if self.target_fps == 0 {
            return Err(CctvError::ConfigurationInvalid {
                reason: "target_fps must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Time budget per frame at `target_fps`.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.target_fps.max(1) as u64)
    }
}

fn parse_dimension(key: &str, value: &str) -> Result<u32, CctvError> {
    value.trim().parse().map_err(|_| CctvError::ConfigurationInvalid {
        reason: format!("{key}={value:?} is not a pixel count"),
    })
}

#[cfg(test)]
mod tests {
    use super::DisplayConfig;
    use crate::{FrameFormat, Resolution};

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "resolution": {"width": 1280, "height": 720},
            "format": "mjpeg",
            "targetFPS": 15,
            "loopPlayback": true
        }"#;

        let cfg: DisplayConfig = serde_json::from_str(json).expect("valid camelCase config");
        assert_eq!(cfg.resolution, Resolution::HD);
        assert_eq!(cfg.format, FrameFormat::Mjpeg);
        assert_eq!(cfg.target_fps, 15);
        assert!(cfg.loop_playback);
        assert_eq!(cfg.title, crate::DEFAULT_TITLE);
    }

    #[test]
    fn deserializes_snake_case_fields() {
        let json = r#"{
            "format": "yuyv",
            "target_fps": 60,
            "loop_playback": false,
            "title": "Porch"
        }"#;

        let cfg: DisplayConfig = serde_json::from_str(json).expect("valid snake_case config");
        assert_eq!(cfg.resolution, Resolution::VGA);
        assert_eq!(cfg.target_fps, 60);
        assert_eq!(cfg.title, "Porch");
        assert!(!cfg.loop_playback);
    }

    #[test]
    fn rejects_unknown_format() {
        let json = r#"{ "format": "h264" }"#;
        assert!(serde_json::from_str::<DisplayConfig>(json).is_err());
    }

    #[test]
    fn overrides_replace_fields() {
        let mut cfg = DisplayConfig::default();
        cfg.apply_overrides(|key| match key {
            "CCTV_FORMAT" => Some("MJPG".into()),
            "CCTV_WIDTH" => Some("320".into()),
            _ => None,
        })
        .expect("valid overrides");
        assert_eq!(cfg.format, FrameFormat::Mjpeg);
        assert_eq!(cfg.resolution, Resolution::new(320, 480));
    }

    #[test]
    fn overrides_reject_bad_geometry() {
        let mut cfg = DisplayConfig::default();
        assert!(cfg.apply_overrides(|key| (key == "CCTV_HEIGHT").then(|| "0".into())).is_err());

        let mut cfg = DisplayConfig::default();
        assert!(cfg.apply_overrides(|key| (key == "CCTV_WIDTH").then(|| "wide".into())).is_err());
    }

    #[test]
    fn frame_interval_from_fps() {
        let cfg = DisplayConfig { target_fps: 25, ..Default::default() };
        assert_eq!(cfg.frame_interval().as_micros(), 40_000);
        assert!(DisplayConfig { target_fps: 0, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("cctv-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "format": "mjpeg", "targetFPS": 5 }"#).unwrap();
        let cfg = DisplayConfig::load(&path).expect("config file loads");
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.format, FrameFormat::Mjpeg);
        assert_eq!(cfg.target_fps, 5);
    }
}
