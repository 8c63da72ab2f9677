use {
    anyhow::Context as _,
    serde::Deserialize,
    std::{path::Path, time::Duration},
    thiserror::Error,
};

pub const DEFAULT_TARGETS: [&str; 3] = ["image/run.png", "image/resume.png", "image/accept.png"];
/// Correction between capture and input coordinates, e.g. a 2x display
/// captured in physical pixels but clicked in logical points.
pub const DEFAULT_SCALE_FACTOR: f64 = 0.5;
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(4);
pub const DEFAULT_CONFIDENCE: f32 = 0.85;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no target images configured")]
    NoTargets,
    #[error("confidence must be between 0 and 1, got {0}")]
    Confidence(f32),
    #[error("scale factor must be a positive number, got {0}")]
    ScaleFactor(f64),
    #[error("{name} must be a non-negative number of seconds, got {value}")]
    Duration { name: &'static str, value: f64 },
}

/// Startup settings of the click loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Image files to look for, in priority order.
    pub targets: Vec<String>,
    pub scale_factor: f64,
    /// How long the pointer must stay still before a click is allowed.
    pub idle_threshold: Duration,
    pub confidence: f32,
    /// Pause between scans.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGETS.iter().map(|s| s.to_string()).collect(),
            scale_factor: DEFAULT_SCALE_FACTOR,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            confidence: DEFAULT_CONFIDENCE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// On-disk form of [`Config`]. Missing fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    targets: Option<Vec<String>>,
    scale_factor: Option<f64>,
    idle_threshold_secs: Option<f64>,
    confidence: Option<f32>,
    poll_interval_secs: Option<f64>,
}

impl Config {
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = threshold;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Reads a JSON config file on top of the defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs_err::read_to_string(path)?;
        Self::from_json(&text).with_context(|| format!("invalid config file {:?}", path))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = serde_json::from_str(text)?;
        let mut config = Self::default();
        if let Some(targets) = file.targets {
            config = config.with_targets(targets);
        }
        if let Some(scale_factor) = file.scale_factor {
            config = config.with_scale_factor(scale_factor);
        }
        if let Some(secs) = file.idle_threshold_secs {
            config = config.with_idle_threshold(seconds("idle_threshold_secs", secs)?);
        }
        if let Some(confidence) = file.confidence {
            config = config.with_confidence(confidence);
        }
        if let Some(secs) = file.poll_interval_secs {
            config = config.with_poll_interval(seconds("poll_interval_secs", secs)?);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::Confidence(self.confidence));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(ConfigError::ScaleFactor(self.scale_factor));
        }
        Ok(())
    }
}

/// Converts a user-supplied number of seconds.
pub fn seconds(name: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::Duration { name, value })
}

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(
        config.targets,
        vec!["image/run.png", "image/resume.png", "image/accept.png"]
    );
    assert_eq!(config.scale_factor, 0.5);
    assert_eq!(config.idle_threshold, Duration::from_secs(4));
    assert_eq!(config.confidence, 0.85);
    assert_eq!(config.poll_interval, Duration::from_secs(1));
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn partial_json_keeps_defaults() {
    let config = Config::from_json(
        r#"{ "targets": ["ok.png"], "idle_threshold_secs": 2.5, "confidence": 0.9 }"#,
    )
    .unwrap();
    assert_eq!(config.targets, vec!["ok.png"]);
    assert_eq!(config.idle_threshold, Duration::from_millis(2500));
    assert_eq!(config.confidence, 0.9);
    assert_eq!(config.scale_factor, DEFAULT_SCALE_FACTOR);
    assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
}

#[test]
fn json_rejects_unknown_fields_and_negative_durations() {
    assert!(Config::from_json(r#"{ "treshold": 1 }"#).is_err());
    let err = Config::from_json(r#"{ "poll_interval_secs": -1 }"#).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::Duration {
            name: "poll_interval_secs",
            value: -1.0
        })
    );
}

#[test]
fn json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("autoack.json");
    fs_err::write(&path, r#"{ "scale_factor": 1.0 }"#).unwrap();
    assert_eq!(Config::from_json_file(&path).unwrap().scale_factor, 1.0);

    let missing = dir.path().join("missing.json");
    assert!(Config::from_json_file(missing).is_err());
}

#[test]
fn validation_errors() {
    assert_eq!(
        Config::default().with_targets(vec![]).validate(),
        Err(ConfigError::NoTargets)
    );
    assert_eq!(
        Config::default().with_confidence(1.5).validate(),
        Err(ConfigError::Confidence(1.5))
    );
    assert!(matches!(
        Config::default().with_confidence(f32::NAN).validate(),
        Err(ConfigError::Confidence(_))
    ));
    assert_eq!(
        Config::default().with_scale_factor(0.0).validate(),
        Err(ConfigError::ScaleFactor(0.0))
    );
    assert!(matches!(
        Config::default().with_scale_factor(f64::INFINITY).validate(),
        Err(ConfigError::ScaleFactor(_))
    ));
}
