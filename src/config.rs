use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::scoring::AnalysisParams;
use crate::analysis::vibrato::VibratoParams;
use crate::dsp::pitch::PitchConfig;
use crate::paths;

/// Application configuration, loaded from config.toml.
///
/// With `#[serde(default)]` a missing field falls back to the Default impl,
/// so the file is optional and can be as short as a single line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub analysis: AnalysisConfig,
    pub scoring: ScoringConfig,
    pub session: SessionConfig,
}

/// Pitch detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub pitch_floor_hz: f64,
    pub pitch_ceiling_hz: f64,
    pub frame_size_ms: f64,
    pub hop_size_ms: f64,
    pub power_threshold: f64,
    pub clarity_threshold: f64,
}

/// Scoring thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A frame counts as in tune when within this many cents of the target.
    pub tolerance_cents: f64,
    pub vibrato_min_rate_hz: f64,
    pub vibrato_max_rate_hz: f64,
    pub min_vibrato_depth_cents: f64,
}

/// Which strategy produces the base score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseScore {
    /// Percentage of frames within the cents tolerance.
    #[default]
    Accuracy,
    /// 100 minus half the mean Hz error.
    MeanError,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base: BaseScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whose history results are filed under when --user isn't given.
    pub username: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let pitch = PitchConfig::default();
        Self {
            pitch_floor_hz: pitch.pitch_floor_hz,
            pitch_ceiling_hz: pitch.pitch_ceiling_hz,
            frame_size_ms: pitch.frame_size_ms,
            hop_size_ms: pitch.hop_size_ms,
            power_threshold: pitch.power_threshold,
            clarity_threshold: pitch.clarity_threshold,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let params = AnalysisParams::default();
        Self {
            tolerance_cents: params.tolerance_cents,
            vibrato_min_rate_hz: params.vibrato.min_rate_hz,
            vibrato_max_rate_hz: params.vibrato.max_rate_hz,
            min_vibrato_depth_cents: params.vibrato.min_depth_cents,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            username: "singer".into(),
        }
    }
}

impl From<&DetectionConfig> for PitchConfig {
    fn from(cfg: &DetectionConfig) -> Self {
        PitchConfig {
            pitch_floor_hz: cfg.pitch_floor_hz,
            pitch_ceiling_hz: cfg.pitch_ceiling_hz,
            frame_size_ms: cfg.frame_size_ms,
            hop_size_ms: cfg.hop_size_ms,
            power_threshold: cfg.power_threshold,
            clarity_threshold: cfg.clarity_threshold,
        }
    }
}

impl From<&AnalysisConfig> for AnalysisParams {
    fn from(cfg: &AnalysisConfig) -> Self {
        AnalysisParams {
            tolerance_cents: cfg.tolerance_cents,
            vibrato: VibratoParams {
                min_rate_hz: cfg.vibrato_min_rate_hz,
                max_rate_hz: cfg.vibrato_max_rate_hz,
                min_depth_cents: cfg.min_vibrato_depth_cents,
            },
        }
    }
}

/// Load the application config from <config_dir>/singscore/config.toml.
/// If the file doesn't exist, returns defaults.
pub fn load_config() -> Result<AppConfig> {
    let path = paths::config_file();

    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(contents)?;

    if cfg.analysis.vibrato_min_rate_hz >= cfg.analysis.vibrato_max_rate_hz {
        anyhow::bail!(
            "vibrato_min_rate_hz ({}) must be below vibrato_max_rate_hz ({})",
            cfg.analysis.vibrato_min_rate_hz,
            cfg.analysis.vibrato_max_rate_hz
        );
    }
    if cfg.detection.pitch_floor_hz <= 0.0 || cfg.detection.pitch_floor_hz >= cfg.detection.pitch_ceiling_hz {
        anyhow::bail!(
            "pitch_floor_hz ({}) must be positive and below pitch_ceiling_hz ({})",
            cfg.detection.pitch_floor_hz,
            cfg.detection.pitch_ceiling_hz
        );
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.detection.pitch_floor_hz, 50.0);
        assert_eq!(cfg.detection.pitch_ceiling_hz, 2000.0);
        assert_eq!(cfg.analysis.tolerance_cents, 100.0);
        assert_eq!(cfg.analysis.vibrato_min_rate_hz, 4.0);
        assert_eq!(cfg.analysis.vibrato_max_rate_hz, 8.0);
        assert_eq!(cfg.analysis.min_vibrato_depth_cents, 30.0);
        assert_eq!(cfg.scoring.base, BaseScore::Accuracy);
        assert_eq!(cfg.session.username, "singer");
    }

    #[test]
    fn parse_partial_toml() {
        // If the user only specifies some fields, the rest should use defaults
        let toml_str = r#"
[analysis]
tolerance_cents = 50.0

[scoring]
base = "mean_error"
"#;
        let cfg = parse_config(toml_str).unwrap();
        assert_eq!(cfg.analysis.tolerance_cents, 50.0);
        assert_eq!(cfg.scoring.base, BaseScore::MeanError);
        // Unspecified fields should be defaults
        assert_eq!(cfg.analysis.vibrato_max_rate_hz, 8.0);
        assert_eq!(cfg.detection.hop_size_ms, 10.0);
        assert_eq!(cfg.session.username, "singer");
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.detection.clarity_threshold, 0.5);
    }

    #[test]
    fn unknown_base_score_is_rejected() {
        assert!(parse_config("[scoring]\nbase = \"loudness\"\n").is_err());
    }

    #[test]
    fn inverted_vibrato_band_is_rejected() {
        let toml_str = r#"
[analysis]
vibrato_min_rate_hz = 9.0
"#;
        let err = parse_config(toml_str).unwrap_err();
        assert!(err.to_string().contains("vibrato_min_rate_hz"));
    }

    #[test]
    fn pitch_config_conversion() {
        let cfg = DetectionConfig {
            pitch_floor_hz: 80.0,
            ..DetectionConfig::default()
        };
        let pitch_cfg: PitchConfig = (&cfg).into();
        assert_eq!(pitch_cfg.pitch_floor_hz, 80.0);
        assert_eq!(pitch_cfg.hop_size_ms, 10.0);
        assert_eq!(pitch_cfg.power_threshold, 0.2);
    }

    #[test]
    fn analysis_params_conversion() {
        let cfg = AnalysisConfig {
            vibrato_max_rate_hz: 15.0,
            ..AnalysisConfig::default()
        };
        let params: AnalysisParams = (&cfg).into();
        assert_eq!(params.tolerance_cents, 100.0);
        assert_eq!(params.vibrato.max_rate_hz, 15.0);
        assert_eq!(params.vibrato.min_depth_cents, 30.0);
    }

    #[test]
    fn roundtrip_toml() {
        let cfg = AppConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let loaded: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(loaded.detection.pitch_ceiling_hz, cfg.detection.pitch_ceiling_hz);
        assert_eq!(loaded.scoring.base, cfg.scoring.base);
    }
}
