//! Configuration surface consumed by a tracking session.
//!
//! Every section deserialises from JSON with per-field defaults, so a file
//! only needs to mention what it overrides.

use crate::{error::HerdTrackError, fusion::WeightClass, modality::Modality};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub min_hits: usize,
    pub max_age: usize,
    pub iou_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_hits: 3,
            max_age: 30,
            iou_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub match_threshold: f32,
    pub suggestion_threshold: f32,
    pub embedding_dim: Option<usize>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.7,
            suggestion_threshold: 0.5,
            embedding_dim: None,
        }
    }
}

/// Mean absolute error of the fused estimate per weight class, in kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaeConfig {
    pub piglet: f32,
    pub growing: f32,
    pub finishing: f32,
    pub adult: f32,
}

impl Default for MaeConfig {
    fn default() -> Self {
        Self {
            piglet: 1.5,
            growing: 3.0,
            finishing: 4.5,
            adult: 6.0,
        }
    }
}

impl MaeConfig {
    pub fn for_class(&self, class: WeightClass) -> f32 {
        match class {
            WeightClass::Piglet => self.piglet,
            WeightClass::Growing => self.growing,
            WeightClass::Finishing => self.finishing,
            WeightClass::Adult => self.adult,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Prior mixing weight per modality. Modalities absent here are ignored
    /// by the fusion engine.
    pub priors: BTreeMap<Modality, f32>,
    pub mae: MaeConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        let priors = BTreeMap::from([
            (Modality::Geometric, 0.3),
            (Modality::Cnn, 0.5),
            (Modality::Transformer, 0.2),
        ]);
        Self {
            priors,
            mae: MaeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tracker: TrackerConfig,
    pub identity: IdentityConfig,
    pub fusion: FusionConfig,
    pub nms_iou_threshold: f32,
    /// Frames per second of the processed video; used for track durations.
    pub frame_rate: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            identity: IdentityConfig::default(),
            fusion: FusionConfig::default(),
            nms_iou_threshold: 0.45,
            frame_rate: 30.0,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, HerdTrackError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, HerdTrackError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), HerdTrackError> {
        check_unit("tracker.iou_threshold", self.tracker.iou_threshold)?;
        check_unit("nms_iou_threshold", self.nms_iou_threshold)?;
        check_range(
            "identity.match_threshold",
            self.identity.match_threshold,
            -1.0,
            1.0,
        )?;
        check_range(
            "identity.suggestion_threshold",
            self.identity.suggestion_threshold,
            -1.0,
            1.0,
        )?;
        if self.identity.embedding_dim == Some(0) {
            return Err(HerdTrackError::InvalidConfig(
                "identity.embedding_dim must be positive".to_string(),
            ));
        }
        for (modality, prior) in self.fusion.priors.iter() {
            if !prior.is_finite() || *prior < 0.0 {
                return Err(HerdTrackError::InvalidConfig(format!(
                    "fusion.priors.{} must be a non-negative number, got {}",
                    modality, prior
                )));
            }
        }
        for class in WeightClass::ALL {
            let mae = self.fusion.mae.for_class(class);
            if !mae.is_finite() || mae < 0.0 {
                return Err(HerdTrackError::InvalidConfig(format!(
                    "fusion.mae for {:?} must be a non-negative number, got {}",
                    class, mae
                )));
            }
        }
        if !self.frame_rate.is_finite() {
            return Err(HerdTrackError::InvalidConfig(
                "frame_rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> Result<(), HerdTrackError> {
    check_range(name, value, 0.0, 1.0)
}

fn check_range(name: &str, value: f32, lo: f32, hi: f32) -> Result<(), HerdTrackError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(HerdTrackError::InvalidConfig(format!(
            "{} must be within [{}, {}], got {}",
            name, lo, hi, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.tracker.min_hits, 3);
        assert_eq!(config.tracker.max_age, 30);
        assert_eq!(config.identity.match_threshold, 0.7);
        assert_eq!(config.identity.suggestion_threshold, 0.5);
        assert_eq!(config.fusion.priors.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "tracker": { "min_hits": 2, "max_age": 5 },
            "fusion": { "priors": { "cnn": 1.0, "geometric": 1.0 } }
        }"#;
        let config = SessionConfig::from_json_str(json).unwrap();
        assert_eq!(config.tracker.min_hits, 2);
        assert_eq!(config.tracker.max_age, 5);
        assert_eq!(config.tracker.iou_threshold, 0.3);
        assert_eq!(config.fusion.priors.len(), 2);
        assert!(!config.fusion.priors.contains_key(&Modality::Transformer));
        assert_eq!(config.fusion.mae, MaeConfig::default());
    }

    #[test]
    fn test_unknown_modality_rejected() {
        let json = r#"{ "fusion": { "priors": { "lidar": 1.0 } } }"#;
        assert!(matches!(
            SessionConfig::from_json_str(json),
            Err(HerdTrackError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = SessionConfig::default();
        config.tracker.iou_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(HerdTrackError::InvalidConfig(_))
        ));

        let mut config = SessionConfig::default();
        config.fusion.priors.insert(Modality::Cnn, -0.1);
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.fusion.mae.adult = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SessionConfig::from_json_file("/nonexistent/herdtrack.json"),
            Err(HerdTrackError::Io(_))
        ));
    }
}
