use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{HologramError, Result};

/// Configuration for the [`crate::align::FrameAligner`] stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub max_features: usize,
    pub ransac_threshold: f64,
    pub lowe_ratio: f32,
    pub detector: DetectorKind,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            ransac_threshold: DEFAULT_RANSAC_THRESHOLD,
            lowe_ratio: LOWE_RATIO,
            detector: DetectorKind::Orb,
        }
    }
}

/// Which feature detector/descriptor family the aligner uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Orb,
    Sift,
}

/// Configuration for the [`crate::chroma::ChromaticityAccumulator`] stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    pub buffer_size: usize,
    pub saturation_threshold: f32,
    pub highlight_threshold: u8,
    pub min_area: usize,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            highlight_threshold: DEFAULT_HIGHLIGHT_THRESHOLD,
            min_area: DEFAULT_MIN_AREA,
        }
    }
}

/// Configuration for the [`crate::selector::HsvRegionSelector`] stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub s_percentile: f32,
    pub v_percentile: f32,
    pub min_region_area: usize,
    pub hue_variance_threshold: f32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            s_percentile: DEFAULT_S_PERCENTILE,
            v_percentile: DEFAULT_V_PERCENTILE,
            min_region_area: DEFAULT_MIN_REGION_AREA,
            hue_variance_threshold: DEFAULT_HUE_VARIANCE_THRESHOLD,
        }
    }
}

/// Configuration for the [`crate::verifier::DynamicBehaviorVerifier`] stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub background_frames: usize,
    pub hue_energy_threshold: f32,
    pub use_classifier: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            background_frames: DEFAULT_BACKGROUND_FRAMES,
            hue_energy_threshold: DEFAULT_HUE_ENERGY_THRESHOLD,
            use_classifier: false,
        }
    }
}

/// Configuration for the [`crate::pipeline::Coordinator`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub update_interval: usize,
    pub confidence_threshold: f32,
    pub nms_iou_threshold: f32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_iou_threshold: NMS_IOU_THRESHOLD,
        }
    }
}

/// Top-level pipeline configuration, aggregating every stage's settings.
///
/// One struct per concern, all `#[serde(default)]` so a partial TOML file
/// is valid.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub aligner: AlignerConfig,
    pub accumulator: AccumulatorConfig,
    pub selector: SelectorConfig,
    pub verifier: VerifierConfig,
    pub coordinator: CoordinatorConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.aligner.max_features == 0 {
            return Err(HologramError::InvalidConfig(
                "aligner.max_features must be > 0".into(),
            ));
        }
        if self.aligner.ransac_threshold <= 0.0 {
            return Err(HologramError::InvalidConfig(
                "aligner.ransac_threshold must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.aligner.lowe_ratio) {
            return Err(HologramError::InvalidConfig(
                "aligner.lowe_ratio must be in [0, 1]".into(),
            ));
        }
        if self.accumulator.buffer_size == 0 {
            return Err(HologramError::InvalidConfig(
                "accumulator.buffer_size must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.accumulator.saturation_threshold) {
            return Err(HologramError::InvalidConfig(
                "accumulator.saturation_threshold must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.selector.s_percentile)
            || !(0.0..=100.0).contains(&self.selector.v_percentile)
        {
            return Err(HologramError::InvalidConfig(
                "selector percentiles must be in [0, 100]".into(),
            ));
        }
        if self.selector.hue_variance_threshold < 0.0 {
            return Err(HologramError::InvalidConfig(
                "selector.hue_variance_threshold must be >= 0".into(),
            ));
        }
        if self.verifier.background_frames == 0 {
            return Err(HologramError::InvalidConfig(
                "verifier.background_frames must be > 0".into(),
            ));
        }
        if self.coordinator.update_interval == 0 {
            return Err(HologramError::InvalidConfig(
                "coordinator.update_interval must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.coordinator.confidence_threshold) {
            return Err(HologramError::InvalidConfig(
                "coordinator.confidence_threshold must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.coordinator.nms_iou_threshold) {
            return Err(HologramError::InvalidConfig(
                "coordinator.nms_iou_threshold must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_max_features() {
        let mut cfg = PipelineConfig::default();
        cfg.aligner.max_features = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_percentile() {
        let mut cfg = PipelineConfig::default();
        cfg.selector.s_percentile = 150.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_roundtrip_with_partial_table() {
        let partial = "[aligner]\nmax_features = 200\n";
        let cfg: PipelineConfig = toml::from_str(partial).expect("parse");
        assert_eq!(cfg.aligner.max_features, 200);
        assert_eq!(cfg.accumulator.buffer_size, DEFAULT_BUFFER_SIZE);
    }
}
