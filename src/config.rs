use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ResonanceError, Result};
use crate::types::{
    DEFAULT_DROPOUT, DEFAULT_D_FF, DEFAULT_D_MODEL, DEFAULT_N_HEADS, DEFAULT_N_LAYERS,
    DEFAULT_N_RECOMMENDATIONS, MAX_SEQ_LEN, N_RISK_CLASSES,
};

/// Architecture hyperparameters of the resonance transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub d_model: usize,
    pub n_heads: usize,
    pub n_layers: usize,
    pub d_ff: usize,
    pub max_seq_len: usize,
    pub n_risk_classes: usize,
    pub n_recommendations: usize,
    /// Kept for parity with training; the forward pass never applies it.
    pub dropout: f32,
    /// Seed for Xavier initialization.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            d_model: DEFAULT_D_MODEL,
            n_heads: DEFAULT_N_HEADS,
            n_layers: DEFAULT_N_LAYERS,
            d_ff: DEFAULT_D_FF,
            max_seq_len: MAX_SEQ_LEN,
            n_risk_classes: N_RISK_CLASSES,
            n_recommendations: DEFAULT_N_RECOMMENDATIONS,
            dropout: DEFAULT_DROPOUT,
            seed: 42,
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse("RESONANCE_D_MODEL") {
            config.d_model = val;
        }
        if let Some(val) = env_parse("RESONANCE_N_HEADS") {
            config.n_heads = val;
        }
        if let Some(val) = env_parse("RESONANCE_N_LAYERS") {
            config.n_layers = val;
        }
        if let Some(val) = env_parse("RESONANCE_D_FF") {
            config.d_ff = val;
        }
        if let Some(val) = env_parse("RESONANCE_MAX_SEQ_LEN") {
            config.max_seq_len = val;
        }
        if let Some(val) = env_parse("RESONANCE_N_RECOMMENDATIONS") {
            config.n_recommendations = val;
        }
        if let Some(val) = env_parse("RESONANCE_SEED") {
            config.seed = val;
        }

        config
    }

    /// Per-head projection width.
    pub fn d_k(&self) -> usize {
        self.d_model / self.n_heads.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_heads == 0 {
            return Err(ResonanceError::InvalidConfig("n_heads must be > 0".into()));
        }
        if self.d_model == 0 || self.d_model % self.n_heads != 0 {
            return Err(ResonanceError::HeadsNotDivisible {
                d_model: self.d_model,
                n_heads: self.n_heads,
            });
        }
        if self.d_model < 4 {
            return Err(ResonanceError::InvalidConfig(format!(
                "d_model must be >= 4, got {}",
                self.d_model
            )));
        }
        if self.n_layers == 0 || self.d_ff == 0 || self.max_seq_len == 0 {
            return Err(ResonanceError::InvalidConfig(
                "n_layers, d_ff and max_seq_len must be > 0".into(),
            ));
        }
        if self.n_risk_classes != N_RISK_CLASSES {
            return Err(ResonanceError::InvalidConfig(format!(
                "n_risk_classes must be {}, got {}",
                N_RISK_CLASSES, self.n_risk_classes
            )));
        }
        if self.n_recommendations == 0 {
            return Err(ResonanceError::InvalidConfig(
                "n_recommendations must be > 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ResonanceError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

/// Process-level settings for the `resonance` binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub top_k: usize,
    pub model: ModelConfig,
    /// JSON `ParameterSnapshot` loaded once at startup (`RESONANCE_SNAPSHOT`).
    /// Without it the model keeps its seeded initialization.
    pub snapshot_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| crate::logging::DEFAULT_LOG_FILTER.to_string());
        let top_k = env_parse("RESONANCE_TOP_K").unwrap_or(3);
        let snapshot_path = std::env::var("RESONANCE_SNAPSHOT")
            .ok()
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            log_level,
            top_k,
            model: ModelConfig::from_env(),
            snapshot_path,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}
