//! Common Types and Constants
//!
//! Shared data structures used across the model, batching and
//! recommendation modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Default embedding width per timestep
pub const DEFAULT_D_MODEL: usize = 256;

/// Default number of attention heads
pub const DEFAULT_N_HEADS: usize = 8;

/// Default number of encoder layers
pub const DEFAULT_N_LAYERS: usize = 6;

/// Default feed-forward hidden width
pub const DEFAULT_D_FF: usize = 1024;

/// Maximum supported sequence length (days)
pub const MAX_SEQ_LEN: usize = 90;

/// Number of risk categories
pub const N_RISK_CLASSES: usize = 4;

/// Default number of recommendation candidates
pub const DEFAULT_N_RECOMMENDATIONS: usize = 10;

/// Default dropout probability (training only)
pub const DEFAULT_DROPOUT: f32 = 0.1;

/// Rows of the day-of-week embedding table
pub const DAYS_PER_WEEK: usize = 7;

/// Rows of the hour-of-day embedding table
pub const HOURS_PER_DAY: usize = 24;

/// Layer normalization epsilon
pub const LAYER_NORM_EPS: f32 = 1e-5;

/// Base of the sinusoidal positional signal
pub const POSITIONAL_BASE: f32 = 10000.0;

// ==================== Observation ====================

/// One day's emotional-signal tuple.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub mood: f32,
    pub energy: f32,
    pub stress: f32,
    /// 0 = first day of the week, 6 = last
    pub day_of_week: u8,
    /// 0..=23
    pub hour_of_day: u8,
}

impl Observation {
    pub fn new(mood: f32, energy: f32, stress: f32, day_of_week: u8, hour_of_day: u8) -> Self {
        Self {
            mood,
            energy,
            stress,
            day_of_week,
            hour_of_day,
        }
    }

    /// Neutral filler used for left padding.
    pub fn padding() -> Self {
        Self::new(0.0, 0.0, 0.0, 0, 0)
    }
}

// ==================== Risk Category ====================

/// Trajectory severity, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "thriving")]
    Thriving,
    #[serde(rename = "stable")]
    Stable,
    #[serde(rename = "struggling")]
    Struggling,
    #[serde(rename = "at-risk")]
    AtRisk,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; N_RISK_CLASSES] = [
        RiskCategory::Thriving,
        RiskCategory::Stable,
        RiskCategory::Struggling,
        RiskCategory::AtRisk,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn to_index(&self) -> usize {
        match self {
            RiskCategory::Thriving => 0,
            RiskCategory::Stable => 1,
            RiskCategory::Struggling => 2,
            RiskCategory::AtRisk => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Thriving => "thriving",
            RiskCategory::Stable => "stable",
            RiskCategory::Struggling => "struggling",
            RiskCategory::AtRisk => "at-risk",
        }
    }

    pub fn try_from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "thriving" => Some(RiskCategory::Thriving),
            "stable" => Some(RiskCategory::Stable),
            "struggling" => Some(RiskCategory::Struggling),
            "at-risk" | "at_risk" => Some(RiskCategory::AtRisk),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Prediction ====================

/// Per-sample prediction produced by the model heads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    /// Distribution over the four risk categories (sums to 1)
    pub risk_probs: Vec<f32>,
    /// Arg-max of `risk_probs`
    pub risk_category: RiskCategory,
    /// Burnout probability in [0, 1]
    pub burnout_probability: f32,
    /// Distribution over recommendation candidates (sums to 1)
    pub recommendation_probs: Vec<f32>,
    /// Final-normalized hidden vector at the last timestep
    pub hidden_state: Vec<f32>,
}
