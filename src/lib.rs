//! # resonance-core: emotional-signal transformer
//!
//! Attention model over daily emotional signals (mood, energy, stress,
//! day-of-week, hour-of-day) producing, per sequence:
//!
//! - **Risk distribution** over `thriving`, `stable`, `struggling`, `at-risk`
//! - **Burnout probability** in `[0, 1]`
//! - **Recommendation scores** over a fixed candidate set
//!
//! Inference only: dropout is the identity, parameters are immutable once a
//! model is built, and concurrent callers share one model through
//! [`ModelHandle`].
//!
//! ## Module layout
//!
//! - [`model`] - feature encoder, attention, encoder stack, heads, assembly
//! - [`layers`] - `Linear`, `LayerNorm`, `Embedding`
//! - [`matrix`] - softmax, GELU, sigmoid, arg-max
//! - [`sequence`] - right-aligned batching of observation sequences
//! - [`snapshot`] - named parameter load/export, swappable handle
//! - [`recommend`] - ranking and text templates
//! - [`sanitize`] - input and parameter checks
//! - [`config`], [`error`], [`logging`], [`types`]
//!
//! ## Example
//!
//! ```rust
//! use resonance_core::{ModelConfig, Observation, ResonanceTransformer};
//!
//! let config = ModelConfig { d_model: 32, n_heads: 4, n_layers: 1, d_ff: 64, ..ModelConfig::default() };
//! let model = ResonanceTransformer::new(config).unwrap();
//! let week: Vec<Observation> = (0..5)
//!     .map(|day| Observation::new(3.5, 3.0, 2.0, day, 9))
//!     .collect();
//! let predictions = model.predict(&[week]).unwrap();
//! assert_eq!(predictions[0].risk_probs.len(), 4);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod layers;
pub mod logging;
pub mod matrix;
pub mod model;
pub mod recommend;
pub mod sanitize;
pub mod sequence;
pub mod snapshot;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{Config, ModelConfig};
pub use error::{ResonanceError, Result};
pub use model::{
    risk_categories, AttentionMask, EmotionalBatch, ModelOutput, Parameterized, ResonanceTransformer,
};
pub use recommend::{RankedRecommendation, RecommendationCatalog};
pub use sequence::{build_batch, SequenceBatch};
pub use snapshot::{ModelHandle, ParamTensor, ParameterSnapshot};
pub use types::*;
