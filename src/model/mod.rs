//! Transformer model: layers composed by ownership, parent to child.

pub mod attention;
pub mod encoder;
pub mod features;
pub mod feed_forward;
pub mod heads;
pub mod init;
pub mod params;
pub mod positional;
pub mod transformer;

pub use attention::{AttentionMask, MultiHeadSelfAttention};
pub use encoder::{EncoderStack, TransformerEncoderLayer};
pub use features::EmotionalFeatureEncoder;
pub use feed_forward::FeedForward;
pub use heads::{HeadOutputs, MlpHead, PredictionHeads};
pub use init::xavier_uniform_;
pub use params::{ParamMut, ParamRef, Parameterized};
pub use positional::PositionalEncoding;
pub use transformer::{risk_categories, EmotionalBatch, ModelOutput, ResonanceTransformer};
