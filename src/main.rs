use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use resonance_core::config::Config;
use resonance_core::logging::init_tracing;
use resonance_core::recommend::{fallback_recommendations, RankedRecommendation, ERROR_FALLBACK};
use resonance_core::{
    ModelHandle, Observation, ParameterSnapshot, RecommendationCatalog, ResonanceError,
    ResonanceTransformer, RiskCategory,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read stdin: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid request: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] ResonanceError),
    #[error("failed to read snapshot {path}: {source}")]
    Snapshot {
        path: String,
        source: std::io::Error,
    },
}

/// Team-level aggregates for rule-based advice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamContext {
    #[serde(default = "default_avg_mood")]
    avg_mood: f32,
    #[serde(default = "default_burnout_index")]
    burnout_index: f32,
}

fn default_avg_mood() -> f32 {
    3.0
}

fn default_burnout_index() -> f32 {
    30.0
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    sequences: Vec<Vec<Observation>>,
    top_k: Option<usize>,
    context: Option<TeamContext>,
}

#[derive(Debug, Serialize)]
struct SequenceResult {
    risk_category: RiskCategory,
    risk_probs: Vec<f32>,
    burnout_probability: f32,
    recommendations: Vec<RankedRecommendation>,
}

#[derive(Debug, Serialize)]
struct Response {
    predictions: Vec<SequenceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_recommendations: Option<Vec<&'static str>>,
}

/// Builds the serving model once: from the configured snapshot when present,
/// otherwise from the seeded initialization.
fn load_model(config: &Config) -> Result<ModelHandle, CliError> {
    let model = match &config.snapshot_path {
        Some(path) => {
            let snapshot = read_snapshot(path)?;
            let model = ResonanceTransformer::from_snapshot(config.model.clone(), &snapshot)?;
            tracing::info!(path = %path.display(), tensors = snapshot.len(), "loaded parameter snapshot");
            model
        }
        None => {
            tracing::warn!("RESONANCE_SNAPSHOT not set, serving untrained weights");
            ResonanceTransformer::new(config.model.clone())?
        }
    };
    Ok(ModelHandle::new(model))
}

fn read_snapshot(path: &Path) -> Result<ParameterSnapshot, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Snapshot {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

fn run(config: &Config, handle: &ModelHandle) -> Result<Response, CliError> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let request: Request = serde_json::from_str(&input)?;

    let team_recommendations = request
        .context
        .as_ref()
        .map(|ctx| fallback_recommendations(ctx.avg_mood, ctx.burnout_index));

    let predictions = if request.sequences.is_empty() {
        Vec::new()
    } else {
        let model = handle.current();
        let catalog = RecommendationCatalog::default();
        let top_k = request.top_k.unwrap_or(config.top_k);

        model
            .predict(&request.sequences)?
            .into_iter()
            .map(|p| SequenceResult {
                recommendations: catalog.top_k(&p.recommendation_probs, top_k),
                risk_category: p.risk_category,
                risk_probs: p.risk_probs,
                burnout_probability: p.burnout_probability,
            })
            .collect()
    };

    tracing::info!(
        sequences = predictions.len(),
        team = team_recommendations.is_some(),
        "request served"
    );
    Ok(Response {
        predictions,
        team_recommendations,
    })
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let outcome = load_model(&config)
        .and_then(|handle| run(&config, &handle))
        .and_then(|response| Ok(serde_json::to_string(&response)?));

    match outcome {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "request failed, emitting fallback");
            match serde_json::to_string(&ERROR_FALLBACK) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "failed to encode fallback"),
            }
            ExitCode::FAILURE
        }
    }
}
