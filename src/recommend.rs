//! Recommendation ranking and text lookup.
//!
//! The recommendation head only scores candidate indices; this module turns
//! scores into ranked, human-readable advice. A rule-based selection over
//! average mood and burnout index is available when no model output exists.

use serde::{Deserialize, Serialize};

/// Candidate texts, indexed like the recommendation head's outputs.
pub const DEFAULT_TEMPLATES: [&str; 10] = [
    "Schedule a brief mindfulness break during peak stress hours.",
    "Consider a walking meeting to boost both energy and engagement.",
    "Recognize recent achievements to maintain positive momentum.",
    "Suggest flexible working hours during high-stress periods.",
    "Organize a team social activity to improve morale.",
    "Provide additional support resources for struggling team members.",
    "Review workload distribution to prevent burnout.",
    "Encourage regular check-ins with team members showing declining trends.",
    "Implement a 'no-meeting' focus time block.",
    "Celebrate team wins to boost collective mood.",
];

/// Generic advice emitted when a request cannot be served at all.
pub const ERROR_FALLBACK: [&str; 3] = [
    "Encourage regular breaks to maintain well-being.",
    "Schedule team sync to align on priorities.",
    "Promote work-life balance practices.",
];

/// Burnout index (0–100) above which workload advice is added.
pub const HIGH_BURNOUT_INDEX: f32 = 60.0;

/// Average mood (1–5 scale) below which support resources are suggested.
pub const LOW_MOOD: f32 = 2.5;

/// Average mood below which morale-building advice is suggested.
pub const MODERATE_MOOD: f32 = 3.5;

/// Maximum number of rule-based recommendations.
pub const MAX_FALLBACK: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub index: usize,
    pub score: f32,
    pub text: String,
}

/// Indices of the `k` highest scores, best first; equal scores keep the lower index first.
pub fn rank(probs: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]).then(a.cmp(&b)));
    order.truncate(k);
    order
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCatalog {
    templates: Vec<String>,
}

impl Default for RecommendationCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect())
    }
}

impl RecommendationCatalog {
    pub fn new(templates: Vec<String>) -> Self {
        Self { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.templates.get(index).map(String::as_str)
    }

    /// Top-`k` candidates by score. Indices without a template are skipped.
    pub fn top_k(&self, probs: &[f32], k: usize) -> Vec<RankedRecommendation> {
        rank(probs, probs.len())
            .into_iter()
            .filter_map(|index| {
                self.get(index).map(|text| RankedRecommendation {
                    index,
                    score: probs[index],
                    text: text.to_string(),
                })
            })
            .take(k)
            .collect()
    }
}

/// Rule-based selection from aggregate team signals.
///
/// - burnout index > 60: workload review, flexible hours
/// - mood < 2.5: support resources, regular check-ins
/// - mood < 3.5: mindfulness break, team social
/// - otherwise: recognize achievements, celebrate wins
/// - focus time block always appended, at most five entries
pub fn fallback_recommendations(avg_mood: f32, burnout_index: f32) -> Vec<&'static str> {
    let mut picks = Vec::with_capacity(MAX_FALLBACK);

    if burnout_index > HIGH_BURNOUT_INDEX {
        picks.push(DEFAULT_TEMPLATES[6]);
        picks.push(DEFAULT_TEMPLATES[3]);
    }

    if avg_mood < LOW_MOOD {
        picks.push(DEFAULT_TEMPLATES[5]);
        picks.push(DEFAULT_TEMPLATES[7]);
    } else if avg_mood < MODERATE_MOOD {
        picks.push(DEFAULT_TEMPLATES[0]);
        picks.push(DEFAULT_TEMPLATES[4]);
    } else {
        picks.push(DEFAULT_TEMPLATES[2]);
        picks.push(DEFAULT_TEMPLATES[9]);
    }

    picks.push(DEFAULT_TEMPLATES[8]);
    picks.truncate(MAX_FALLBACK);
    picks
}
