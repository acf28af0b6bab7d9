// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted rubric scoring of a learner's recent transcript.
//!
//! One generation call returns a 1-4 score and rationale per criterion. The
//! response is parsed leniently: criteria the model skipped get the
//! configured default score instead of failing the whole assessment. The
//! weighting and classification arithmetic is pure and tested on its own.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use stepwise_config::model::RubricConfig;
use stepwise_core::types::{GenerationRequest, Message, RubricCriterion};
use stepwise_core::{RubricRepository, StepwiseError, TextGeneration};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::generation::{complete_within, strip_code_fences};
use crate::prompts::{RUBRIC_SYSTEM_PROMPT, rubric_prompt};

/// Lowest and highest score on the rubric scale.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 4;

/// Rationale recorded for a criterion the assessment did not cover.
pub const DEFAULT_RATIONALE: &str = "Not covered by the assessment; default score applied.";

const MAX_SUGGESTIONS: usize = 5;

/// Absorbs float noise at the band edges.
const BAND_EPSILON: f64 = 1e-9;

/// Readiness band of an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReadinessKind {
    NotReady,
    AlmostReady,
    Ready,
}

/// Score of one criterion after merging the model output with the rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub name: String,
    pub weight: f64,
    pub score: u8,
    pub rationale: String,
    /// True when the assessment omitted this criterion.
    pub defaulted: bool,
}

/// A completed rubric assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricAssessment {
    pub criteria: Vec<CriterionResult>,
    pub overall: f64,
    pub threshold: f64,
    pub kind: ReadinessKind,
    pub suggestions: Vec<String>,
}

impl RubricAssessment {
    /// Overall score mapped from the 1-4 scale onto [0, 1].
    pub fn confidence(&self) -> f64 {
        score_confidence(self.overall)
    }
}

/// Result of asking the scorer about a (room, mode) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum RubricOutcome {
    /// No criteria are configured; the caller must use its fallback.
    NoRubric,
    Assessed(RubricAssessment),
}

/// Model output as parsed. Every field tolerates nulls and wrong types so
/// one bad field never discards the usable scores next to it.
#[derive(Debug, Default, Deserialize)]
struct RawAssessment {
    #[serde(default, deserialize_with = "lenient_criteria")]
    criteria: Vec<RawCriterion>,
    #[serde(default, deserialize_with = "lenient_strings")]
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawCriterion {
    #[serde(default)]
    name: Value,
    #[serde(default)]
    score: Value,
    #[serde(default)]
    rationale: Value,
}

impl RawCriterion {
    fn name(&self) -> &str {
        self.name.as_str().unwrap_or_default()
    }

    fn rationale(&self) -> Option<&str> {
        self.rationale.as_str()
    }
}

/// Array entries that are not criterion objects are skipped.
fn lenient_criteria<'de, D>(deserializer: D) -> Result<Vec<RawCriterion>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Keeps the string entries of an array; anything else yields no suggestions.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

/// Scores transcripts against the rubric configured for a (room, mode).
pub struct RubricScorer {
    rubrics: Arc<dyn RubricRepository>,
    generator: Arc<dyn TextGeneration>,
    config: RubricConfig,
    timeout: Duration,
}

impl RubricScorer {
    pub fn new(
        rubrics: Arc<dyn RubricRepository>,
        generator: Arc<dyn TextGeneration>,
        config: &RubricConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            rubrics,
            generator,
            config: config.clone(),
            timeout,
        }
    }

    /// Number of recent messages an assessment looks at.
    pub fn transcript_turns(&self) -> usize {
        self.config.transcript_turns
    }

    /// Readiness threshold for the pair, falling back to the configured default.
    pub async fn threshold_for(&self, room_id: &str, mode: &str) -> f64 {
        match self.rubrics.threshold_for(room_id, mode).await {
            Ok(Some(threshold)) => threshold,
            Ok(None) => self.config.default_threshold,
            Err(e) => {
                warn!(room_id, mode, error = %e, "threshold lookup failed, using default");
                self.config.default_threshold
            }
        }
    }

    /// Assess `transcript` (most recent messages, oldest first).
    ///
    /// Only the last `transcript_turns` messages are sent.
    pub async fn assess(
        &self,
        room_id: &str,
        mode: &str,
        transcript: &[Message],
    ) -> Result<RubricOutcome, StepwiseError> {
        let criteria = self.rubrics.criteria_for(room_id, mode).await?;
        if criteria.is_empty() {
            debug!(room_id, mode, "no rubric configured");
            return Ok(RubricOutcome::NoRubric);
        }

        let tail_start = transcript.len().saturating_sub(self.config.transcript_turns);
        let request = GenerationRequest {
            prompt: rubric_prompt(&criteria, &transcript[tail_start..]),
            system_prompt: RUBRIC_SYSTEM_PROMPT.to_string(),
            max_tokens: self.config.max_tokens,
        };
        let response = complete_within(self.generator.as_ref(), request, self.timeout).await?;
        if response.truncated {
            warn!(room_id, mode, "rubric assessment truncated at max_tokens");
        }

        let raw = parse_assessment(&response.text)?;
        let results = merge_scores(&criteria, &raw, self.config.default_score);
        let defaulted = results.iter().filter(|r| r.defaulted).count();
        if defaulted > 0 {
            warn!(room_id, mode, defaulted, "assessment omitted criteria, defaults applied");
        }

        let threshold = self.threshold_for(room_id, mode).await;
        let overall = weighted_overall(&results);
        let kind = classify(overall, threshold, self.config.margin);
        debug!(room_id, mode, overall, threshold, kind = %kind, "rubric assessed");

        Ok(RubricOutcome::Assessed(RubricAssessment {
            criteria: results,
            overall,
            threshold,
            kind,
            suggestions: clean_suggestions(raw.suggestions),
        }))
    }
}

/// `Σ(weight × score) / Σ(weight)`; an all-zero weighting falls back to the plain mean.
pub fn weighted_overall(results: &[CriterionResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let total_weight: f64 = results.iter().map(|r| r.weight.max(0.0)).sum();
    if total_weight <= 0.0 {
        let sum: f64 = results.iter().map(|r| f64::from(r.score)).sum();
        return sum / results.len() as f64;
    }
    results
        .iter()
        .map(|r| r.weight.max(0.0) * f64::from(r.score))
        .sum::<f64>()
        / total_weight
}

/// Band `overall` around `threshold`. The lower edge of each band is inclusive.
pub fn classify(overall: f64, threshold: f64, margin: f64) -> ReadinessKind {
    if overall >= threshold + margin - BAND_EPSILON {
        ReadinessKind::Ready
    } else if overall >= threshold - margin - BAND_EPSILON {
        ReadinessKind::AlmostReady
    } else {
        ReadinessKind::NotReady
    }
}

/// Map a 1-4 score onto [0, 1].
pub fn score_confidence(overall: f64) -> f64 {
    let span = f64::from(MAX_SCORE - MIN_SCORE);
    ((overall - f64::from(MIN_SCORE)) / span).clamp(0.0, 1.0)
}

/// Parse the first JSON object in the output, ignoring any prose around it.
fn parse_assessment(text: &str) -> Result<RawAssessment, StepwiseError> {
    let body = strip_code_fences(text);
    let Some(start) = body.find('{') else {
        return Err(StepwiseError::MalformedOutput(
            "assessment contains no JSON object".to_string(),
        ));
    };
    match serde_json::Deserializer::from_str(&body[start..])
        .into_iter::<RawAssessment>()
        .next()
    {
        Some(Ok(raw)) => Ok(raw),
        Some(Err(e)) => Err(StepwiseError::MalformedOutput(format!(
            "assessment is not valid JSON: {e}"
        ))),
        None => Err(StepwiseError::MalformedOutput(
            "assessment contains no JSON object".to_string(),
        )),
    }
}

fn raw_score(value: &Value) -> Option<u8> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !score.is_finite() {
        return None;
    }
    Some(score.round().clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8)
}

fn merge_scores(
    criteria: &[RubricCriterion],
    raw: &RawAssessment,
    default_score: u8,
) -> Vec<CriterionResult> {
    criteria
        .iter()
        .map(|criterion| {
            let matched = raw
                .criteria
                .iter()
                .find(|r| r.name().trim().eq_ignore_ascii_case(criterion.name.trim()))
                .and_then(|r| raw_score(&r.score).map(|score| (score, r.rationale())));

            match matched {
                Some((score, rationale)) => CriterionResult {
                    name: criterion.name.clone(),
                    weight: criterion.weight,
                    score,
                    rationale: rationale
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .unwrap_or(DEFAULT_RATIONALE)
                        .to_string(),
                    defaulted: false,
                },
                None => CriterionResult {
                    name: criterion.name.clone(),
                    weight: criterion.weight,
                    score: default_score.clamp(MIN_SCORE, MAX_SCORE),
                    rationale: DEFAULT_RATIONALE.to_string(),
                    defaulted: true,
                },
            }
        })
        .collect()
}

fn clean_suggestions(suggestions: Vec<String>) -> Vec<String> {
    suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect()
}
