//! Retrieval score correction and result formatting.
//!
//! The pgvector provider reports cosine matches as `1 / distance` instead of
//! a similarity. [`normalize_score`] inverts that back into a cosine
//! similarity mapped onto `[0, 1]`. It is only meaningful for scores from that
//! backend; [`VectorBackend`] carries the routing decision.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel for "no score available".
pub const NOT_AVAILABLE: &str = "N/A";

/// A score as reported by a vector backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    /// Non-numeric score text, including the `"N/A"` sentinel.
    Text(String),
    /// No score at all (`null`).
    Missing,
}

impl Score {
    pub fn not_available() -> Self {
        Score::Text(NOT_AVAILABLE.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for Score {
    fn from(n: f64) -> Self {
        Score::Number(n)
    }
}

impl From<&Value> for Score {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Score::Missing,
            Value::Number(n) => n.as_f64().map(Score::Number).unwrap_or(Score::Missing),
            Value::String(s) => Score::Text(s.clone()),
            other => Score::Text(other.to_string()),
        }
    }
}

/// Turn a `1 / distance` score into a `[0, 1]` cosine similarity.
///
/// - `"N/A"`, `null`, unparseable text and NaN are returned unchanged.
/// - `+inf` (zero distance) is `1.0`.
/// - Anything `<= 0` is `0.0`.
/// - Otherwise `similarity = 1 - 1/score`, clamped to `[-1, 1]`, then
///   mapped to `(similarity + 1) / 2`.
pub fn normalize_score(raw: &Score) -> Score {
    let value = match raw {
        Score::Missing => return Score::Missing,
        Score::Number(n) => *n,
        Score::Text(s) if s == NOT_AVAILABLE => return raw.clone(),
        Score::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) => return raw.clone(),
        },
    };

    match correct(value) {
        Some(corrected) => {
            if Some(corrected) != raw.as_f64() {
                tracing::debug!("Score corrected for pgvector: {:?} -> {}", raw, corrected);
            }
            Score::Number(corrected)
        }
        None => raw.clone(),
    }
}

/// The numeric core of [`normalize_score`]; `None` for NaN.
pub fn correct(score: f64) -> Option<f64> {
    if score.is_nan() {
        return None;
    }
    if score == f64::INFINITY {
        return Some(1.0);
    }
    if score <= 0.0 {
        return Some(0.0);
    }

    let distance = 1.0 / score;
    let similarity = (1.0 - distance).clamp(-1.0, 1.0);
    Some((similarity + 1.0) / 2.0)
}

/// The vector backend that produced a set of scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    /// Reports `1 / distance`; scores need correction.
    Pgvector,
    /// Anything else; scores pass through untouched.
    Other,
}

impl VectorBackend {
    pub fn from_provider(provider: &str) -> Self {
        if provider.trim().eq_ignore_ascii_case("pgvector") {
            VectorBackend::Pgvector
        } else {
            VectorBackend::Other
        }
    }

    pub fn apply(&self, raw: &Score) -> Score {
        match self {
            VectorBackend::Pgvector => normalize_score(raw),
            VectorBackend::Other => raw.clone(),
        }
    }
}

/// A chunk as returned from a retrieval query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: serde_json::Map<String, Value>,
}

/// A retrieved chunk paired with its raw and corrected scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    /// 1-based position in the result list.
    pub rank: usize,
    pub content: String,
    pub source_file_name: String,
    pub raw_score: Score,
    pub corrected_score: Score,
}

/// Pair retrieved chunks with their scores, correcting them for `backend`.
///
/// Chunks beyond the end of `scores` get the `"N/A"` sentinel.
pub fn format_results(
    chunks: &[RetrievedChunk],
    scores: &[Score],
    backend: VectorBackend,
) -> Vec<ScoredResult> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let raw_score = scores.get(i).cloned().unwrap_or_else(Score::not_available);
            let corrected_score = backend.apply(&raw_score);
            let source_file_name = chunk
                .metadata
                .get("file_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ScoredResult {
                rank: i + 1,
                content: chunk.content.clone(),
                source_file_name,
                raw_score,
                corrected_score,
            }
        })
        .collect()
}
