//! Maximal Marginal Relevance (MMR) selection.
//!
//! MMR picks results one at a time, trading relevance to the query against
//! redundancy with what has already been picked:
//!
//! ```text
//! MMR(d) = λ × sim(query, d) - (1 - λ) × max sim(d, selected)
//! ```
//!
//! λ = 1.0 is plain similarity ranking, λ = 0.0 is pure diversity. The first
//! pick is always the candidate most similar to the query.

use serde::{Deserialize, Serialize};

use lexsen_embeddings::{Result, cosine_similarity};

/// MMR search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MmrConfig {
    /// Number of results to return.
    pub k: usize,

    /// Number of nearest neighbours considered before diversification.
    pub fetch_k: usize,

    /// Lambda: 0.0 = pure diversity, 1.0 = pure relevance.
    pub lambda: f32,
}

impl Default for MmrConfig {
    fn default() -> Self {
        Self {
            k: 2,
            fetch_k: 20,
            lambda: 0.5,
        }
    }
}

impl MmrConfig {
    /// Set the number of results.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the candidate pool size.
    pub fn with_fetch_k(mut self, fetch_k: usize) -> Self {
        self.fetch_k = fetch_k;
        self
    }

    /// Set lambda (clamped to 0.0-1.0).
    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }
}

/// Select up to `k` candidates by MMR.
///
/// Returns positions into `candidates` in selection order.
pub fn mmr_select(
    query: &[f32],
    candidates: &[&[f32]],
    k: usize,
    lambda: f32,
) -> Result<Vec<usize>> {
    if candidates.is_empty() || k == 0 {
        return Ok(Vec::new());
    }

    let k = k.min(candidates.len());

    let relevance = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect::<Result<Vec<f32>>>()?;

    // Highest similarity of each candidate to anything already selected.
    let mut redundancy = vec![f32::NEG_INFINITY; candidates.len()];
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected = Vec::with_capacity(k);

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let score = if selected.is_empty() {
                relevance[idx]
            } else {
                lambda * relevance[idx] - (1.0 - lambda) * redundancy[idx]
            };
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        let chosen = remaining.remove(best_pos);
        selected.push(chosen);

        for &idx in &remaining {
            let sim = cosine_similarity(candidates[idx], candidates[chosen])?;
            if sim > redundancy[idx] {
                redundancy[idx] = sim;
            }
        }
    }

    Ok(selected)
}
