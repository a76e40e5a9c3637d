//! Vector normalization and the deterministic synthetic fallback.
//!
//! Two interchangeable normalization conventions are supported: unit-L2
//! (cosine similarity reduces to a dot product) and per-vector min-max
//! (components rescaled into `[0, 1]`, used when the consumer computes an
//! explicit cosine). Both are total functions: degenerate inputs map to
//! defined outputs, never errors.
//!
//! [`synthetic_embedding`] keeps the pipeline operable when the real
//! embedding service is down. It is a pure function of the text (a
//! character-trigram hash expansion), so repeated builds stay reproducible,
//! at the cost of degraded retrieval quality.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Rescales a vector to unit Euclidean norm.
///
/// A zero vector has no direction; it is returned unchanged rather than
/// treated as an error.
pub fn normalize_l2(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

/// Rescales every component into `[0, 1]` relative to the vector's own
/// minimum and maximum.
///
/// A constant vector (max equals min) maps to all zeros.
pub fn normalize_min_max(vector: &[f32]) -> Vec<f32> {
    let Some(&first) = vector.first() else {
        return Vec::new();
    };
    let (min, max) = vector.iter().fold((first, first), |(min, max), &v| {
        (min.min(v), max.max(v))
    });
    let range = max - min;
    if range == 0.0 {
        return vec![0.0; vector.len()];
    }
    vector.iter().map(|v| (v - min) / range).collect()
}

/// Deterministic, provider-independent fallback embedding.
///
/// Character unigrams and trigrams of the lower-cased text are hashed into
/// `dimensions` buckets, each contributing a weight derived from its hash.
/// Identical text yields bit-identical vectors; different texts diverge with
/// high probability. This is not a semantic embedding; it approximates
/// lexical overlap only.
pub fn synthetic_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    if dimensions == 0 {
        return Vec::new();
    }
    let mut vector = vec![0.0f32; dimensions];
    let chars: Vec<char> = text.to_lowercase().chars().collect();

    for &c in &chars {
        accumulate(&mut vector, &[c]);
    }
    for window in chars.windows(3) {
        accumulate(&mut vector, window);
    }
    vector
}

fn accumulate(vector: &mut [f32], feature: &[char]) {
    // DefaultHasher starts from fixed keys, so bucketing is stable across
    // runs and processes.
    let mut hasher = DefaultHasher::new();
    feature.hash(&mut hasher);
    let hash = hasher.finish();
    let bucket = (hash % vector.len() as u64) as usize;
    vector[bucket] += 1.0 + ((hash >> 32) as u32 as f32) / u32::MAX as f32;
}
