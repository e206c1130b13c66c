use super::registry::{IdentityRegistry, Metadata};
use crate::{config::IdentityConfig, detection::Detection};
use serde::{Deserialize, Serialize};

/// Cosine similarity between two embeddings.
///
/// Symmetric. Returns 0.0 when either vector has zero norm or the lengths
/// differ, so callers never see NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let similarity = (dot / denom) as f32;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Accepted match against the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityMatch {
    pub identity_id: String,
    pub similarity: f32,
    pub metadata: Metadata,
}

/// Identification attached to a detection by [`IdentityMatcher::identify_batch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub identity_id: Option<String>,
    /// 0.0 when unmatched.
    pub similarity: f32,
    /// Empty when unmatched.
    pub metadata: Metadata,
}

impl From<Option<IdentityMatch>> for Identification {
    fn from(found: Option<IdentityMatch>) -> Self {
        match found {
            Some(m) => Self {
                identity_id: Some(m.identity_id),
                similarity: m.similarity,
                metadata: m.metadata,
            },
            None => Self::default(),
        }
    }
}

/*-----------------------------------------------------------------------------
IdentityMatcher
-----------------------------------------------------------------------------*/

#[derive(Debug, Clone)]
pub struct IdentityMatcher {
    match_threshold: f32,
    suggestion_threshold: f32,
}

impl Default for IdentityMatcher {
    fn default() -> Self {
        Self::new(0.7, 0.5)
    }
}

impl IdentityMatcher {
    pub fn new(match_threshold: f32, suggestion_threshold: f32) -> Self {
        Self {
            match_threshold,
            suggestion_threshold,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.match_threshold, config.suggestion_threshold)
    }

    pub fn match_threshold(&self) -> f32 {
        self.match_threshold
    }

    pub fn suggestion_threshold(&self) -> f32 {
        self.suggestion_threshold
    }

    /// Best registered identity for `embedding`, if it reaches the match
    /// threshold. Entries without an embedding are skipped.
    pub fn match_embedding(
        &self,
        registry: &IdentityRegistry,
        embedding: &[f32],
    ) -> Option<IdentityMatch> {
        self.best_above(registry, embedding, self.match_threshold, |_| true)
    }

    /// Identify every detection independently and attach the result.
    /// Detections without an embedding are marked unidentified.
    pub fn identify_batch(
        &self,
        registry: &IdentityRegistry,
        detections: &mut [Detection],
    ) {
        for detection in detections.iter_mut() {
            let found = detection
                .embedding
                .as_deref()
                .and_then(|embedding| self.match_embedding(registry, embedding));
            detection.identity = Some(Identification::from(found));
        }
    }

    /// Relaxed matching against a caller-chosen subset of identities, for
    /// human-assisted identification after automatic matching failed.
    pub fn suggest<S: AsRef<str>>(
        &self,
        registry: &IdentityRegistry,
        embedding: &[f32],
        candidates: &[S],
    ) -> Option<IdentityMatch> {
        self.best_above(registry, embedding, self.suggestion_threshold, |id| {
            candidates.iter().any(|c| c.as_ref() == id)
        })
    }

    fn best_above<P>(
        &self,
        registry: &IdentityRegistry,
        embedding: &[f32],
        threshold: f32,
        allowed: P,
    ) -> Option<IdentityMatch>
    where
        P: Fn(&str) -> bool,
    {
        let mut best: Option<IdentityMatch> = None;
        registry.for_each_embedding(|entry, reference| {
            if !allowed(&entry.identity_id) {
                return;
            }
            let similarity = cosine_similarity(embedding, reference);
            // equal similarity resolves to the smallest id
            let better = match &best {
                None => true,
                Some(b) => {
                    similarity > b.similarity
                        || (similarity == b.similarity
                            && entry.identity_id < b.identity_id)
                }
            };
            if better {
                best = Some(IdentityMatch {
                    identity_id: entry.identity_id.clone(),
                    similarity,
                    metadata: entry.metadata.clone(),
                });
            }
        });

        let best = best.filter(|b| b.similarity >= threshold);
        log::trace!(
            "identity match (threshold {}): {:?}",
            threshold,
            best.as_ref().map(|b| (&b.identity_id, b.similarity))
        );
        best
    }
}
