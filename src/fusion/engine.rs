//! Multi-modal weight fusion.
//!
//! Candidates from the modalities of one detection are combined with a
//! confidence- and prior-weighted mean. The spread of the candidates around
//! the fused value gives the 95% interval; a lone candidate has no spread and
//! gets its interval from the per-class calibration instead.

use super::{
    calibration::{Calibrator, Interval, Z_95},
    stats,
};
use crate::{
    config::FusionConfig,
    modality::{Modality, ModalityCandidates, WeightCandidate},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    Ensemble,
    Single,
}

/// What one modality put into the fused value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub weight_kg: f32,
    pub confidence: f32,
    /// Fraction of the fused value this modality accounts for.
    pub share: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedEstimate {
    pub weight_kg: f32,
    pub confidence: f32,
    pub interval: Interval,
    pub std_dev: f32,
    pub contributions: BTreeMap<Modality, Contribution>,
    /// Normalised priors of the modalities that took part.
    pub mixing_weights: BTreeMap<Modality, f32>,
    pub method: FusionMethod,
}

impl FusedEstimate {
    pub fn as_candidate(&self) -> WeightCandidate {
        WeightCandidate::new(self.weight_kg, self.confidence)
    }
}

/*-----------------------------------------------------------------------------
FusionEngine
-----------------------------------------------------------------------------*/

#[derive(Debug, Clone)]
pub struct FusionEngine {
    priors: BTreeMap<Modality, f32>,
    calibrator: Calibrator,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::from_config(&FusionConfig::default())
    }
}

impl FusionEngine {
    pub fn new(priors: BTreeMap<Modality, f32>, calibrator: Calibrator) -> Self {
        Self { priors, calibrator }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(config.priors.clone(), Calibrator::new(config.mae.clone()))
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Fuse same-frame candidates. `None` when no configured modality is
    /// present, which is distinct from a zero-confidence estimate.
    pub fn fuse(&self, candidates: &ModalityCandidates) -> Option<FusedEstimate> {
        let present = self.restrict(candidates);
        if present.is_empty() {
            return None;
        }

        let priors = normalize_priors(&present);
        let mixing_weights: BTreeMap<Modality, f32> = present
            .iter()
            .zip(priors.iter())
            .map(|((m, _, _), p)| (*m, *p))
            .collect();

        if present.len() == 1 {
            let (modality, candidate, _) = present[0];
            let contributions = BTreeMap::from([(
                modality,
                Contribution {
                    weight_kg: candidate.weight_kg,
                    confidence: candidate.confidence,
                    share: 1.0,
                },
            )]);
            return Some(FusedEstimate {
                weight_kg: candidate.weight_kg,
                confidence: candidate.confidence,
                interval: self
                    .calibrator
                    .interval(candidate.weight_kg, candidate.confidence),
                std_dev: 0.0,
                contributions,
                mixing_weights,
                method: FusionMethod::Single,
            });
        }

        let weights: Vec<f32> = present.iter().map(|(_, c, _)| c.weight_kg).collect();
        let confs: Vec<f32> = present.iter().map(|(_, c, _)| c.confidence).collect();

        let denom: f32 = confs.iter().zip(priors.iter()).map(|(c, p)| c * p).sum();
        let prior_sum: f32 = priors.iter().sum();

        let (weight_kg, confidence) = if denom > 0.0 {
            let numer: f32 = weights
                .iter()
                .zip(confs.iter())
                .zip(priors.iter())
                .map(|((w, c), p)| w * c * p)
                .sum();
            (numer / denom, denom / prior_sum)
        } else {
            let w: f32 = weights.iter().zip(priors.iter()).map(|(w, p)| w * p).sum();
            (w, stats::mean(&confs).unwrap_or(0.0))
        };

        let mut variance = if denom > 0.0 {
            weights
                .iter()
                .zip(confs.iter())
                .zip(priors.iter())
                .map(|((w, c), p)| p * c * (w - weight_kg).powi(2))
                .sum::<f32>()
                / denom
        } else {
            f32::NAN
        };
        if !(variance.is_finite() && variance > 0.0) {
            variance = stats::population_std(&weights).powi(2);
        }
        let std_dev = variance.sqrt();

        let contributions = present
            .iter()
            .zip(priors.iter())
            .map(|((m, c, _), p)| {
                let share = if denom > 0.0 { c.confidence * p / denom } else { *p };
                (
                    *m,
                    Contribution {
                        weight_kg: c.weight_kg,
                        confidence: c.confidence,
                        share,
                    },
                )
            })
            .collect();

        Some(FusedEstimate {
            weight_kg,
            confidence,
            interval: Interval::around(weight_kg, Z_95 * std_dev),
            std_dev,
            contributions,
            mixing_weights,
            method: FusionMethod::Ensemble,
        })
    }

    /// Highest-confidence configured candidate, with the same sanitising as
    /// [`FusionEngine::fuse`]. Ties go to the earlier modality.
    pub fn best_single(
        &self,
        candidates: &ModalityCandidates,
    ) -> Option<(Modality, WeightCandidate)> {
        self.restrict(candidates)
            .into_iter()
            .fold(None, |best: Option<(Modality, WeightCandidate)>, (m, c, _)| match best {
                Some((_, b)) if b.confidence >= c.confidence => best,
                _ => Some((m, c)),
            })
    }

    /// Coefficient of variation of the raw weights, clamped to [0, 1].
    ///
    /// 0.5 when fewer than two modalities are present, 1.0 when the mean is 0.
    pub fn uncertainty(&self, candidates: &ModalityCandidates) -> f32 {
        let weights: Vec<f32> = candidates
            .values()
            .map(|c| c.weight_kg)
            .filter(|w| w.is_finite())
            .collect();
        if weights.len() < 2 {
            return 0.5;
        }
        let mean = stats::mean(&weights).unwrap_or(0.0);
        if mean == 0.0 {
            return 1.0;
        }
        (stats::population_std(&weights) / mean).clamp(0.0, 1.0)
    }

    /// Configured modalities present in the input, in enumeration order,
    /// with sanitised confidences and their raw priors.
    fn restrict(&self, candidates: &ModalityCandidates) -> Vec<(Modality, WeightCandidate, f32)> {
        Modality::ALL
            .iter()
            .filter_map(|m| {
                let prior = *self.priors.get(m)?;
                let candidate = candidates.get(m)?;
                if !candidate.weight_kg.is_finite() {
                    log::warn!("ignoring non-finite {} weight candidate", m);
                    return None;
                }
                let confidence = if candidate.confidence.is_finite() {
                    candidate.confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Some((*m, WeightCandidate::new(candidate.weight_kg, confidence), prior))
            })
            .collect()
    }
}

fn normalize_priors(present: &[(Modality, WeightCandidate, f32)]) -> Vec<f32> {
    let sum: f32 = present.iter().map(|(_, _, p)| p.max(0.0)).sum();
    if sum > 0.0 && sum.is_finite() {
        present.iter().map(|(_, _, p)| p.max(0.0) / sum).collect()
    } else {
        log::warn!(
            "priors of {} present modalities sum to {}, mixing uniformly",
            present.len(),
            sum
        );
        let uniform = 1.0 / present.len() as f32;
        vec![uniform; present.len()]
    }
}
