//! Small numerical helpers shared by the tracker and the fusion engine.
//!
//! None of these return NaN: empty or degenerate input falls back to a
//! documented value.

use num::Float;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);
    T::from(values.len()).map(|n| sum / n)
}

/// `Σ(value·weight) / Σ(weight)`, falling back to the unweighted mean when
/// the weights sum to zero. `None` for an empty slice.
pub fn weighted_mean<T: Float>(values: &[T], weights: &[T]) -> Option<T> {
    debug_assert_eq!(values.len(), weights.len());
    if values.is_empty() {
        return None;
    }
    let total_weight = weights.iter().fold(T::zero(), |acc, &w| acc + w);
    if total_weight > T::zero() {
        let total = values
            .iter()
            .zip(weights.iter())
            .fold(T::zero(), |acc, (&v, &w)| acc + v * w);
        Some(total / total_weight)
    } else {
        mean(values)
    }
}

/// Sample standard deviation (n − 1 denominator); 0 for fewer than 2 values.
pub fn sample_std<T: Float>(values: &[T]) -> T {
    if values.len() < 2 {
        return T::zero();
    }
    spread(values, values.len() - 1)
}

/// Population standard deviation (n denominator); 0 for an empty slice.
pub fn population_std<T: Float>(values: &[T]) -> T {
    if values.is_empty() {
        return T::zero();
    }
    spread(values, values.len())
}

fn spread<T: Float>(values: &[T], dof: usize) -> T {
    let m = match mean(values) {
        Some(m) => m,
        None => return T::zero(),
    };
    let ss = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - m) * (v - m));
    match T::from(dof) {
        Some(d) if d > T::zero() => {
            let var = ss / d;
            if var.is_finite() && var > T::zero() {
                var.sqrt()
            } else {
                T::zero()
            }
        }
        _ => T::zero(),
    }
}
