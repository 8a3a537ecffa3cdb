//! Layer 6 — `ProbabilityMathCore`: exact integer combinatorics and the
//! hypergeometric primitives every probability-bearing layer builds on.

use serde::{Deserialize, Serialize};

use crate::core::rounding::{clamp_k, round6_ratio};
use crate::model::layer::{LayerEnvelope, LayerStatus};

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "probability_math_core_v1";

/// A domain violation or internal impossibility in the math core. These are
/// programming-contract violations (bad layer inputs), never user-facing
/// pack-data problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathCoreError {
    InvalidInput,
    InternalError,
}

impl MathCoreError {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "PROBABILITY_MATH_CORE_V1_INVALID_INPUT",
            Self::InternalError => "PROBABILITY_MATH_CORE_V1_INTERNAL_ERROR",
        }
    }
}

/// Exact integer binomial coefficient `C(n, k)`. Zero when `k > n`, one when
/// `k == 0` or `k == n`. `n` up to 99 keeps every intermediate product well
/// within `u128` (the largest value, `C(99,49)`, is about `5.08e28`).
#[must_use]
pub fn comb(n: u32, k: u32) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    if k == 0 {
        return 1;
    }
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * u128::from(n - k + 1 + i) / u128::from(i + 1);
    }
    result
}

/// `1 - C(N-K, n) / C(N, n)`, computed as an exact rational and rounded to 6
/// decimals, clamped to `[0.0, 1.0]`.
///
/// # Errors
/// `MathCoreError::InvalidInput` when `K > N` or `n > N`.
pub fn hypergeom_p_ge_1(pop_n: u32, pop_k: u32, draw_n: u32) -> Result<f64, MathCoreError> {
    if pop_k > pop_n || draw_n > pop_n {
        return Err(MathCoreError::InvalidInput);
    }
    let total = comb(pop_n, draw_n);
    if total == 0 {
        return Err(MathCoreError::InternalError);
    }
    let failures = comb(pop_n - pop_k, draw_n);
    if failures > total {
        return Err(MathCoreError::InternalError);
    }
    let success_count = total - failures;
    Ok(clamp_k(round6_ratio(success_count, total), 1))
}

/// `Σ_{i=x}^{min(K,n)} C(K,i)·C(N−K,n−i) / C(N,n)`. `x = 0` is always `1.0`;
/// `x > min(K, n)` is always `0.0`.
///
/// # Errors
/// `MathCoreError::InvalidInput` when `K > N`, `n > N`, or `x > n`.
pub fn hypergeom_p_ge_x(pop_n: u32, pop_k: u32, draw_n: u32, x: u32) -> Result<f64, MathCoreError> {
    if pop_k > pop_n || draw_n > pop_n || x > draw_n {
        return Err(MathCoreError::InvalidInput);
    }
    if x == 0 {
        return Ok(1.0);
    }
    let upper = pop_k.min(draw_n);
    if x > upper {
        return Ok(0.0);
    }
    let total = comb(pop_n, draw_n);
    if total == 0 {
        return Err(MathCoreError::InternalError);
    }
    let mut numerator: u128 = 0;
    for i in x..=upper {
        numerator += comb(pop_k, i) * comb(pop_n - pop_k, draw_n - i);
    }
    Ok(clamp_k(round6_ratio(numerator, total), 1))
}

/// One substitution bucket's `(effective_K, K_int)` pair, as validated
/// against the `K_int = floor(clamp(effective_K, 0, N))` policy.
#[derive(Debug, Clone, Copy)]
pub struct KIntCheck {
    pub bucket_id_index: usize,
    pub effective_k: f64,
    pub k_int: u32,
}

/// This layer's body: the list of substitution buckets it validated the
/// `K_int` policy for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub bucket_ids_validated: Vec<String>,
}

/// Validate `K_int = floor(clamp(effective_K, 0, N))` for every substitution
/// bucket, emitting `PROBABILITY_MATH_K_INT_POLICY_VIOLATION` on the first
/// mismatch.
#[must_use]
pub fn validate_k_int_policy(buckets: &[(&str, f64, u32)], deck_size: u32) -> LayerEnvelope<Body> {
    let mut bucket_ids_validated = Vec::with_capacity(buckets.len());
    for (bucket_id, effective_k, k_int) in buckets {
        let expected = crate::core::rounding::k_int(*effective_k, deck_size);
        if expected != *k_int {
            return LayerEnvelope::new(
                VERSION,
                LayerStatus::Error,
                Some("PROBABILITY_MATH_K_INT_POLICY_VIOLATION".to_string()),
                vec!["PROBABILITY_MATH_K_INT_POLICY_VIOLATION".to_string()],
                Body {
                    bucket_ids_validated,
                },
            );
        }
        bucket_ids_validated.push((*bucket_id).to_string());
    }
    LayerEnvelope::new(VERSION, LayerStatus::Ok, None, vec![], Body { bucket_ids_validated })
}

#[cfg(test)]
mod tests {
    use super::{comb, hypergeom_p_ge_1, hypergeom_p_ge_x, validate_k_int_policy};
    use crate::model::layer::LayerStatus;

    #[test]
    fn comb_symmetry_and_sum_identity() {
        for n in 0..=12u32 {
            let mut sum: u128 = 0;
            for k in 0..=n {
                assert_eq!(comb(n, k), comb(n, n - k));
                sum += comb(n, k);
            }
            assert_eq!(sum, 1u128 << n);
        }
    }

    #[test]
    fn comb_zero_outside_domain() {
        assert_eq!(comb(5, 6), 0);
        assert_eq!(comb(5, 0), 1);
        assert_eq!(comb(5, 5), 1);
    }

    #[test]
    fn s2_scenario_matches_reference_value() {
        // K_int=30, n_int=7 over N=99: 1 - C(69,7)/C(99,7), rounded.
        let value = hypergeom_p_ge_1(99, 30, 7).unwrap();
        assert!((value - 0.929_537).abs() < 1e-9);
    }

    #[test]
    fn s3_scenario_matches_reference_value() {
        // K_int=10 (after wipe), n_int=7 over N=99.
        let value = hypergeom_p_ge_1(99, 10, 7).unwrap();
        assert!((value - 0.530_612).abs() < 1e-9);
    }

    #[test]
    fn boundary_k_zero_is_zero() {
        assert_eq!(hypergeom_p_ge_1(99, 0, 7).unwrap(), 0.0);
    }

    #[test]
    fn boundary_k_at_population_is_one_when_drawing() {
        assert_eq!(hypergeom_p_ge_1(99, 99, 7).unwrap(), 1.0);
    }

    #[test]
    fn boundary_n_zero_is_zero() {
        assert_eq!(hypergeom_p_ge_1(99, 30, 0).unwrap(), 0.0);
    }

    #[test]
    fn hypergeom_p_ge_x_boundary_cases() {
        assert_eq!(hypergeom_p_ge_x(99, 30, 7, 0).unwrap(), 1.0);
        assert_eq!(hypergeom_p_ge_x(99, 5, 7, 6).unwrap(), 0.0);
    }

    #[test]
    fn invalid_domain_rejected() {
        assert!(hypergeom_p_ge_1(99, 100, 7).is_err());
        assert!(hypergeom_p_ge_1(99, 30, 100).is_err());
        assert!(hypergeom_p_ge_x(99, 30, 7, 8).is_err());
    }

    #[test]
    fn k_int_policy_violation_is_detected() {
        let buckets = [("RAMP", 30.4, 31)];
        let envelope = validate_k_int_policy(&buckets, 99);
        assert_eq!(envelope.status, LayerStatus::Error);
        assert!(envelope.codes.contains(&"PROBABILITY_MATH_K_INT_POLICY_VIOLATION".to_string()));
    }

    #[test]
    fn k_int_policy_pass_is_ok() {
        let buckets = [("RAMP", 30.4, 30)];
        let envelope = validate_k_int_policy(&buckets, 99);
        assert_eq!(envelope.status, LayerStatus::Ok);
    }
}
