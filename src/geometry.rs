// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Distance kernels, the standard-normal CDF, and Gaussian sampling.
//!
//! Everything in this module is pure computation over `f32` slices; the only
//! stateful input is the caller-supplied RNG for `gaussian`.

use rand::Rng;

/// Accuracy threshold below which a float is treated as zero.
pub const FLOAT_ZERO: f32 = 1e-6;

/// Euclidean (L2) distance between two points.
///
/// ## Input
/// - `a`, `b`: points of equal dimensionality
///
/// ## Output
/// - `sqrt(sum((a_i - b_i)^2))`
pub fn l2_dist(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut sum = 0.0f32;
    for i in 0..a.len() {
        let diff = a[i] - b[i];
        sum += diff * diff;
    }
    sum.sqrt()
}

/// Inner product of two points.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut sum = 0.0f32;
    for i in 0..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

/// Standard-normal cumulative distribution function.
///
/// Abramowitz & Stegun 26.2.17 rational approximation, absolute error below
/// 7.5e-8 over the working range (the derivation of the hashing parameters
/// only needs 1e-4).
///
/// ## Input
/// - `x`: evaluation point
///
/// ## Output
/// - `P(Z <= x)` for `Z ~ N(0, 1)`
pub fn normal_cdf(x: f32) -> f32 {
    if x < 0.0 {
        return 1.0 - normal_cdf(-x);
    }

    const B1: f64 = 0.319_381_530;
    const B2: f64 = -0.356_563_782;
    const B3: f64 = 1.781_477_937;
    const B4: f64 = -1.821_255_978;
    const B5: f64 = 1.330_274_429;
    const P: f64 = 0.231_641_9;

    let x = x as f64;
    let t = 1.0 / (1.0 + P * x);
    let poly = t * (B1 + t * (B2 + t * (B3 + t * (B4 + t * B5))));
    let pdf = (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();

    (1.0 - pdf * poly) as f32
}

/// Draw one standard-normal sample via the Box-Muller transform.
///
/// ## Input
/// - `rng`: uniform source; builders receive it from the caller so repeated
///   indexing with the same seed reproduces the same projections
///
/// ## Output
/// - one sample from `N(0, 1)`
pub fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    // u1 in (0, 1] keeps the log argument positive.
    let u1: f32 = 1.0 - rng.gen::<f32>();
    let u2: f32 = rng.gen();

    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
