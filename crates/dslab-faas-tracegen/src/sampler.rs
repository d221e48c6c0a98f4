//! Generators of synthetic per-minute trace columns.
use std::boxed::Box;

use rand::distributions::Distribution;
use rand::RngCore;
use rand_distr::LogNormal;

use crate::ecdf::Ecdf;
use crate::error::FitError;
use crate::estimator::FittedLognormal;

/// Type erased version of rand::Distribution trait.
pub trait ErasedDistribution<T> {
    /// Generate a random value of T, using rng as the source of randomness.
    fn sample(&self, rng: &mut dyn RngCore) -> T;
}

impl<T, D: Distribution<T> + ?Sized> ErasedDistribution<T> for D {
    fn sample(&self, rng: &mut dyn RngCore) -> T {
        <Self as Distribution<T>>::sample(self, rng)
    }
}

/// Floors negative (and NaN) samples at zero.
pub fn non_negative(x: f64) -> f64 {
    if x > 0. {
        x
    } else {
        0.
    }
}

/// Source of values for one trace column.
pub enum ColumnGenerator {
    /// Independent draws from a distribution.
    Random(Box<dyn ErasedDistribution<f64>>),
    /// Observed values, copied verbatim.
    Literal(Vec<f64>),
    /// The same value in every row.
    Constant(f64),
}

impl ColumnGenerator {
    pub fn lognormal(fit: &FittedLognormal) -> Result<Self, FitError> {
        let dist = LogNormal::new(fit.mu, fit.sigma).map_err(|_| FitError::NonFinite {
            mu: fit.mu,
            sigma: fit.sigma,
        })?;
        Ok(Self::Random(Box::new(dist)))
    }

    pub fn empirical(ecdf: Ecdf) -> Self {
        Self::Random(Box::new(ecdf))
    }

    /// Produces `n` non-negative values.
    ///
    /// [`ColumnGenerator::Literal`] yields its values as they are, whatever their count, so that length problems
    /// surface when the column is assembled into a trace.
    pub fn generate(&self, n: usize, rng: &mut dyn RngCore) -> Vec<f64> {
        match self {
            ColumnGenerator::Random(dist) => (0..n).map(|_| non_negative(dist.sample(rng))).collect(),
            ColumnGenerator::Literal(values) => values.iter().copied().map(non_negative).collect(),
            ColumnGenerator::Constant(value) => vec![non_negative(*value); n],
        }
    }
}

/// Draws `n` values from the fitted lognormal.
pub fn sample_lognormal(fit: &FittedLognormal, n: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>, FitError> {
    Ok(ColumnGenerator::lognormal(fit)?.generate(n, rng))
}

/// Draws `n` values from the empirical distribution via its interpolated inverse.
pub fn sample_empirical(ecdf: &Ecdf, n: usize, rng: &mut dyn RngCore) -> Vec<f64> {
    (0..n)
        .map(|_| non_negative(<Ecdf as Distribution<f64>>::sample(ecdf, rng)))
        .collect()
}
