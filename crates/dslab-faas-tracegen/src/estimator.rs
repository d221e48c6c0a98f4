//! Recovery of lognormal parameters from (min, max, mean, sample size) summaries.
//!
//! The sample minimum and maximum are treated as the extreme order statistics of `n` lognormal draws, so in log
//! space they sit approximately at `mu -/+ z * sigma`, where `z` is the Blom plotting position of the largest of
//! `n` normal samples. The spread between them fixes `sigma = ln(max / min) / (2 * z)`, and the lognormal mean
//! identity `ln(mean) = mu + sigma^2 / 2` then fixes `mu`, so the fitted distribution reproduces the reported mean
//! exactly. How far the extremes land from `mu -/+ z * sigma` yields the standard errors of both parameters.
use crate::error::FitError;

/// Summary of a positive quantity as reported by the Azure trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: f64,
}

impl SummaryStats {
    pub fn new(min: f64, max: f64, mean: f64, count: f64) -> Self {
        Self { min, max, mean, count }
    }

    /// Shifts every statistic by one so that zero-valued summaries (idle functions, zero minimum) stay admissible.
    pub fn offset(&self) -> Self {
        Self {
            min: self.min + 1.,
            max: self.max + 1.,
            mean: self.mean + 1.,
            count: self.count + 1.,
        }
    }
}

/// Lognormal distribution recovered by [`estimate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FittedLognormal {
    /// Location parameter (mean of the underlying normal).
    pub mu: f64,
    /// Scale parameter (standard deviation of the underlying normal).
    pub sigma: f64,
    /// Standard error of `mu`.
    pub mu_error: f64,
    /// Standard error of `sigma`.
    pub sigma_error: f64,
}

impl FittedLognormal {
    pub fn mean(&self) -> f64 {
        (self.mu + self.sigma * self.sigma / 2.).exp()
    }

    pub fn median(&self) -> f64 {
        self.mu.exp()
    }
}

/// Quantile function of the standard normal distribution.
///
/// Uses Acklam's rational approximation, relative error below 1.2e-9 on (0, 1).
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0. {
        return f64::NEG_INFINITY;
    }
    if p >= 1. {
        return f64::INFINITY;
    }
    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.)
    };
    if p < P_LOW {
        tail((-2. * p.ln()).sqrt())
    } else if p <= 1. - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.)
    } else {
        -tail((-2. * (1. - p).ln()).sqrt())
    }
}

/// Expected standardized position of the largest of `n` normal samples (Blom's approximation).
fn extreme_position(n: f64) -> f64 {
    normal_quantile((n - 0.375) / (n + 0.25))
}

struct LogSystem {
    log_min: f64,
    log_max: f64,
    log_mean: f64,
    z: f64,
}

impl LogSystem {
    fn residuals(&self, mu: f64, sigma: f64) -> [f64; 3] {
        [
            mu - self.z * sigma - self.log_min,
            mu + self.z * sigma - self.log_max,
            mu + sigma * sigma / 2. - self.log_mean,
        ]
    }

    fn rss(&self, mu: f64, sigma: f64) -> f64 {
        self.residuals(mu, sigma).iter().map(|r| r * r).sum()
    }

    /// Returns (J^T J, det) for the Jacobian rows [1, -z], [1, z], [1, sigma].
    fn normal_matrix(&self, sigma: f64) -> ([[f64; 2]; 2], f64) {
        let m = [[3., sigma], [sigma, 2. * self.z * self.z + sigma * sigma]];
        let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        (m, det)
    }
}

fn validate(stats: &SummaryStats) -> Result<(), FitError> {
    for (name, value) in [("min", stats.min), ("max", stats.max), ("mean", stats.mean)] {
        // negated comparison also rejects NaN
        if !(value > 0.) {
            return Err(FitError::NonPositive { name, value });
        }
    }
    if !(stats.count >= 2.) {
        return Err(FitError::TooFewSamples(stats.count));
    }
    if stats.min >= stats.max {
        return Err(FitError::DegenerateRange {
            min: stats.min,
            max: stats.max,
        });
    }
    if stats.mean < stats.min || stats.mean > stats.max {
        return Err(FitError::MeanOutOfRange {
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
        });
    }
    Ok(())
}

/// Estimates lognormal parameters that best explain the given summary.
///
/// The statistics are used as given; callers that work with raw Azure statistics should apply
/// [`SummaryStats::offset`] first.
pub fn estimate(stats: &SummaryStats) -> Result<FittedLognormal, FitError> {
    validate(stats)?;
    let system = LogSystem {
        log_min: stats.min.ln(),
        log_max: stats.max.ln(),
        log_mean: stats.mean.ln(),
        z: extreme_position(stats.count),
    };
    if !(system.z > 0.) {
        return Err(FitError::TooFewSamples(stats.count));
    }
    let sigma = (system.log_max - system.log_min) / (2. * system.z);
    let mu = system.log_mean - sigma * sigma / 2.;
    if !mu.is_finite() || !sigma.is_finite() || sigma <= 0. {
        return Err(FitError::NonFinite { mu, sigma });
    }
    let rss = system.rss(mu, sigma);
    // three equations, two parameters: one degree of freedom for the residual variance
    let (m, det) = system.normal_matrix(sigma);
    let mu_error = (rss * m[1][1] / det).sqrt();
    let sigma_error = (rss * m[0][0] / det).sqrt();
    Ok(FittedLognormal {
        mu,
        sigma,
        mu_error,
        sigma_error,
    })
}
