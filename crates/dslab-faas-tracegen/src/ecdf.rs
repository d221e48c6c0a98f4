//! Empirical cumulative distribution function for inverse-transform resampling.
use rand::distributions::Distribution;
use rand::Rng;

/// Step function over sorted unique sample values. Tied samples collapse into one step carrying their summed mass.
#[derive(Clone, Debug, PartialEq)]
pub struct Ecdf {
    values: Vec<f64>,
    cumulative: Vec<f64>,
}

impl Ecdf {
    /// Builds the ECDF of the finite values in `samples`. Returns `None` if there are none.
    pub fn new(samples: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|x| x.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let total = sorted.len() as f64;
        let mut values = Vec::new();
        let mut cumulative = Vec::new();
        for (i, x) in sorted.iter().enumerate() {
            if values.last() == Some(x) {
                let last = cumulative.len() - 1;
                cumulative[last] = (i + 1) as f64 / total;
            } else {
                values.push(*x);
                cumulative.push((i + 1) as f64 / total);
            }
        }
        Some(Self { values, cumulative })
    }

    /// Distinct sample values in increasing order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Cumulative probability at each distinct value.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Fraction of samples less than or equal to `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        let idx = self.values.partition_point(|v| *v <= x);
        if idx == 0 {
            0.
        } else {
            self.cumulative[idx - 1]
        }
    }

    /// Linearly interpolated inverse of the step function.
    ///
    /// Probabilities below the first step map to the smallest recorded value, probabilities above the last step
    /// map to the largest one.
    pub fn inverse(&self, p: f64) -> f64 {
        if p <= self.cumulative[0] {
            return self.values[0];
        }
        let idx = self.cumulative.partition_point(|c| *c < p);
        if idx >= self.values.len() {
            return self.values[self.values.len() - 1];
        }
        let (p0, p1) = (self.cumulative[idx - 1], self.cumulative[idx]);
        let (x0, x1) = (self.values[idx - 1], self.values[idx]);
        x0 + (p - p0) / (p1 - p0) * (x1 - x0)
    }
}

impl Distribution<f64> for Ecdf {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inverse(rng.gen_range(0.0..1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_collapse() {
        let ecdf = Ecdf::new(&[3., 1., 1., 0., 1.]).unwrap();
        assert_eq!(ecdf.values(), &[0., 1., 3.]);
        assert_eq!(ecdf.cumulative(), &[0.2, 0.8, 1.0]);
    }

    #[test]
    fn test_cdf_steps() {
        let ecdf = Ecdf::new(&[1., 2., 2., 4.]).unwrap();
        assert_eq!(ecdf.cdf(0.5), 0.);
        assert_eq!(ecdf.cdf(1.), 0.25);
        assert_eq!(ecdf.cdf(3.), 0.75);
        assert_eq!(ecdf.cdf(10.), 1.);
    }

    #[test]
    fn test_inverse_interpolates_and_clamps() {
        let ecdf = Ecdf::new(&[0., 10.]).unwrap();
        assert_eq!(ecdf.inverse(0.), 0.);
        assert_eq!(ecdf.inverse(0.5), 0.);
        assert!((ecdf.inverse(0.75) - 5.).abs() < 1e-12);
        assert_eq!(ecdf.inverse(1.), 10.);
        assert_eq!(ecdf.inverse(1.5), 10.);
    }

    #[test]
    fn test_empty_and_non_finite() {
        assert!(Ecdf::new(&[]).is_none());
        assert!(Ecdf::new(&[f64::NAN]).is_none());
        let ecdf = Ecdf::new(&[f64::NAN, 7.]).unwrap();
        assert_eq!(ecdf.values(), &[7.]);
    }
}
