mod common;
use common::assert_float_eq;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use dslab_faas_tracegen::error::FitError;
use dslab_faas_tracegen::estimator::{estimate, SummaryStats};
use dslab_faas_tracegen::sampler::sample_lognormal;

#[test]
fn test_inconsistent_summaries_fail() {
    assert!(matches!(
        estimate(&SummaryStats::new(5., 5., 5., 10.)),
        Err(FitError::DegenerateRange { .. })
    ));
    assert!(matches!(
        estimate(&SummaryStats::new(5., 50., 60., 10.)),
        Err(FitError::MeanOutOfRange { .. })
    ));
    assert!(matches!(
        estimate(&SummaryStats::new(0., 50., 20., 10.)),
        Err(FitError::NonPositive { name: "min", .. })
    ));
    assert!(matches!(
        estimate(&SummaryStats::new(5., 50., 20., 1.)),
        Err(FitError::TooFewSamples(_))
    ));
    assert!(estimate(&SummaryStats::new(f64::NAN, 50., 20., 10.)).is_err());
}

#[test]
fn test_offset_makes_idle_summary_admissible() {
    let raw = SummaryStats::new(0., 50., 20., 1000.);
    assert!(estimate(&raw).is_err());
    let fit = estimate(&raw.offset()).unwrap();
    assert!(fit.sigma > 0.);
    assert!(fit.median() > 1. && fit.median() < 51.);
}

#[test]
fn test_recovers_sampled_population() {
    let mut rng = Pcg64::seed_from_u64(7);
    let truth = estimate(&SummaryStats::new(5., 50., 20., 1000.)).unwrap();
    let samples = sample_lognormal(&truth, 200_000, &mut rng).unwrap();
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(0., f64::max);
    let fit = estimate(&SummaryStats::new(min, max, mean, samples.len() as f64)).unwrap();
    assert_float_eq(fit.mu, truth.mu, 0.2);
    assert_float_eq(fit.sigma, truth.sigma, 0.1);
}

#[test]
fn test_sample_mean_converges_to_reported_mean() {
    let mut rng = Pcg64::seed_from_u64(11);
    let n = 500_000;
    // raw Azure-like summaries, heavily skewed towards either end of the range
    for raw in [
        SummaryStats::new(5., 50., 20., 1000.),
        SummaryStats::new(1., 1000., 10., 100.),
        SummaryStats::new(1., 1000., 900., 100.),
        SummaryStats::new(100., 5000., 120., 100000.),
        SummaryStats::new(64., 256., 128., 1000.),
    ] {
        let stats = raw.offset();
        let fit = estimate(&stats).unwrap();
        let samples = sample_lognormal(&fit, n, &mut rng).unwrap();
        let mean = samples.iter().sum::<f64>() / n as f64;
        assert_float_eq(mean / stats.mean, 1., 0.03);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_estimate_is_finite_or_fails(
        min in 0f64..1e4,
        span in 0f64..1e5,
        position in 0f64..=1.,
        count in 0f64..1e6,
    ) {
        let max = min + span;
        let stats = SummaryStats::new(min, max, min + position * span, count.floor());
        match estimate(&stats.offset()) {
            Ok(fit) => {
                prop_assert!(fit.mu.is_finite());
                prop_assert!(fit.sigma.is_finite() && fit.sigma > 0.);
                prop_assert!(!fit.mu_error.is_nan() && !fit.sigma_error.is_nan());
                prop_assert!((fit.mean() / stats.offset().mean - 1.).abs() < 1e-9);
            }
            Err(_) => {}
        }
    }
}
