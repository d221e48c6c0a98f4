use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use dslab_faas_tracegen::ecdf::Ecdf;
use dslab_faas_tracegen::estimator::FittedLognormal;
use dslab_faas_tracegen::sampler::{sample_empirical, sample_lognormal, ColumnGenerator};

fn lognormal(mu: f64, sigma: f64) -> FittedLognormal {
    FittedLognormal {
        mu,
        sigma,
        mu_error: 0.,
        sigma_error: 0.,
    }
}

#[test]
fn test_degenerate_sigma_is_constant() {
    let mut rng = Pcg64::seed_from_u64(3);
    let values = sample_lognormal(&lognormal(2., 0.), 100, &mut rng).unwrap();
    assert!(values.iter().all(|v| (*v - 2f64.exp()).abs() < 1e-9));
}

#[test]
fn test_empirical_draws_stay_in_recorded_range() {
    let mut rng = Pcg64::seed_from_u64(5);
    let observed: Vec<f64> = (0..1440).map(|i| (i % 7) as f64).collect();
    let ecdf = Ecdf::new(&observed).unwrap();
    let values = sample_empirical(&ecdf, 10_000, &mut rng);
    assert_eq!(values.len(), 10_000);
    assert!(values.iter().all(|v| (0. ..=6.).contains(v)));
    // zero carries 1/7 of the mass, so roughly that share of draws hits it exactly
    let zeros = values.iter().filter(|v| **v == 0.).count();
    assert!(zeros > 1000 && zeros < 1900);
}

#[test]
fn test_all_zero_invocations() {
    let mut rng = Pcg64::seed_from_u64(5);
    let ecdf = Ecdf::new(&vec![0.; 1440]).unwrap();
    let generator = ColumnGenerator::empirical(ecdf);
    assert_eq!(generator.generate(1440, &mut rng), vec![0.; 1440]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_lognormal_samples_are_non_negative(mu in -50f64..50., sigma in 0f64..20., seed in any::<u64>()) {
        let mut rng = Pcg64::seed_from_u64(seed);
        let values = sample_lognormal(&lognormal(mu, sigma), 500, &mut rng).unwrap();
        prop_assert_eq!(values.len(), 500);
        prop_assert!(values.iter().all(|v| *v >= 0.));
    }

    #[test]
    fn prop_empirical_samples_are_non_negative(
        observed in prop::collection::vec(-1e3f64..1e3, 1..200),
        seed in any::<u64>(),
    ) {
        let mut rng = Pcg64::seed_from_u64(seed);
        let ecdf = Ecdf::new(&observed).unwrap();
        let values = sample_empirical(&ecdf, 200, &mut rng);
        prop_assert!(values.iter().all(|v| *v >= 0.));
    }
}
