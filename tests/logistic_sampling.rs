//! End-to-end checks of the ratio-of-uniforms sampler on kernels with known marginals.

use logis_rou::bounds::Envelope;
use logis_rou::config::{OptimControl, SamplerConfig};
use logis_rou::kernel::{plogis, LogisticKernel};
use logis_rou::ks_test::one_sample_ks_test;
use logis_rou::mode::find_mode;
use logis_rou::sampler::{sample_kernel, RatioOfUniforms};
use logis_rou::SamplerError;

use approx::assert_abs_diff_eq;
use ndarray::{arr1, arr2, Array1, Array2, Axis};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const SEED: u64 = 42;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// P = 2I, so each coordinate is an independent logistic draw `(Z - b_i) / 2`.
fn independent_kernel() -> LogisticKernel {
    let p = Array2::<f64>::eye(3) * 2.0;
    LogisticKernel::new(p, arr1(&[0.5, 0.0, -0.5])).unwrap()
}

#[test]
fn independent_marginals_match_scaled_logistic() {
    init_logging();
    const SAMPLE_SIZE: usize = 2_000;

    let kernel = independent_kernel();
    let b = kernel.b().to_owned();
    let config = SamplerConfig::default().with_seed(SEED);
    let mut sampler = RatioOfUniforms::with_config(kernel, config).unwrap();
    let samples = sampler.sample(SAMPLE_SIZE).unwrap();
    assert_eq!(samples.dim(), (SAMPLE_SIZE, 3));

    let means = samples.mean_axis(Axis(0)).unwrap();
    for j in 0..3 {
        assert_abs_diff_eq!(means[j], -b[j] / 2.0, epsilon = 0.1);

        let mut column: Vec<f64> = samples.column(j).to_vec();
        let bj = b[j];
        let result = one_sample_ks_test(&mut column, |x| plogis(2.0 * x + bj), 0.001).unwrap();
        assert!(
            !result.is_rejected,
            "column {j}: D = {}, p = {}",
            result.statistic, result.p_value
        );
    }

    let stats = sampler.stats();
    assert_eq!(stats.accepted, SAMPLE_SIZE as u64);
    assert!(stats.attempts >= stats.accepted);
    assert!(stats.acceptance_rate > 0.0 && stats.acceptance_rate <= 1.0);
}

#[test]
fn envelope_is_centred_on_the_mode() {
    init_logging();
    let kernel = independent_kernel();
    let control = OptimControl::default();
    let mode = find_mode(&kernel, &control).unwrap();
    let envelope = Envelope::compute(&kernel, &control).unwrap();

    envelope.validate().unwrap();
    assert_eq!(envelope.dim(), 3);
    assert_abs_diff_eq!(envelope.umax, mode.umax, epsilon = 1e-12);
    for j in 0..3 {
        assert_abs_diff_eq!(envelope.mu[j], mode.mu[j], epsilon = 1e-12);
        assert!(envelope.vmin[j] < 0.0 && envelope.vmax[j] > 0.0);
    }
    // b_0 > 0 pushes the first coordinate below one half, b_2 < 0 above.
    assert!(mode.mu[0] < 0.5);
    assert_abs_diff_eq!(mode.mu[1], 0.5, epsilon = 1e-3);
    assert!(mode.mu[2] > 0.5);
}

#[test]
fn free_function_matches_sampler_with_same_generator() {
    init_logging();
    let p = arr2(&[[1.5, 0.3], [0.0, 1.5]]);
    let b = arr1(&[0.2, -0.1]);

    let mut rng = SmallRng::seed_from_u64(SEED);
    let direct = sample_kernel(200, p.view(), b.view(), &mut rng).unwrap();

    let kernel = LogisticKernel::new(p, b).unwrap();
    let mut sampler = RatioOfUniforms::new(kernel).unwrap().set_seed(SEED);
    let via_sampler = sampler.sample(200).unwrap();

    assert_eq!(direct, via_sampler);
    assert!(direct.iter().all(|x| x.is_finite()));
}

#[test]
fn exhausted_attempts_are_reported() {
    init_logging();
    let kernel = independent_kernel();
    let mut sampler = RatioOfUniforms::new(kernel)
        .unwrap()
        .set_seed(SEED)
        .with_max_attempts(0);
    match sampler.sample(5) {
        Err(SamplerError::AttemptsExhausted {
            attempts,
            accepted,
            requested,
        }) => {
            assert_eq!(attempts, 0);
            assert_eq!(accepted, 0);
            assert_eq!(requested, 5);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn mismatched_kernel_is_rejected() {
    let p = Array2::<f64>::eye(2);
    let b = Array1::<f64>::zeros(3);
    assert!(matches!(
        LogisticKernel::new(p.clone(), b.clone()),
        Err(SamplerError::DimensionMismatch { .. })
    ));
    let mut rng = SmallRng::seed_from_u64(SEED);
    assert!(sample_kernel(1, p.view(), b.view(), &mut rng).is_err());
}
