//! Draws from a two-dimensional logistic kernel, prints summary statistics, then appends a
//! few exact half-space constraints driven by simulated observations.

use logis_rou::hrep::{update_half_spaces, BinaryResponse, HRepresentation};
use logis_rou::kernel::LogisticKernel;
use logis_rou::sampler::RatioOfUniforms;
use logis_rou::SamplerConfig;

use ndarray::{arr1, arr2, Axis};
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    const SAMPLE_SIZE: usize = 50_000;
    let seed: u64 = thread_rng().gen();

    let kernel = LogisticKernel::new(arr2(&[[2.0, 0.4], [-0.3, 1.5]]), arr1(&[0.5, -1.0]))?;
    let config = SamplerConfig::default().with_seed(seed);
    let mut sampler = RatioOfUniforms::with_config(kernel, config)?;
    println!(
        "Envelope: umax = {:.4}, mu = {:.4}, vmin = {:.4}, vmax = {:.4}",
        sampler.envelope.umax, sampler.envelope.mu, sampler.envelope.vmin, sampler.envelope.vmax
    );

    let samples = sampler.sample_with_progress(SAMPLE_SIZE)?;
    let mean = samples.mean_axis(Axis(0)).ok_or("empty sample")?;
    let std = samples.std_axis(Axis(0), 1.0);
    println!("Mean: ({:.3}, {:.3})", mean[0], mean[1]);
    println!("Std:  ({:.3}, {:.3})", std[0], std[1]);

    let stats = sampler.stats();
    println!(
        "Accepted {} of {} proposals ({:.2}%)",
        stats.accepted,
        stats.attempts,
        100.0 * stats.acceptance_rate
    );

    // Two regions split the unit square at x = 1/2.
    let box_rows = arr2(&[
        ["0", "0", "1", "0"],
        ["1", "0", "-1", "0"],
        ["0", "0", "0", "1"],
        ["1", "0", "0", "-1"],
    ]);
    let mut h = vec![
        HRepresentation::from_strings(box_rows.view())?,
        HRepresentation::from_strings(box_rows.view())?,
    ];
    let points = vec![
        arr2(&[[0.0, 0.0], [0.5, 0.0], [0.5, 1.0], [0.0, 1.0]]),
        arr2(&[[0.5, 0.0], [1.0, 0.0], [1.0, 1.0], [0.5, 1.0]]),
    ];
    let mut rng = SmallRng::seed_from_u64(seed);
    for _ in 0..3 {
        let xt = arr1(&[rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)]);
        let response = BinaryResponse::from(rng.gen_bool(0.5));
        let update = update_half_spaces(&mut h, &points, response, xt.view(), &mut rng)?;
        println!("y = {response:?}, Xt = {xt:.3}, weights = {:.4}", update.weight);
    }
    for (i, region) in h.iter().enumerate() {
        println!("Region {i} ({} rows):", region.nrows());
        for row in 0..region.nrows() {
            println!("  {}", region.row_strings(row).join(" "));
        }
    }
    Ok(())
}
