/*!
Logistic variates truncated to one side of a threshold, drawn by inverting the logistic
CDF over the retained tail-probability interval.

# Examples

```rust
use logis_rou::truncated::TruncatedLogistic;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::Distribution;

let mut rng = SmallRng::seed_from_u64(42);
let below = TruncatedLogistic::upper(1.5);
let x = below.sample(&mut rng);
assert!(x <= 1.5);

let above = TruncatedLogistic::lower(-0.5);
assert!(above.sample(&mut rng) >= -0.5);
```
*/

use rand::Rng;
use rand_distr::Distribution;

use crate::kernel::{plogis, qlogis};

/// A standard logistic distribution restricted to one side of a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TruncatedLogistic {
    /// Support `(-∞, at]`.
    Upper { at: f64 },
    /// Support `[at, ∞)`.
    Lower { at: f64 },
}

impl TruncatedLogistic {
    pub fn upper(at: f64) -> Self {
        TruncatedLogistic::Upper { at }
    }

    pub fn lower(at: f64) -> Self {
        TruncatedLogistic::Lower { at }
    }

    pub fn threshold(&self) -> f64 {
        match *self {
            TruncatedLogistic::Upper { at } | TruncatedLogistic::Lower { at } => at,
        }
    }

    /// Probability the untruncated standard logistic assigns to the retained side.
    pub fn mass(&self) -> f64 {
        match *self {
            TruncatedLogistic::Upper { at } => plogis(at),
            TruncatedLogistic::Lower { at } => 1.0 - plogis(at),
        }
    }
}

impl Distribution<f64> for TruncatedLogistic {
    /// Degenerate tails collapse to the threshold itself: an upper truncation whose CDF
    /// value is at most machine epsilon, or a lower truncation whose CDF value is exactly 1.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            TruncatedLogistic::Upper { at } => {
                let b = plogis(at);
                if b <= f64::EPSILON {
                    return at;
                }
                qlogis(rng.gen_range(f64::EPSILON..b))
            }
            TruncatedLogistic::Lower { at } => {
                let a = plogis(at);
                if a == 1.0 {
                    return at;
                }
                qlogis(rng.gen_range(a..1.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn samples_respect_the_threshold() {
        let mut rng = SmallRng::seed_from_u64(42);
        for &at in &[-3.0, -0.2, 0.0, 1.1, 6.0] {
            let upper = TruncatedLogistic::upper(at);
            let lower = TruncatedLogistic::lower(at);
            for _ in 0..2_000 {
                let x = upper.sample(&mut rng);
                assert!(x <= at + 1e-9, "upper({at}) produced {x}");
                let x = lower.sample(&mut rng);
                assert!(x >= at - 1e-9, "lower({at}) produced {x}");
            }
        }
    }

    #[test]
    fn degenerate_tails_return_the_threshold() {
        let mut rng = SmallRng::seed_from_u64(42);
        assert_eq!(TruncatedLogistic::upper(-40.0).sample(&mut rng), -40.0);
        assert_eq!(TruncatedLogistic::lower(40.0).sample(&mut rng), 40.0);
    }

    #[test]
    fn huge_upper_threshold_behaves_like_untruncated() {
        let mut rng = SmallRng::seed_from_u64(42);
        let dist = TruncatedLogistic::upper(1e6);
        let draws: Vec<f64> = (0..20_000).map(|_| dist.sample(&mut rng)).collect();
        assert!(draws.iter().all(|&x| x <= 1e6 && x.is_finite()));
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.1);
    }

    #[test]
    fn conditional_mean_of_positive_half() {
        // E[X | X > 0] = 2 ln 2 for the standard logistic.
        let mut rng = SmallRng::seed_from_u64(7);
        let dist = TruncatedLogistic::lower(0.0);
        let n = 40_000;
        let mean = (0..n).map(|_| dist.sample(&mut rng)).sum::<f64>() / n as f64;
        assert_abs_diff_eq!(mean, 2.0 * 2.0_f64.ln(), epsilon = 0.05);
    }

    #[test]
    fn mass_matches_the_tail() {
        assert_abs_diff_eq!(TruncatedLogistic::upper(0.0).mass(), 0.5);
        assert_abs_diff_eq!(TruncatedLogistic::lower(2.0).mass(), 1.0 - plogis(2.0));
        assert_eq!(TruncatedLogistic::lower(2.0).threshold(), 2.0);
    }
}
